//! # CBOR
//!
//! CBOR decoding support for mdoc credentials: a validated element model,
//! tag 24 wrapping, and reader/writer helpers.

use std::io::Cursor;

use ciborium::Value;
use coset::{CborSerializable, CoseSign1};
use serde::de::{self, DeserializeOwned};
use serde::{ser, Deserialize, Serialize};

use crate::error::Error;

/// Serialize a value to CBOR bytes.
///
/// # Errors
/// Returns an error if the value cannot be serialized.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>, Error>
where
    T: Serialize,
{
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| Error::decode("cbor", format!("serialization failed: {e}")))?;
    Ok(buf)
}

/// Deserialize a value from CBOR bytes.
///
/// # Errors
/// Returns an error if the bytes are not valid CBOR for the target type.
pub fn from_slice<T>(slice: &[u8]) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    ciborium::from_reader(Cursor::new(&slice))
        .map_err(|e| Error::decode("cbor", format!("deserialization failed: {e}")))
}

/// A decoded CBOR element.
///
/// Construction traverses the entire value: arrays and maps are only built
/// when every child decodes, so a partially-valid structure is never
/// observable.
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    /// Byte string.
    Bytes(Vec<u8>),

    /// Text string.
    Text(String),

    /// Unsigned integer.
    Uint(u64),

    /// Negative integer.
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Boolean.
    Bool(bool),

    /// Null.
    Null,

    /// Array of elements.
    Array(Vec<Element>),

    /// Map of element pairs.
    Map(Vec<(Element, Element)>),

    /// Tagged element.
    Tagged(u64, Box<Element>),
}

impl Element {
    /// Decode a CBOR value into an element tree, failing on the first
    /// unsupported or out-of-range child.
    ///
    /// # Errors
    /// Returns an error naming the offending child when the value cannot be
    /// represented.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Bytes(bytes) => Ok(Self::Bytes(bytes.clone())),
            Value::Text(text) => Ok(Self::Text(text.clone())),
            Value::Integer(int) => {
                let n = i128::from(*int);
                if n >= 0 {
                    let n = u64::try_from(n)
                        .map_err(|_| Error::decode("cbor", format!("integer out of range: {n}")))?;
                    Ok(Self::Uint(n))
                } else {
                    let n = i64::try_from(n)
                        .map_err(|_| Error::decode("cbor", format!("integer out of range: {n}")))?;
                    Ok(Self::Int(n))
                }
            }
            Value::Float(f) => Ok(Self::Float(*f)),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Null => Ok(Self::Null),
            Value::Array(items) => {
                let items = items.iter().map(Self::from_value).collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Array(items))
            }
            Value::Map(entries) => {
                let entries = entries
                    .iter()
                    .map(|(k, v)| Ok((Self::from_value(k)?, Self::from_value(v)?)))
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(Self::Map(entries))
            }
            Value::Tag(tag, inner) => {
                Ok(Self::Tagged(*tag, Box::new(Self::from_value(inner)?)))
            }
            other => Err(Error::decode("cbor", format!("unsupported value: {other:?}"))),
        }
    }
}

/// Validate that `bytes` decode to an ISO 18013-5 `IssuerSigned` structure:
/// a map carrying a `nameSpaces` map and an `issuerAuth` `COSE_Sign1`.
///
/// # Errors
/// Returns an error describing the first structural defect.
pub fn validate_issuer_signed(bytes: &[u8]) -> Result<(), Error> {
    let value: Value = from_slice(bytes)?;
    let Value::Map(entries) = &value else {
        return Err(Error::decode("mdoc", "IssuerSigned is not a map"));
    };

    let field = |name: &str| {
        entries
            .iter()
            .find(|(k, _)| k.as_text() == Some(name))
            .map(|(_, v)| v)
            .ok_or_else(|| Error::decode("mdoc", format!("IssuerSigned missing {name}")))
    };

    let name_spaces = field("nameSpaces")?;
    let Value::Map(spaces) = name_spaces else {
        return Err(Error::decode("mdoc", "nameSpaces is not a map"));
    };
    for (name_space, items) in spaces {
        // every namespace holds an array of tag-24 wrapped items
        Element::from_value(items)?;
        let Value::Array(items) = items else {
            return Err(Error::decode("mdoc", "namespace entries are not an array"));
        };
        for item in items {
            let Value::Tag(24, _) = item else {
                let ns = name_space.as_text().unwrap_or_default();
                return Err(Error::decode("mdoc", format!("untagged item in namespace {ns}")));
            };
        }
    }

    let issuer_auth = field("issuerAuth")?;
    let Value::Array(_) = issuer_auth else {
        return Err(Error::decode("mdoc", "issuerAuth is not a COSE_Sign1 array"));
    };
    let auth_bytes = to_vec(issuer_auth)?;
    CoseSign1::from_slice(&auth_bytes)
        .map_err(|e| Error::decode("mdoc", format!("issuerAuth is not COSE_Sign1: {e}")))?;

    Ok(())
}

/// Wrap types that require tagging with tag 24.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag24<T> {
    /// The wrapped value.
    pub inner: T,
}

impl<T: Serialize> Tag24<T> {
    /// Wrap the provided value.
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: DeserializeOwned> TryFrom<Value> for Tag24<T> {
    type Error = Error;

    fn try_from(v: Value) -> Result<Self, Error> {
        match v {
            Value::Tag(24, inner_value) => match inner_value.as_ref() {
                Value::Bytes(inner_bytes) => {
                    let inner: T = from_slice(inner_bytes)?;
                    Ok(Self { inner })
                }
                _ => Err(Error::decode("cbor", "tag 24 does not wrap a byte string")),
            },
            _ => Err(Error::decode("cbor", "value is not tag 24")),
        }
    }
}

impl<T: Serialize> Serialize for Tag24<T> {
    fn serialize<S: ser::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let bytes = to_vec(&self.inner).map_err(ser::Error::custom)?;
        Value::Tag(24, Box::new(Value::Bytes(bytes))).serialize(s)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Tag24<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        value.try_into().map_err(de::Error::custom)
    }
}
