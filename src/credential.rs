//! # Wallet Credential Records
//!
//! Persistent forms of issued credentials, one per format, carrying the
//! display metadata needed to render them offline. Records serialize to a
//! canonical JSON object with fixed keys; decoding re-validates the
//! embedded credential bytes.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cbor;
use crate::error::Error;
use crate::identifier::{CredentialId, DocType, Vct};
use crate::types::DisplayMetadata;

/// Lifecycle state of a stored credential.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum CredentialState {
    /// Usable for presentation.
    #[default]
    #[serde(rename = "ACTIVE")]
    Active,

    /// Revoked by the issuer.
    #[serde(rename = "REVOKED")]
    Revoked,

    /// Past its expiry time.
    #[serde(rename = "EXPIRED")]
    Expired,
}

/// A stored SD-JWT verifiable credential.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SdJwtCredential {
    /// Unique record identifier, generated at construction.
    #[serde(rename = "Id")]
    pub id: CredentialId,

    /// The credential type.
    pub vct: Vct,

    /// The issuer-signed JWT in compact form.
    #[serde(rename = "encodedIssuerSigned")]
    pub encoded_issuer_signed: String,

    /// The disclosures issued alongside the credential.
    pub disclosures: Vec<String>,

    /// The holder key the credential is bound to.
    #[serde(rename = "keyId")]
    pub key_id: String,

    /// Groups batch-issued copies of the same logical credential.
    #[serde(rename = "credentialSetId")]
    pub credential_set_id: String,

    /// Lifecycle state.
    #[serde(rename = "credentialState")]
    pub state: CredentialState,

    /// Expiry time, when the issuer declared one.
    #[serde(rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Display metadata for the holder's locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displays: Option<Vec<DisplayMetadata>>,
}

/// A stored ISO 18013-5 mobile document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MdocCredential {
    /// Unique record identifier, generated at construction.
    #[serde(rename = "Id")]
    pub id: CredentialId,

    /// The document type.
    #[serde(rename = "docType")]
    pub doc_type: DocType,

    /// The issuer-signed document, CBOR bytes. Serialized base64url.
    #[serde(with = "b64url_bytes")]
    pub mdoc: Vec<u8>,

    /// The holder key the credential is bound to.
    #[serde(rename = "keyId")]
    pub key_id: String,

    /// Groups batch-issued copies of the same logical credential.
    #[serde(rename = "credentialSetId")]
    pub credential_set_id: String,

    /// Lifecycle state.
    #[serde(rename = "credentialState")]
    pub state: CredentialState,

    /// Expiry time, when the issuer declared one.
    #[serde(rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Display metadata for the holder's locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displays: Option<Vec<DisplayMetadata>>,
}

/// A credential as stored by the wallet.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CredentialRecord {
    /// SD-JWT verifiable credential.
    SdJwt(SdJwtCredential),

    /// ISO 18013-5 mobile document.
    Mdoc(MdocCredential),
}

impl CredentialRecord {
    /// The record identifier.
    #[must_use]
    pub fn id(&self) -> &CredentialId {
        match self {
            Self::SdJwt(record) => &record.id,
            Self::Mdoc(record) => &record.id,
        }
    }

    /// The holder key the credential is bound to.
    #[must_use]
    pub fn key_id(&self) -> &str {
        match self {
            Self::SdJwt(record) => &record.key_id,
            Self::Mdoc(record) => &record.key_id,
        }
    }

    /// The credential set the record belongs to.
    #[must_use]
    pub fn credential_set_id(&self) -> &str {
        match self {
            Self::SdJwt(record) => &record.credential_set_id,
            Self::Mdoc(record) => &record.credential_set_id,
        }
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> CredentialState {
        match self {
            Self::SdJwt(record) => record.state,
            Self::Mdoc(record) => record.state,
        }
    }

    /// Serialize to the canonical JSON object. Total for any in-memory
    /// record.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Decode a stored record, re-validating embedded credential bytes.
    ///
    /// # Errors
    /// Returns `DecodeFailed` naming the record id when the JSON does not
    /// match a record shape or the mdoc bytes are malformed.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, Error> {
        let record: Self = serde_json::from_value(json.clone())
            .map_err(|e| Error::decode("record", format!("not a credential record: {e}")))?;

        if let Self::Mdoc(mdoc) = &record {
            cbor::validate_issuer_signed(&mdoc.mdoc).map_err(|e| {
                Error::decode("record", format!("record {} has malformed mdoc: {e}", mdoc.id))
            })?;
        }

        Ok(record)
    }
}

mod b64url_bytes {
    //! Byte fields persisted as unpadded base64url strings.

    use super::{Base64UrlUnpadded, Encoding};

    pub fn serialize<S: serde::Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&Base64UrlUnpadded::encode_string(bytes))
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = <String as serde::Deserialize>::deserialize(d)?;
        Base64UrlUnpadded::decode_vec(&encoded).map_err(serde::de::Error::custom)
    }
}
