//! # Authorization Request Object
//!
//! The OpenID4VP request object as received from a verifier: a compact JWS
//! whose header carries the signing certificate chain (`x5c`) and whose
//! payload describes the requested presentation.

use serde::{de, ser, Deserialize, Serialize};
use serde_json::Value;

/// The JWS protected header of a request object.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct JwsHeader {
    /// Signature algorithm, per the IANA JOSE registry.
    pub alg: String,

    /// Media type of the JWS, `oauth-authz-req+jwt` for request objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// The certificate chain corresponding to the signing key, base64
    /// (not base64url) DER, ordered leaf first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,

    /// Key id, for schemes that resolve keys out of band.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// The client identifier scheme, determining how the verifier's `client_id`
/// is authenticated.
///
/// Serialized as the scheme's registered string value. Schemes this agent
/// does not authenticate are preserved verbatim in `Other`, so the
/// (de)serialization is hand-written rather than derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientIdScheme {
    /// `client_id` is a DNS name bound via the leaf certificate's SAN
    /// dNSName entries.
    X509SanDns,

    /// `client_id` is a URI bound via the leaf certificate's SAN URI
    /// entries.
    X509SanUri,

    /// A scheme this agent does not authenticate.
    Other(String),
}

impl ClientIdScheme {
    /// The scheme's wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::X509SanDns => "x509_san_dns",
            Self::X509SanUri => "x509_san_uri",
            Self::Other(scheme) => scheme,
        }
    }
}

impl Serialize for ClientIdScheme {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ClientIdScheme {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let scheme = String::deserialize(deserializer)?;
        Ok(match scheme.as_str() {
            "x509_san_dns" => Self::X509SanDns,
            "x509_san_uri" => Self::X509SanUri,
            _ => Self::Other(scheme),
        })
    }
}

/// The request object payload.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RequestObject {
    /// The verifier's client identifier.
    pub client_id: String,

    /// How `client_id` is to be authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id_scheme: Option<ClientIdScheme>,

    /// The response type, normally `vp_token`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,

    /// How the authorization response is to be delivered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mode: Option<String>,

    /// Where the authorization response is to be delivered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_uri: Option<String>,

    /// Verifier nonce, bound into the presentation.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub nonce: String,

    /// Opaque verifier state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// DIF Presentation Exchange definition of the requested credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_definition: Option<Value>,

    /// DCQL query for the requested credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dcql_query: Option<Value>,
}
