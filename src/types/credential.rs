//! # Credential Request & Response

use serde::{Deserialize, Serialize};

/// A request to the credential endpoint. The body shape follows the
/// configuration's format profile.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialRequest {
    /// Format-specific request parameters.
    #[serde(flatten)]
    pub credential_type: CredentialRequestType,

    /// Proof of possession of the key the credential will be bound to.
    pub proof: Proof,
}

/// Format-specific credential request parameters.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "format")]
pub enum CredentialRequestType {
    /// Request an SD-JWT credential.
    #[serde(rename = "vc+sd-jwt")]
    SdJwt {
        /// The credential type to issue.
        vct: String,
    },

    /// Request an mdoc credential.
    #[serde(rename = "mso_mdoc")]
    Mdoc {
        /// The document type to issue.
        doctype: String,
    },
}

/// Proof of possession of key material, as sent with a credential request.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Proof {
    /// Proof type, always `jwt`.
    pub proof_type: String,

    /// The proof JWT, signed with the holder's fresh key.
    pub jwt: String,
}

/// Claims carried in the proof-of-possession JWT.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProofClaims {
    /// The wallet's client id, when one is registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// The credential issuer the proof is addressed to.
    pub aud: String,

    /// Issue time, seconds since the Unix epoch.
    pub iat: i64,

    /// The `c_nonce` from the token response, binding the proof to the
    /// access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Response from the credential endpoint.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialResponse {
    /// The issued credential, or a transaction id for deferred issuance.
    #[serde(flatten)]
    pub response: CredentialResponseType,

    /// A fresh nonce for subsequent proofs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce: Option<String>,

    /// Lifetime of the fresh nonce in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce_expires_in: Option<i64>,
}

/// The payload of a credential response.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CredentialResponseType {
    /// The issued credential: an SD-JWT compact serialization or a
    /// base64url-encoded mdoc, per the requested format.
    Credential {
        /// The encoded credential.
        credential: String,
    },

    /// Issuance was deferred; the issuer returned a transaction id to poll
    /// with.
    TransactionId {
        /// The deferral token.
        transaction_id: String,
    },
}
