//! # Token Request & Response

use serde::{Deserialize, Serialize};

/// A request to the token endpoint. The `grant_type` parameter is derived
/// from the grant variant.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenRequest {
    /// The client identifier of the wallet. May be absent in the
    /// pre-authorized flow when the server supports anonymous access.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// The grant being exercised.
    #[serde(flatten)]
    pub grant: TokenGrantType,
}

/// Grant parameters for the token request.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "grant_type")]
pub enum TokenGrantType {
    /// Pre-authorized code grant.
    #[serde(rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code")]
    PreAuthorizedCode {
        /// The code from the offer's pre-authorized grant.
        #[serde(rename = "pre-authorized_code")]
        pre_authorized_code: String,

        /// The transaction code entered by the user, when the offer
        /// required one.
        #[serde(skip_serializing_if = "Option::is_none")]
        tx_code: Option<String>,
    },

    /// Authorization code grant.
    #[serde(rename = "authorization_code")]
    AuthorizationCode {
        /// The authorization code returned on redirect.
        code: String,

        /// The PKCE verifier matching the challenge sent with the
        /// authorization request.
        code_verifier: String,

        /// The redirect URI used in the authorization request.
        redirect_uri: String,
    },
}

/// The access token response, including the proof-of-possession nonce
/// consumed when requesting credentials.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// The access token for the credential endpoint.
    pub access_token: String,

    /// Token type, normally `Bearer`.
    pub token_type: String,

    /// Lifetime of the access token in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Nonce to include in the proof-of-possession JWT.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce: Option<String>,

    /// Lifetime of the `c_nonce` in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce_expires_in: Option<i64>,
}
