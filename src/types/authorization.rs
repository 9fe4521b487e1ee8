//! # Pushed Authorization Request

use serde::{Deserialize, Serialize};

use crate::types::metadata::FormatProfile;

/// Details about one credential the wallet requests authorization for, sent
/// in the pushed authorization request.
///
/// The format-specific field (`vct` or `doctype`) is populated from the
/// credential configuration; the other is serialized as an explicit null.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthorizationDetail {
    /// Always `openid_credential`.
    #[serde(rename = "type")]
    pub type_: String,

    /// Format identifier, passed through verbatim when a configuration
    /// declares one alongside its variant.
    pub format: Option<String>,

    /// SD-JWT credential type, when the configuration is SD-JWT.
    pub vct: Option<String>,

    /// mdoc document type, when the configuration is mdoc.
    pub doctype: Option<String>,

    /// The configuration this detail refers to.
    pub credential_configuration_id: String,

    /// Authorization servers able to authorize this credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_servers: Option<Vec<String>>,
}

impl AuthorizationDetail {
    /// Build a detail entry for an offered configuration.
    #[must_use]
    pub fn for_configuration(
        configuration_id: &str, profile: &FormatProfile,
        authorization_servers: Option<&Vec<String>>,
    ) -> Self {
        let (vct, doctype) = match profile {
            FormatProfile::SdJwt { vct } => (Some(vct.clone()), None),
            FormatProfile::Mdoc { doctype } => (None, Some(doctype.clone())),
        };
        Self {
            type_: "openid_credential".to_string(),
            format: None,
            vct,
            doctype,
            credential_configuration_id: configuration_id.to_string(),
            authorization_servers: authorization_servers.cloned(),
        }
    }
}

/// The pushed authorization request, sent form-url-encoded to the PAR
/// endpoint before redirecting the browser.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PushedAuthorizationRequest {
    /// The wallet's client identifier.
    pub client_id: String,

    /// Redirect URI for the authorization response.
    pub redirect_uri: String,

    /// PKCE challenge, `base64url(SHA-256(verifier))`.
    pub code_challenge: String,

    /// PKCE challenge method, always `S256`.
    pub code_challenge_method: String,

    /// Opaque value echoed on redirect; carries the session id.
    pub state: String,

    /// Space-joined scopes for the offered configurations, when any
    /// configuration advertises one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// JSON-encoded array of [`AuthorizationDetail`], ready for form
    /// encoding.
    pub authorization_details: String,

    /// Issuer state from the offer's authorization code grant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_state: Option<String>,
}

/// Response from the PAR endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PushedAuthorizationResponse {
    /// Reference to the pushed request, to be passed to the authorization
    /// endpoint.
    pub request_uri: String,

    /// Lifetime of the reference in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}
