//! # Issuer & Authorization Server Metadata

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::offer::CredentialOffer;

/// The Credential Issuer's configuration, fetched from
/// `.well-known/openid-credential-issuer`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct IssuerMetadata {
    /// The Credential Issuer's identifier.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub credential_issuer: String,

    /// Authorization server identifiers. If omitted, the Credential Issuer
    /// is acting as its own authorization server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_servers: Option<Vec<String>>,

    /// URL of the Credential Issuer's Credential Endpoint.
    pub credential_endpoint: String,

    /// Credentials supported by the issuer, keyed by configuration id. The
    /// Credential Offer references entries in this map.
    pub credential_configurations_supported: HashMap<String, CredentialConfiguration>,
}

impl IssuerMetadata {
    /// Look up an offered configuration by id.
    #[must_use]
    pub fn configuration(&self, configuration_id: &str) -> Option<&CredentialConfiguration> {
        self.credential_configurations_supported.get(configuration_id)
    }
}

/// Metadata for one supported credential configuration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialConfiguration {
    /// The credential format profile. Determines how credential requests
    /// are shaped and how responses are decoded.
    #[serde(flatten)]
    pub profile: FormatProfile,

    /// The `scope` value the issuer supports for this credential, for use in
    /// the authorization request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Display properties for supported locales.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<Vec<DisplayMetadata>>,
}

impl CredentialConfiguration {
    /// Display entries matching the requested locale, falling back to the
    /// `en-US` default and then to locale-less entries.
    #[must_use]
    pub fn display_for_locale(&self, locale: Option<&str>) -> Vec<DisplayMetadata> {
        let Some(display) = &self.display else {
            return vec![];
        };

        let matching = |tag: &str| {
            display
                .iter()
                .filter(|d| d.locale.as_deref() == Some(tag))
                .cloned()
                .collect::<Vec<_>>()
        };

        if let Some(locale) = locale {
            let matched = matching(locale);
            if !matched.is_empty() {
                return matched;
            }
        }
        let fallback = matching("en-US");
        if !fallback.is_empty() {
            return fallback;
        }
        display.iter().filter(|d| d.locale.is_none()).cloned().collect()
    }
}

/// Credential format profile: the variant is authoritative for request
/// shaping and response decoding.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "format")]
pub enum FormatProfile {
    /// Selective-disclosure JWT verifiable credential.
    #[serde(rename = "vc+sd-jwt")]
    SdJwt {
        /// The verifiable credential type this configuration issues.
        vct: String,
    },

    /// ISO 18013-5 mobile document.
    #[serde(rename = "mso_mdoc")]
    Mdoc {
        /// The document type this configuration issues.
        doctype: String,
    },
}

impl Default for FormatProfile {
    fn default() -> Self {
        Self::SdJwt { vct: String::new() }
    }
}

/// Language-specific display properties for a credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DisplayMetadata {
    /// Display name for the credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// BCP-47 language tag this entry applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Logo to display alongside the credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<LogoMetadata>,

    /// Background color, a CSS color value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    /// Text color, a CSS color value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

/// Logo display information.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LogoMetadata {
    /// Where the logo can be retrieved from.
    pub url: String,

    /// Alternative text for accessibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

/// OAuth authorization server metadata. Endpoints used by the issuance flow
/// are typed; everything else passes through opaquely.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OAuthServerMetadata {
    /// The authorization server's issuer identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// URL of the authorization endpoint the browser is sent to.
    pub authorization_endpoint: String,

    /// URL of the token endpoint.
    pub token_endpoint: String,

    /// URL of the pushed authorization request endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pushed_authorization_request_endpoint: Option<String>,

    /// PKCE challenge methods the server supports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_methods_supported: Option<Vec<String>>,

    /// Remaining metadata, passed through untouched.
    #[serde(flatten)]
    pub additional: HashMap<String, Value>,
}

/// A resolved offer: the offer itself together with the issuer metadata it
/// references.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialOfferMetadata {
    /// The validated credential offer.
    pub offer: CredentialOffer,

    /// The issuer's metadata, display entries filtered to the requested
    /// locale.
    pub issuer: IssuerMetadata,
}
