//! # Credential Offer
//!
//! An offer is received from an issuer either by value (a JSON object in the
//! `credential_offer` query parameter) or by reference (a URL in
//! `credential_offer_uri`). Parsing validates each field and reports every
//! defect found rather than the first.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

/// A Credential Offer received from an issuer, inviting the wallet to obtain
/// one or more credentials.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialOffer {
    /// The URL of the Credential Issuer the wallet is requested to obtain
    /// credentials from.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub credential_issuer: String,

    /// Names identifying entries in the issuer's
    /// `credential_configurations_supported` metadata.
    pub credential_configuration_ids: Vec<String>,

    /// Grant types the issuer is prepared to process for this offer. When
    /// multiple grants are present it is at the wallet's discretion which
    /// one to use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grants: Option<Grants>,
}

impl CredentialOffer {
    /// Convenience method for extracting a pre-authorized code grant from an
    /// offer if it exists.
    #[must_use]
    pub fn pre_authorized_code(&self) -> Option<PreAuthorizedCodeGrant> {
        self.grants.as_ref().and_then(|grants| grants.pre_authorized_code.clone())
    }

    /// Convenience method for extracting an authorization code grant from an
    /// offer if it exists.
    #[must_use]
    pub fn authorization_code(&self) -> Option<AuthorizationCodeGrant> {
        self.grants.as_ref().and_then(|grants| grants.authorization_code.clone())
    }

    /// Check the offer is complete enough to act on.
    ///
    /// # Errors
    /// Returns `OfferMalformed` listing one reason per defective field.
    pub fn validate(&self) -> Result<(), Error> {
        let mut reasons = vec![];

        if self.credential_issuer.is_empty() {
            reasons.push("credential_issuer is missing".to_string());
        } else if Url::parse(&self.credential_issuer).is_err() {
            reasons.push(format!("credential_issuer is not a URL: {}", self.credential_issuer));
        }
        if self.credential_configuration_ids.is_empty() {
            reasons.push("credential_configuration_ids is empty".to_string());
        }
        if self.credential_configuration_ids.iter().any(String::is_empty) {
            reasons.push("credential_configuration_ids contains an empty id".to_string());
        }

        // at least one grant must be usable
        let grants_ok = self.grants.as_ref().is_some_and(|grants| {
            grants.authorization_code.is_some() || grants.pre_authorized_code.is_some()
        });
        if !grants_ok {
            reasons.push("no supported grant in offer".to_string());
        }

        if reasons.is_empty() { Ok(()) } else { Err(Error::OfferMalformed(reasons)) }
    }
}

/// An offer as carried by a credential-offer URI: inline or by reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OfferPayload {
    /// The offer object was inlined in the URI.
    Object(CredentialOffer),

    /// The URI referenced an offer to be fetched from this URL.
    Uri(String),
}

impl OfferPayload {
    /// Extract a credential offer from an offer URI. The URI scheme is not
    /// significant; only the query is inspected.
    ///
    /// # Errors
    /// Returns `OfferMalformed` when neither `credential_offer` nor
    /// `credential_offer_uri` is present, or when the inline offer is not
    /// valid JSON.
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        let url = Url::parse(uri)
            .map_err(|e| Error::OfferMalformed(vec![format!("offer URI is invalid: {e}")]))?;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "credential_offer" => {
                    let offer: CredentialOffer = serde_json::from_str(&value).map_err(|e| {
                        Error::OfferMalformed(vec![format!("credential_offer is not valid JSON: {e}")])
                    })?;
                    return Ok(Self::Object(offer));
                }
                "credential_offer_uri" => return Ok(Self::Uri(value.into_owned())),
                _ => {}
            }
        }

        Err(Error::OfferMalformed(vec![
            "URI carries neither credential_offer nor credential_offer_uri".to_string(),
        ]))
    }
}

/// Grant types the issuer will accept for the offered credentials.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Grants {
    /// Authorization code grant parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<AuthorizationCodeGrant>,

    /// Pre-authorized code grant parameters.
    #[serde(rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_authorized_code: Option<PreAuthorizedCodeGrant>,
}

/// Parameters for the authorization code grant.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthorizationCodeGrant {
    /// Issuer state to be passed back in the authorization request, binding
    /// the subsequent flow to this offer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_state: Option<String>,

    /// The authorization server to use when the issuer metadata lists more
    /// than one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_server: Option<String>,
}

/// Parameters for the pre-authorized code grant.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PreAuthorizedCodeGrant {
    /// The code representing the issuer's authorization for the wallet to
    /// obtain the offered credentials.
    #[serde(rename = "pre-authorized_code")]
    pub pre_authorized_code: String,

    /// Describes the transaction code the user must supply with the token
    /// request. Absent when no code is required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_code: Option<TxCode>,

    /// The authorization server to use when the issuer metadata lists more
    /// than one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_server: Option<String>,
}

/// Describes the transaction code to be prompted from the user.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TxCode {
    /// Input character set: "numeric" (default) or "text".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_mode: Option<String>,

    /// Expected length, enabling the wallet to render an input screen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i32>,

    /// Guidance for the user on how to obtain the code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
