//! # Offer Resolution
//!
//! Accepts a credential-offer URI, fetches the issuer's metadata and merges
//! the two into a descriptor the rest of the flow works from. Display
//! metadata is filtered to the holder's locale.

use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::error::{Error, Result};
use crate::identifier::Locale;
use crate::provider::IssuerClient;
use crate::types::{CredentialOffer, CredentialOfferMetadata, OfferPayload};

/// Request to resolve a credential offer URI.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OfferRequest {
    /// The offer URI as received, e.g. an `openid-credential-offer://`
    /// deep link.
    pub uri: String,

    /// Locale to filter display metadata to. Defaults to `en-US`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<Locale>,
}

/// Resolve a credential offer: parse the URI, fetch the offer when carried
/// by reference, validate it, and merge in the issuer's metadata.
///
/// # Errors
/// Returns `OfferMalformed` listing each defective field, or a fetch error
/// from the provider.
#[instrument(level = "debug", skip(provider))]
pub async fn resolve_offer(
    provider: &impl IssuerClient, request: &OfferRequest,
) -> Result<CredentialOfferMetadata> {
    tracing::debug!("Endpoint::resolve_offer");

    let offer = match OfferPayload::from_uri(&request.uri)? {
        OfferPayload::Object(offer) => offer,
        OfferPayload::Uri(url) => provider.fetch_offer(&url).await?,
    };
    offer.validate()?;

    let mut issuer = provider.issuer_metadata(&offer.credential_issuer).await?;

    // every offered configuration must be in the issuer's metadata
    let missing = offer
        .credential_configuration_ids
        .iter()
        .filter(|id| issuer.configuration(id).is_none())
        .map(|id| format!("credential_configuration_ids entry {id} is not supported by issuer"))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        let e = Error::OfferMalformed(missing);
        tracing::error!(target: "Endpoint::resolve_offer", ?e);
        return Err(e);
    }

    // narrow display metadata to the holder's locale
    let locale = request.locale.clone().unwrap_or_else(Locale::default_locale);
    for configuration in issuer.credential_configurations_supported.values_mut() {
        if configuration.display.is_some() {
            let filtered = configuration.display_for_locale(Some(locale.as_str()));
            configuration.display = Some(filtered);
        }
    }

    Ok(CredentialOfferMetadata { offer, issuer })
}

/// Derive the authorization server metadata URL from an issuer URL:
/// `.well-known/oauth-authorization-server` at the authority root, with the
/// issuer's path appended (trailing `/` stripped) when one is present.
///
/// # Errors
/// Returns `OfferMalformed` when the issuer URL does not parse.
pub fn oauth_server_url(issuer: &str) -> Result<String> {
    let url = Url::parse(issuer)
        .map_err(|e| Error::OfferMalformed(vec![format!("issuer URL is invalid: {e}")]))?;
    let origin = url.origin().ascii_serialization();

    let path = url.path();
    if path.is_empty() || path == "/" {
        Ok(format!("{origin}/.well-known/oauth-authorization-server"))
    } else {
        Ok(format!(
            "{origin}/.well-known/oauth-authorization-server{}",
            path.trim_end_matches('/')
        ))
    }
}

/// The authorization server issuer to use for an offer: the first entry in
/// the issuer's `authorization_servers` list, or the credential issuer
/// itself when the list is absent.
pub(super) fn oauth_server_issuer(offer_meta: &CredentialOfferMetadata) -> &str {
    offer_meta
        .issuer
        .authorization_servers
        .as_ref()
        .and_then(|servers| servers.first())
        .map_or(offer_meta.offer.credential_issuer.as_str(), String::as_str)
}

pub(super) fn pre_authorized_code(offer: &CredentialOffer) -> Result<String> {
    let Some(grant) = offer.pre_authorized_code() else {
        return Err(Error::InvalidState("offer has no pre-authorized code grant".to_string()));
    };
    Ok(grant.pre_authorized_code)
}
