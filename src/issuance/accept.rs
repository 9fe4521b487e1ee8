//! # Pre-Authorized Acceptance
//!
//! The short path through issuance: an offer carrying a pre-authorized code
//! goes straight to the token endpoint, skipping PAR and PKCE, and on to
//! the credential request.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::credential::issue_credential;
use super::offer::{oauth_server_issuer, oauth_server_url, pre_authorized_code};
use crate::credential::CredentialRecord;
use crate::error::{Error, Result};
use crate::provider::{CredentialStorer, HolderProvider, IssuerClient};
use crate::types::{CredentialOfferMetadata, TokenGrantType, TokenRequest};

/// Request to accept a pre-authorized offer.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AcceptRequest {
    /// The resolved offer to accept.
    pub offer: CredentialOfferMetadata,

    /// The transaction code entered by the user, when the offer required
    /// one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_code: Option<String>,
}

/// Accept a pre-authorized offer: exchange the pre-authorized code for an
/// access token and request the credential.
///
/// Only the first offered configuration is issued on this path.
///
/// # Errors
/// Returns `TokenExchangeFailed` when the token endpoint rejects the code
/// or transaction code, `DeferredIssuanceNotSupported` when the issuer
/// defers, or a decode error from the credential response.
#[instrument(level = "debug", skip(provider, request))]
pub async fn accept_offer(
    provider: &impl HolderProvider, request: &AcceptRequest,
) -> Result<CredentialRecord> {
    tracing::debug!("Endpoint::accept_offer");

    let offer_meta = &request.offer;
    let code = pre_authorized_code(&offer_meta.offer)?;

    let metadata_url = oauth_server_url(oauth_server_issuer(offer_meta))?;
    let oauth_server = IssuerClient::oauth_server_metadata(provider, &metadata_url).await?;

    let token_request = TokenRequest {
        client_id: None,
        grant: TokenGrantType::PreAuthorizedCode {
            pre_authorized_code: code,
            tx_code: request.tx_code.clone(),
        },
    };
    let token = IssuerClient::token(provider, &oauth_server.token_endpoint, &token_request).await?;

    let Some(cfg_id) = offer_meta.offer.credential_configuration_ids.first() else {
        let e = Error::InvalidState("offer carries no configuration ids".to_string());
        tracing::error!(target: "Endpoint::accept_offer", ?e);
        return Err(e);
    };
    let Some(configuration) = offer_meta.issuer.configuration(cfg_id) else {
        let e = Error::InvalidState(format!("configuration {cfg_id} not in issuer metadata"));
        tracing::error!(target: "Endpoint::accept_offer", ?e);
        return Err(e);
    };

    let record =
        issue_credential(provider, configuration, &offer_meta.issuer, &token, None).await?;
    CredentialStorer::save(provider, &record).await?;

    Ok(record)
}
