//! # Authorization
//!
//! Starts the authorization code flow for an offer: mints PKCE material,
//! pushes the authorization request to the authorization server and hands
//! back the URL to send the browser to. The in-flight state is persisted so
//! the flow can resume when the redirect comes back.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::offer::{oauth_server_issuer, oauth_server_url};
use super::{session_expiry, AuthFlowSession, ClientOptions};
use crate::core::generate;
use crate::core::pkce::PkcePair;
use crate::error::{Error, Result};
use crate::provider::{HolderProvider, IssuerClient, StateStore};
use crate::types::{
    AuthorizationDetail, CredentialOfferMetadata, PushedAuthorizationRequest,
};

/// Request to start an authorization code flow.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthorizeRequest {
    /// The resolved offer to request authorization for.
    pub offer: CredentialOfferMetadata,

    /// The wallet's client registration.
    pub client: ClientOptions,
}

/// A started authorization flow.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct InitiatedFlow {
    /// The session to resume with once the redirect returns.
    pub session_id: String,

    /// Where to send the browser.
    pub authorization_url: String,
}

/// Initiate the authorization code flow: generate PKCE material, push the
/// authorization request and persist the session.
///
/// # Errors
/// Returns `PushedAuthorizationFailed` when the PAR endpoint rejects the
/// request (no session is stored), or a metadata error from resolution.
#[instrument(level = "debug", skip(provider, request))]
pub async fn initiate_auth_flow(
    provider: &impl HolderProvider, request: &AuthorizeRequest,
) -> Result<InitiatedFlow> {
    tracing::debug!("Endpoint::initiate_auth_flow");

    let offer_meta = &request.offer;
    let session_id = generate::session_id();
    let pkce = PkcePair::generate();

    // scopes and authorization details for the offered configurations
    let mut scopes = vec![];
    let mut details = vec![];
    for cfg_id in &offer_meta.offer.credential_configuration_ids {
        let Some(configuration) = offer_meta.issuer.configuration(cfg_id) else {
            let e = Error::InvalidState(format!("configuration {cfg_id} not in issuer metadata"));
            tracing::error!(target: "Endpoint::initiate_auth_flow", ?e);
            return Err(e);
        };
        if let Some(scope) = &configuration.scope {
            if !scopes.contains(scope) {
                scopes.push(scope.clone());
            }
        }
        details.push(AuthorizationDetail::for_configuration(
            cfg_id,
            &configuration.profile,
            offer_meta.issuer.authorization_servers.as_ref(),
        ));
    }
    let scope = if scopes.is_empty() { None } else { Some(scopes.join(" ")) };
    let authorization_details = serde_json::to_string(&details)
        .map_err(|e| Error::InvalidState(format!("authorization details: {e}")))?;

    let metadata_url = oauth_server_url(oauth_server_issuer(offer_meta))?;
    let oauth_server = IssuerClient::oauth_server_metadata(provider, &metadata_url).await?;
    let Some(par_endpoint) = oauth_server.pushed_authorization_request_endpoint.clone() else {
        let e = Error::InvalidState(
            "authorization server does not support pushed authorization requests".to_string(),
        );
        tracing::error!(target: "Endpoint::initiate_auth_flow", ?e);
        return Err(e);
    };

    let issuer_state =
        offer_meta.offer.authorization_code().and_then(|grant| grant.issuer_state);
    let redirect_uri = format!("{}?session={}", request.client.redirect_uri, session_id);

    let par_request = PushedAuthorizationRequest {
        client_id: request.client.client_id.clone(),
        redirect_uri,
        code_challenge: pkce.challenge.clone(),
        code_challenge_method: "S256".to_string(),
        state: session_id.clone(),
        scope,
        authorization_details,
        issuer_state,
    };
    let par_response = IssuerClient::pushed_authorization(provider, &par_endpoint, &par_request).await?;

    // the PAR succeeded: persist the session for the redirect to resume
    let session = AuthFlowSession {
        session_id: session_id.clone(),
        client: request.client.clone(),
        issuer: offer_meta.issuer.clone(),
        oauth_server: oauth_server.clone(),
        configuration_ids: offer_meta.offer.credential_configuration_ids.clone(),
        pkce,
        created_at: Utc::now(),
    };
    StateStore::put(provider, &session_id, &session, session_expiry(session.created_at)).await?;

    let authorization_url = format!(
        "{}?client_id={}&request_uri={}",
        oauth_server.authorization_endpoint,
        request.client.client_id,
        urlencoding::encode(&par_response.request_uri),
    );

    Ok(InitiatedFlow { session_id, authorization_url })
}
