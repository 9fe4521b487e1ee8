//! # Token Exchange
//!
//! Resumes an authorization code flow after the browser redirect: exchanges
//! the code for an access token, requests the authorized credentials and
//! commits the resulting records. The session is released only once every
//! record is stored.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::credential::issue_credential;
use super::AuthFlowSession;
use crate::credential::CredentialRecord;
use crate::error::{Error, Result};
use crate::provider::{CredentialStorer, HolderProvider, IssuerClient, StateStore};
use crate::types::{TokenGrantType, TokenRequest};

/// The callback parameters resuming an authorization code flow.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct IssuanceSession {
    /// The session id from the redirect's `session` query parameter.
    pub session_id: String,

    /// The authorization code from the redirect's `code` query parameter.
    pub code: String,
}

/// Exchange the authorization code for an access token and request the
/// credentials covered by the session.
///
/// # Errors
/// Returns `SessionNotFound` when no session exists for the id,
/// `TokenExchangeFailed` when the token endpoint rejects the exchange (the
/// session is preserved for retry), or a credential error from dispatch
/// (the session is released; the flow is terminal).
#[instrument(level = "debug", skip(provider, session))]
pub async fn request_credential(
    provider: &impl HolderProvider, session: &IssuanceSession,
) -> Result<Vec<CredentialRecord>> {
    tracing::debug!("Endpoint::request_credential");

    let Some(flow) = StateStore::get::<AuthFlowSession>(provider, &session.session_id).await? else {
        let e = Error::SessionNotFound(session.session_id.clone());
        tracing::error!(target: "Endpoint::request_credential", ?e);
        return Err(e);
    };

    let token_request = TokenRequest {
        client_id: Some(flow.client.client_id.clone()),
        grant: TokenGrantType::AuthorizationCode {
            code: session.code.clone(),
            code_verifier: flow.pkce.verifier.clone(),
            redirect_uri: flow.redirect_uri(),
        },
    };
    // on failure the session stays in place so the exchange can be retried
    let token = IssuerClient::token(provider, &flow.oauth_server.token_endpoint, &token_request).await?;

    let mut records = vec![];
    for cfg_id in &flow.configuration_ids {
        let Some(configuration) = flow.issuer.configuration(cfg_id) else {
            let e = Error::InvalidState(format!("configuration {cfg_id} not in issuer metadata"));
            tracing::error!(target: "Endpoint::request_credential", ?e);
            return Err(e);
        };
        let record = issue_credential(
            provider,
            configuration,
            &flow.issuer,
            &token,
            Some(&flow.client.client_id),
        )
        .await?;
        CredentialStorer::save(provider, &record).await?;
        records.push(record);
    }

    // records are committed; the session has served its purpose
    StateStore::purge(provider, &session.session_id).await?;

    Ok(records)
}
