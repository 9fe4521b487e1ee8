//! # Issuance
//!
//! The holder's credential issuance flow. An offer is resolved against
//! issuer metadata, authorization is obtained through either the
//! pre-authorized code grant or the authorization code grant (with PAR and
//! PKCE), and the issued credentials are decoded into typed records.

mod accept;
mod authorize;
mod credential;
mod offer;
mod token;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

pub use accept::{accept_offer, AcceptRequest};
pub use authorize::{initiate_auth_flow, AuthorizeRequest, InitiatedFlow};
pub use offer::{oauth_server_url, resolve_offer, OfferRequest};
pub use token::{request_credential, IssuanceSession};

use crate::core::pkce::PkcePair;
use crate::types::{IssuerMetadata, OAuthServerMetadata};

/// How long an in-flight authorization session survives before the store
/// may expunge it.
const SESSION_TTL_MINUTES: i64 = 10;

/// Registration details of the holder's agent with the authorization
/// server.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClientOptions {
    /// The wallet's client identifier.
    pub client_id: String,

    /// The redirect URI the authorization response is delivered to. The
    /// flow appends a `session` query parameter so the callback can resume
    /// the right session.
    pub redirect_uri: String,
}

/// In-flight authorization state, persisted between the pushed
/// authorization request and the token exchange.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthFlowSession {
    /// The session identifier, also sent as `state` with the PAR.
    pub session_id: String,

    /// The client registration the flow was started with.
    pub client: ClientOptions,

    /// Issuer metadata resolved for the offer.
    pub issuer: IssuerMetadata,

    /// Authorization server metadata the token request goes to.
    pub oauth_server: OAuthServerMetadata,

    /// Configuration ids the authorization covers.
    pub configuration_ids: Vec<String>,

    /// The PKCE pair minted for this flow.
    pub pkce: PkcePair,

    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl AuthFlowSession {
    /// The redirect URI for this session: the client's redirect URI with
    /// the session id appended.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}?session={}", self.client.redirect_uri, self.session_id)
    }
}

fn session_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + TimeDelta::minutes(SESSION_TTL_MINUTES)
}
