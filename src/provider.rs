//! # Provider
//!
//! The traits exported by this module inject external capabilities into the
//! holder agent: transport to the issuer's endpoints, session and
//! credential storage, and key management. The agent context is whatever
//! value implements them — it is threaded explicitly through every
//! endpoint, never held in ambient state.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::credential::CredentialRecord;
use crate::crypto::{Algorithm, PublicKeyJwk};
use crate::error::Result;
use crate::identifier::CredentialId;
use crate::types::{
    CredentialOffer, CredentialRequest, CredentialResponse, IssuerMetadata, OAuthServerMetadata,
    PushedAuthorizationRequest, PushedAuthorizationResponse, TokenRequest, TokenResponse,
};

/// Transport to an issuer's OpenID4VCI endpoints. While the specification is
/// oriented towards HTTP, the trait keeps the agent transport agnostic.
///
/// Implementations surface non-2xx responses as the matching typed error:
/// `MetadataFetchFailed`, `PushedAuthorizationFailed`, `TokenExchangeFailed`
/// (preserving the server's `error` and `error_description`) and
/// `CredentialRequestFailed`. Requests are expected to be bounded by a
/// timeout, surfacing `Timeout` on expiry. Idempotent GETs (metadata, offer
/// fetch) may be retried with backoff; the POSTs must not be.
pub trait IssuerClient: Send + Sync {
    /// Fetch a credential offer referenced by `credential_offer_uri`.
    fn fetch_offer(&self, url: &str) -> impl Future<Output = Result<CredentialOffer>> + Send;

    /// Fetch issuer metadata from
    /// `<issuer>/.well-known/openid-credential-issuer`.
    fn issuer_metadata(&self, issuer: &str)
        -> impl Future<Output = Result<IssuerMetadata>> + Send;

    /// Fetch authorization server metadata from the given URL.
    fn oauth_server_metadata(
        &self, url: &str,
    ) -> impl Future<Output = Result<OAuthServerMetadata>> + Send;

    /// Push an authorization request, form-url-encoded, to the PAR endpoint.
    fn pushed_authorization(
        &self, endpoint: &str, request: &PushedAuthorizationRequest,
    ) -> impl Future<Output = Result<PushedAuthorizationResponse>> + Send;

    /// Exchange a grant for an access token at the token endpoint.
    fn token(
        &self, endpoint: &str, request: &TokenRequest,
    ) -> impl Future<Output = Result<TokenResponse>> + Send;

    /// Request a credential, authorized by the given access token.
    fn credential(
        &self, endpoint: &str, access_token: &str, request: &CredentialRequest,
    ) -> impl Future<Output = Result<CredentialResponse>> + Send;
}

/// `StateStore` holds in-flight authorization state across the browser
/// redirect. The only shared-mutable surface in the agent; implementations
/// serialize writes per key (last writer wins).
pub trait StateStore: Send + Sync {
    /// Store state under the given key. The expiry indicates when the entry
    /// can be expunged.
    fn put(
        &self, key: &str, state: impl Serialize + Send, expiry: DateTime<Utc>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Retrieve state for the given key, or `None` when absent.
    fn get<T: DeserializeOwned>(
        &self, key: &str,
    ) -> impl Future<Output = anyhow::Result<Option<T>>> + Send;

    /// Remove state for the given key. Removing an absent key is not an
    /// error.
    fn purge(&self, key: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// `CredentialStorer` provides persistent storage of credential records.
pub trait CredentialStorer: Send + Sync {
    /// Save a record, overwriting any existing record with the same id.
    fn save(&self, credential: &CredentialRecord)
        -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Retrieve the record with the given id, or `None` when absent.
    fn load(
        &self, id: &CredentialId,
    ) -> impl Future<Output = anyhow::Result<Option<CredentialRecord>>> + Send;

    /// All stored records.
    fn all(&self) -> impl Future<Output = anyhow::Result<Vec<CredentialRecord>>> + Send;

    /// Remove the record with the given id.
    fn remove(&self, id: &CredentialId) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// A holder key as returned by the key service. Private material never
/// leaves the service; signing goes back through [`KeyService::sign`].
#[derive(Clone, Debug)]
pub struct HolderKey {
    /// Identifier for the key within the key service.
    pub key_id: String,

    /// Signature algorithm the key signs with.
    pub algorithm: Algorithm,

    /// The public key in JWK form, for the proof JWT header.
    pub jwk: PublicKeyJwk,
}

/// `KeyService` manages holder key material. Key generation policy is the
/// implementation's concern.
pub trait KeyService: Send + Sync {
    /// Generate a fresh key for a credential to be bound to.
    fn generate_key(&self) -> impl Future<Output = anyhow::Result<HolderKey>> + Send;

    /// Sign `msg` with the identified key.
    fn sign(&self, key_id: &str, msg: &[u8])
        -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;
}

/// The full capability set required to drive issuance flows.
pub trait HolderProvider:
    IssuerClient + StateStore + CredentialStorer + KeyService + Clone + Send + Sync
{
}
