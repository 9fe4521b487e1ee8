//! # Errors
//!
//! Failure kinds surfaced by the holder agent. Each protocol step raises a
//! dedicated kind so callers can distinguish a malformed offer from, say, a
//! failed token exchange without string matching.

use thiserror::Error;

/// Failures surfaced by issuance and presentation flows.
#[derive(Error, Debug)]
pub enum Error {
    /// The credential offer could not be parsed. Carries one reason per
    /// malformed field.
    #[error("malformed credential offer: {}", .0.join("; "))]
    OfferMalformed(Vec<String>),

    /// Fetching issuer or authorization server metadata failed.
    #[error("metadata fetch failed with status {status}")]
    MetadataFetchFailed {
        /// HTTP status returned by the metadata endpoint.
        status: u16,
    },

    /// The pushed authorization request was rejected. No session is stored
    /// when this is raised.
    #[error("pushed authorization request failed with status {status}: {body}")]
    PushedAuthorizationFailed {
        /// HTTP status returned by the PAR endpoint.
        status: u16,
        /// Response body as returned by the server.
        body: String,
    },

    /// No authorization flow session exists for the given session id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The token endpoint returned an OAuth error. The session is preserved
    /// so the exchange can be retried.
    #[error("token exchange failed: {error}: {error_description}")]
    TokenExchangeFailed {
        /// OAuth `error` code returned by the token endpoint.
        error: String,
        /// OAuth `error_description`, empty when the server omitted it.
        error_description: String,
    },

    /// The credential endpoint rejected the request. The flow is terminal.
    #[error("credential request failed with status {status}: {body}")]
    CredentialRequestFailed {
        /// HTTP status returned by the credential endpoint.
        status: u16,
        /// Response body as returned by the server.
        body: String,
    },

    /// The issuer responded with a transaction id for deferred issuance,
    /// which this agent does not support.
    #[error("deferred issuance is not supported (transaction_id: {0})")]
    DeferredIssuanceNotSupported(String),

    /// Decoding a credential or stored record failed.
    #[error("failed to decode {format}: {reason}")]
    DecodeFailed {
        /// Format being decoded, e.g. "sd-jwt", "mdoc", "record".
        format: String,
        /// What went wrong.
        reason: String,
    },

    /// A JWS signature did not verify.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The `x5c` certificate chain is not internally consistent.
    #[error("trust chain invalid: {0}")]
    TrustChainInvalid(String),

    /// The request object's `client_id` is not bound to the leaf
    /// certificate's subject alternative names.
    #[error("client_id is not bound to the leaf certificate SAN")]
    ClientIdBindingMismatch,

    /// An HTTP operation exceeded its deadline.
    #[error("operation timed out")]
    Timeout,

    /// An HTTP operation failed below the protocol layer.
    #[error("transport error: {0}")]
    TransportError(String),

    /// A request is inconsistent with the current flow state or an internal
    /// invariant does not hold.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A provider (store, key service) failed below the protocol layer.
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

impl Error {
    /// Convenience constructor for decode failures.
    #[must_use]
    pub fn decode(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DecodeFailed { format: format.into(), reason: reason.into() }
    }
}

/// Shorthand result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
