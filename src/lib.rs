//! # `OpenID` for Verifiable Credentials Holder
//!
//! The holder side of the `OpenID4VC` protocol family: credential issuance
//! ([OpenID for Verifiable Credential Issuance]) and the authentication of
//! presentation requests ([OpenID for Verifiable Presentations]).
//!
//! The crate does not provide a user or service interface — that is the job
//! of a wallet implementation. Transport, storage and key management are
//! injected through the traits in [`provider`]; the endpoints in
//! [`issuance`] drive the protocol flows over them.
//!
//! # Design
//!
//! **Endpoints** — issuance is exposed as endpoint functions
//! ([`issuance::resolve_offer`], [`issuance::initiate_auth_flow`],
//! [`issuance::request_credential`], [`issuance::accept_offer`]) whose
//! request and response types serialize to and from JSON. Presentation
//! request authentication is exposed on
//! [`presentation::SignedRequestObject`] as three independently callable
//! checks.
//!
//! **Provider** — implementors supply the `IssuerClient`, `StateStore`,
//! `CredentialStorer` and `KeyService` traits. The provider value is the
//! agent context: it is passed to every endpoint and no state is held
//! anywhere else.
//!
//! [OpenID for Verifiable Credential Issuance]: https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html
//! [OpenID for Verifiable Presentations]: https://openid.net/specs/openid-4-verifiable-presentations-1_0.html

pub mod cbor;
pub mod core;
pub mod credential;
pub mod crypto;
mod error;
pub mod identifier;
pub mod issuance;
pub mod presentation;
pub mod provider;
pub mod types;

pub use error::{Error, Result};
