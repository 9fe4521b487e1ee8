//! # Types
//!
//! Request and response types exchanged with issuers and verifiers. The
//! types serialize to and from JSON in accordance with the OpenID4VCI and
//! OpenID4VP specifications.

mod authorization;
mod credential;
mod metadata;
mod offer;
mod request_object;
mod token;

pub use authorization::{
    AuthorizationDetail, PushedAuthorizationRequest, PushedAuthorizationResponse,
};
pub use credential::{
    CredentialRequest, CredentialRequestType, CredentialResponse, CredentialResponseType, Proof,
    ProofClaims,
};
pub use metadata::{
    CredentialConfiguration, CredentialOfferMetadata, DisplayMetadata, FormatProfile,
    IssuerMetadata, LogoMetadata, OAuthServerMetadata,
};
pub use offer::{
    AuthorizationCodeGrant, CredentialOffer, Grants, OfferPayload, PreAuthorizedCodeGrant, TxCode,
};
pub use request_object::{ClientIdScheme, JwsHeader, RequestObject};
pub use token::{TokenGrantType, TokenRequest, TokenResponse};
