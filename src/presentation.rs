//! # Presentation
//!
//! Verifier-side request handling: parsing OpenID4VP authorization request
//! objects and authenticating them against the certificate chain carried in
//! the JWS header.

mod request;

pub use request::SignedRequestObject;
