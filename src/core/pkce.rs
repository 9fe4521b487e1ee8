//! # Generate PKCE Code Challenge & Verifier

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A PKCE verifier/challenge pair as used in the authorization code flow
/// (RFC 7636, `S256` method).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PkcePair {
    /// The code verifier, sent to the token endpoint.
    pub verifier: String,

    /// `base64url(SHA-256(verifier))`, sent with the authorization request.
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh pair from a new random verifier.
    #[must_use]
    pub fn generate() -> Self {
        let verifier = code_verifier();
        let challenge = code_challenge(&verifier);
        Self { verifier, challenge }
    }
}

/// Generate a random code verifier for PKCE: 32 bytes of CSPRNG output,
/// base64url-encoded (43 characters, unreserved alphabet).
#[must_use]
pub fn code_verifier() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

/// Generate a code challenge for PKCE from a code verifier.
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    Base64UrlUnpadded::encode_string(&hash)
}
