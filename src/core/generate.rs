//! # Random Identifiers

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::RngCore;

/// Generate a session identifier: 128 bits of CSPRNG output,
/// base64url-encoded.
#[must_use]
pub fn session_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

/// Generate a credential set identifier, grouping batch-issued copies of
/// the same logical credential.
#[must_use]
pub fn credential_set_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
