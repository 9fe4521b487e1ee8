//! # Request Object Authentication
//!
//! A signed request object is authenticated by three independent checks:
//! the JWS signature under the leaf certificate, the internal consistency
//! of the `x5c` chain, and the binding of `client_id` to the leaf
//! certificate's subject alternative names. The full policy is their
//! conjunction; each is replayable on its own.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use url::Url;

use crate::crypto::{
    decode_x5c_entry, is_self_issued, parse_certificate, san_dns_names, san_uris, valid_at,
    verify_issued, verify_jws, Algorithm,
};
use crate::error::{Error, Result};
use crate::types::{ClientIdScheme, JwsHeader, RequestObject};

/// A parsed, not yet authenticated, request object JWS.
#[derive(Clone, Debug)]
pub struct SignedRequestObject {
    /// The protected header.
    pub header: JwsHeader,

    /// The request object payload.
    pub payload: RequestObject,

    // `header.payload` exactly as signed
    signing_input: String,
    signature: Vec<u8>,
    // decoded x5c chain, leaf first
    chain: Vec<Vec<u8>>,
}

impl SignedRequestObject {
    /// Parse a compact JWS into its constituents. No cryptographic checks
    /// are performed here.
    ///
    /// # Errors
    /// Returns `DecodeFailed` when the serialization, header or payload is
    /// malformed, or an `x5c` entry is not base64 DER.
    pub fn parse(compact: &str) -> Result<Self> {
        let parts = compact.split('.').collect::<Vec<_>>();
        let [header_part, payload_part, signature_part] = parts.as_slice() else {
            return Err(Error::decode("request-object", "not a compact JWS"));
        };

        let header_raw = Base64UrlUnpadded::decode_vec(header_part)
            .map_err(|e| Error::decode("request-object", format!("header: {e}")))?;
        let header: JwsHeader = serde_json::from_slice(&header_raw)
            .map_err(|e| Error::decode("request-object", format!("header: {e}")))?;

        let payload_raw = Base64UrlUnpadded::decode_vec(payload_part)
            .map_err(|e| Error::decode("request-object", format!("payload: {e}")))?;
        let payload: RequestObject = serde_json::from_slice(&payload_raw)
            .map_err(|e| Error::decode("request-object", format!("payload: {e}")))?;

        let signature = Base64UrlUnpadded::decode_vec(signature_part)
            .map_err(|e| Error::decode("request-object", format!("signature: {e}")))?;

        let chain = header
            .x5c
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|entry| decode_x5c_entry(entry))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            header,
            payload,
            signing_input: format!("{header_part}.{payload_part}"),
            signature,
            chain,
        })
    }

    /// Verify the JWS signature over `header.payload` using the leaf
    /// certificate from `x5c` and the header's `alg`.
    ///
    /// # Errors
    /// Returns `InvalidSignature` when the algorithm is not whitelisted,
    /// the chain is empty, or the signature does not verify.
    pub fn validate_jwt(&self) -> Result<&RequestObject> {
        let alg = Algorithm::from_alg(&self.header.alg)?;
        let Some(leaf_der) = self.chain.first() else {
            return Err(Error::InvalidSignature("x5c carries no certificate".to_string()));
        };
        let leaf = parse_certificate(leaf_der)
            .map_err(|e| Error::InvalidSignature(e.to_string()))?;

        verify_jws(&leaf, &alg, self.signing_input.as_bytes(), &self.signature)?;
        Ok(&self.payload)
    }

    /// Verify the internal consistency of the `x5c` chain: every adjacent
    /// pair verifies child-under-parent, every validity window covers
    /// `now`, and a single-element chain is self-signed.
    ///
    /// # Errors
    /// Returns `TrustChainInvalid` naming the first defect.
    pub fn validate_trust_chain(&self, now: DateTime<Utc>) -> Result<&RequestObject> {
        if self.chain.is_empty() {
            return Err(Error::TrustChainInvalid("x5c carries no certificate".to_string()));
        }

        let certificates = self
            .chain
            .iter()
            .map(|der| parse_certificate(der))
            .collect::<Result<Vec<_>>>()?;

        for certificate in &certificates {
            if !valid_at(certificate, now.timestamp())? {
                return Err(Error::TrustChainInvalid(
                    "certificate outside validity window".to_string(),
                ));
            }
        }

        if let [only] = certificates.as_slice() {
            if !is_self_issued(only) {
                return Err(Error::TrustChainInvalid("single non-self-signed".to_string()));
            }
            verify_issued(only, only)?;
            return Ok(&self.payload);
        }

        for pair in certificates.windows(2) {
            let (child, parent) = (&pair[0], &pair[1]);
            if child.issuer().as_raw() != parent.subject().as_raw() {
                return Err(Error::TrustChainInvalid(
                    "issuer does not match parent subject".to_string(),
                ));
            }
            verify_issued(child, parent)?;
        }

        Ok(&self.payload)
    }

    /// Verify that `client_id` is bound to the leaf certificate: for
    /// `x509_san_dns` an exact dNSName match, for `x509_san_uri` a URI
    /// match after normalization. Wildcard SANs are not honored.
    ///
    /// # Errors
    /// Returns `ClientIdBindingMismatch` when no SAN entry matches, or
    /// `InvalidState` for schemes this check does not cover.
    pub fn validate_san_name(&self) -> Result<&RequestObject> {
        let Some(leaf_der) = self.chain.first() else {
            return Err(Error::ClientIdBindingMismatch);
        };
        let leaf = parse_certificate(leaf_der)?;

        let bound = match &self.payload.client_id_scheme {
            Some(ClientIdScheme::X509SanDns) => san_dns_names(&leaf)
                .iter()
                .any(|name| *name == self.payload.client_id),
            Some(ClientIdScheme::X509SanUri) => {
                let client_id = normalize_uri(&self.payload.client_id);
                san_uris(&leaf).iter().any(|uri| normalize_uri(uri) == client_id)
            }
            other => {
                return Err(Error::InvalidState(format!(
                    "client_id_scheme {other:?} is not SAN-bound"
                )));
            }
        };

        if bound { Ok(&self.payload) } else { Err(Error::ClientIdBindingMismatch) }
    }

    /// The full authentication policy: signature, chain and SAN binding
    /// must all pass.
    ///
    /// # Errors
    /// Returns the first failing check's error.
    pub fn verify(&self, now: DateTime<Utc>) -> Result<&RequestObject> {
        self.validate_jwt()?;
        self.validate_trust_chain(now)?;
        self.validate_san_name()
    }
}

/// Normalize a URI for comparison: lowercase scheme and host, drop default
/// ports. Values that do not parse compare verbatim.
fn normalize_uri(uri: &str) -> String {
    Url::parse(uri).map_or_else(|_| uri.to_string(), |url| url.to_string())
}
