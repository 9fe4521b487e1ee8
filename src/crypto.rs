//! # Cryptographic Back-end
//!
//! Signature verification and X.509 handling behind a small surface so the
//! flows stay independent of any one provider. Verification is implemented
//! with the RustCrypto stack; certificate parsing with `x509-parser`.

use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use ed25519_dalek::Verifier as _;
use p256::ecdsa::signature::Verifier as _;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::oid_registry::{
    OID_PKCS1_RSASSAPSS, OID_PKCS1_SHA256WITHRSA, OID_SIG_ECDSA_WITH_SHA256, OID_SIG_ED25519,
};
use x509_parser::parse_x509_certificate;
use x509_parser::time::ASN1Time;

use crate::error::Error;

/// Signature algorithms accepted on request objects and used for proofs of
/// possession.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Algorithm {
    /// ECDSA over P-256 with SHA-256.
    #[default]
    ES256,

    /// RSASSA-PKCS1-v1_5 with SHA-256.
    RS256,

    /// RSASSA-PSS with SHA-256.
    PS256,

    /// Ed25519.
    EdDSA,
}

impl Algorithm {
    /// Map a JOSE `alg` value onto a supported algorithm.
    ///
    /// # Errors
    /// Returns `InvalidSignature` for algorithms outside the whitelist.
    pub fn from_alg(alg: &str) -> Result<Self, Error> {
        match alg {
            "ES256" => Ok(Self::ES256),
            "RS256" => Ok(Self::RS256),
            "PS256" => Ok(Self::PS256),
            "EdDSA" => Ok(Self::EdDSA),
            other => Err(Error::InvalidSignature(format!("alg {other} is not accepted"))),
        }
    }

    /// The JOSE `alg` value.
    #[must_use]
    pub const fn as_alg(&self) -> &'static str {
        match self {
            Self::ES256 => "ES256",
            Self::RS256 => "RS256",
            Self::PS256 => "PS256",
            Self::EdDSA => "EdDSA",
        }
    }
}

/// A public key in JWK form, as embedded in proof-of-possession JWT headers.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublicKeyJwk {
    /// Key type: `EC` or `OKP`.
    pub kty: String,

    /// Curve name for EC and OKP keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// X coordinate (or raw key for OKP), base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// Y coordinate for EC keys, base64url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

/// Parse a DER-encoded X.509 certificate.
///
/// # Errors
/// Returns `TrustChainInvalid` when the bytes do not parse.
pub fn parse_certificate(der: &[u8]) -> Result<X509Certificate<'_>, Error> {
    let (_, certificate) = parse_x509_certificate(der)
        .map_err(|e| Error::TrustChainInvalid(format!("certificate does not parse: {e}")))?;
    Ok(certificate)
}

/// Decode one `x5c` entry (standard base64 DER).
///
/// # Errors
/// Returns `TrustChainInvalid` when the entry is not valid base64.
pub fn decode_x5c_entry(entry: &str) -> Result<Vec<u8>, Error> {
    Base64::decode_vec(entry)
        .map_err(|e| Error::TrustChainInvalid(format!("x5c entry is not base64: {e}")))
}

/// Verify a JWS signature (JOSE serialization) against the certificate's
/// public key.
///
/// # Errors
/// Returns `InvalidSignature` when verification fails or the key does not
/// match the algorithm.
pub fn verify_jws(
    certificate: &X509Certificate<'_>, alg: &Algorithm, msg: &[u8], sig: &[u8],
) -> Result<(), Error> {
    let spki: &[u8] = &certificate.public_key().subject_public_key.data;
    match alg {
        Algorithm::ES256 => {
            let signature = p256::ecdsa::Signature::from_slice(sig)
                .map_err(|e| Error::InvalidSignature(format!("malformed ES256 signature: {e}")))?;
            verify_es256(spki, msg, &signature)
        }
        Algorithm::RS256 => {
            let key = rsa_key(spki)?;
            key.verify(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(msg), sig)
                .map_err(|e| Error::InvalidSignature(format!("RS256 verification failed: {e}")))
        }
        Algorithm::PS256 => {
            let key = rsa_key(spki)?;
            key.verify(rsa::pss::Pss::new::<Sha256>(), &Sha256::digest(msg), sig)
                .map_err(|e| Error::InvalidSignature(format!("PS256 verification failed: {e}")))
        }
        Algorithm::EdDSA => {
            let signature = ed25519_dalek::Signature::from_slice(sig)
                .map_err(|e| Error::InvalidSignature(format!("malformed EdDSA signature: {e}")))?;
            verify_eddsa(spki, msg, &signature)
        }
    }
}

/// Verify that `parent` signed `child`: the child's signature, interpreted
/// per its signature algorithm, must verify over the child's TBS bytes under
/// the parent's public key.
///
/// # Errors
/// Returns `TrustChainInvalid` when the signature does not verify or the
/// algorithm is unsupported.
pub fn verify_issued(
    child: &X509Certificate<'_>, parent: &X509Certificate<'_>,
) -> Result<(), Error> {
    let tbs = child.tbs_certificate.as_ref();
    let sig: &[u8] = &child.signature_value.data;
    let spki: &[u8] = &parent.public_key().subject_public_key.data;
    let oid = &child.signature_algorithm.algorithm;

    let outcome = if *oid == OID_SIG_ECDSA_WITH_SHA256 {
        p256::ecdsa::Signature::from_der(sig)
            .map_err(|e| Error::InvalidSignature(format!("malformed ECDSA signature: {e}")))
            .and_then(|signature| verify_es256(spki, tbs, &signature))
    } else if *oid == OID_PKCS1_SHA256WITHRSA {
        rsa_key(spki).and_then(|key| {
            key.verify(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(tbs), sig)
                .map_err(|e| Error::InvalidSignature(e.to_string()))
        })
    } else if *oid == OID_PKCS1_RSASSAPSS {
        rsa_key(spki).and_then(|key| {
            key.verify(rsa::pss::Pss::new::<Sha256>(), &Sha256::digest(tbs), sig)
                .map_err(|e| Error::InvalidSignature(e.to_string()))
        })
    } else if *oid == OID_SIG_ED25519 {
        ed25519_dalek::Signature::from_slice(sig)
            .map_err(|e| Error::InvalidSignature(format!("malformed EdDSA signature: {e}")))
            .and_then(|signature| verify_eddsa(spki, tbs, &signature))
    } else {
        return Err(Error::TrustChainInvalid(format!("unsupported signature algorithm: {oid}")));
    };

    outcome.map_err(|e| Error::TrustChainInvalid(format!("issuer signature invalid: {e}")))
}

fn verify_es256(spki: &[u8], msg: &[u8], signature: &p256::ecdsa::Signature) -> Result<(), Error> {
    let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(spki)
        .map_err(|e| Error::InvalidSignature(format!("public key is not P-256: {e}")))?;
    key.verify(msg, signature)
        .map_err(|e| Error::InvalidSignature(format!("ES256 verification failed: {e}")))
}

fn verify_eddsa(
    spki: &[u8], msg: &[u8], signature: &ed25519_dalek::Signature,
) -> Result<(), Error> {
    let bytes: &[u8; 32] = spki
        .try_into()
        .map_err(|_| Error::InvalidSignature("public key is not Ed25519".to_string()))?;
    let key = ed25519_dalek::VerifyingKey::from_bytes(bytes)
        .map_err(|e| Error::InvalidSignature(format!("public key is not Ed25519: {e}")))?;
    key.verify(msg, signature)
        .map_err(|e| Error::InvalidSignature(format!("EdDSA verification failed: {e}")))
}

fn rsa_key(spki: &[u8]) -> Result<RsaPublicKey, Error> {
    RsaPublicKey::from_pkcs1_der(spki)
        .map_err(|e| Error::InvalidSignature(format!("public key is not RSA: {e}")))
}

/// Whether the certificate's validity window covers the given instant
/// (seconds since the Unix epoch).
///
/// # Errors
/// Returns `TrustChainInvalid` when the timestamp is not representable.
pub fn valid_at(certificate: &X509Certificate<'_>, now: i64) -> Result<bool, Error> {
    let time = ASN1Time::from_timestamp(now)
        .map_err(|e| Error::TrustChainInvalid(format!("timestamp out of range: {e}")))?;
    Ok(certificate.validity().is_valid_at(time))
}

/// Whether issuer and subject name are byte-identical.
#[must_use]
pub fn is_self_issued(certificate: &X509Certificate<'_>) -> bool {
    certificate.issuer().as_raw() == certificate.subject().as_raw()
}

/// The certificate's SAN dNSName entries.
#[must_use]
pub fn san_dns_names<'a>(certificate: &'a X509Certificate<'_>) -> Vec<&'a str> {
    san_entries(certificate, |name| match name {
        GeneralName::DNSName(dns) => Some(*dns),
        _ => None,
    })
}

/// The certificate's SAN URI entries.
#[must_use]
pub fn san_uris<'a>(certificate: &'a X509Certificate<'_>) -> Vec<&'a str> {
    san_entries(certificate, |name| match name {
        GeneralName::URI(uri) => Some(*uri),
        _ => None,
    })
}

fn san_entries<'a>(
    certificate: &'a X509Certificate<'_>, select: fn(&'a GeneralName<'a>) -> Option<&'a str>,
) -> Vec<&'a str> {
    certificate
        .extensions()
        .iter()
        .filter_map(|ext| match ext.parsed_extension() {
            ParsedExtension::SubjectAlternativeName(san) => Some(&san.general_names),
            _ => None,
        })
        .flatten()
        .filter_map(select)
        .collect()
}

/// Encode bytes as unpadded base64url.
#[must_use]
pub fn b64url(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}

/// Decode unpadded base64url.
///
/// # Errors
/// Returns `DecodeFailed` when the input is not valid base64url.
pub fn b64url_decode(encoded: &str) -> Result<Vec<u8>, Error> {
    Base64UrlUnpadded::decode_vec(encoded)
        .map_err(|e| Error::decode("base64url", e.to_string()))
}

/// SHA-256 digest.
#[must_use]
pub fn sha256(bytes: &[u8]) -> Vec<u8> {
    Sha256::digest(bytes).to_vec()
}
