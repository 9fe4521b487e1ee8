//! # Credential Request
//!
//! Builds a format-specific credential request with a fresh
//! proof-of-possession, dispatches it to the credential endpoint and
//! decodes the response into a typed record.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cbor;
use crate::core::generate;
use crate::credential::{
    CredentialRecord, CredentialState, MdocCredential, SdJwtCredential,
};
use crate::crypto::PublicKeyJwk;
use crate::error::{Error, Result};
use crate::identifier::{CredentialId, DocType, Vct};
use crate::provider::{HolderProvider, IssuerClient, KeyService};
use crate::types::{
    CredentialConfiguration, CredentialRequest, CredentialRequestType, CredentialResponseType,
    FormatProfile, IssuerMetadata, Proof, ProofClaims, TokenResponse,
};

/// JWS protected header of the proof-of-possession JWT.
#[derive(Debug, Serialize)]
struct ProofHeader<'a> {
    alg: &'a str,
    typ: &'a str,
    jwk: &'a PublicKeyJwk,
}

/// Request one credential for the given configuration and decode the
/// response into a record. The record is not persisted here; the calling
/// flow owns the commit point.
pub(super) async fn issue_credential(
    provider: &impl HolderProvider, configuration: &CredentialConfiguration,
    issuer: &IssuerMetadata, token: &TokenResponse, client_id: Option<&str>,
) -> Result<CredentialRecord> {
    // fresh holder key for this credential
    let key = KeyService::generate_key(provider).await?;
    let jwt = proof_jwt(provider, &key.key_id, &key.algorithm, &key.jwk, issuer, token, client_id)
        .await?;

    let credential_type = match &configuration.profile {
        FormatProfile::SdJwt { vct } => CredentialRequestType::SdJwt { vct: vct.clone() },
        FormatProfile::Mdoc { doctype } => CredentialRequestType::Mdoc { doctype: doctype.clone() },
    };
    let request = CredentialRequest {
        credential_type,
        proof: Proof { proof_type: "jwt".to_string(), jwt },
    };

    let response =
        IssuerClient::credential(provider, &issuer.credential_endpoint, &token.access_token, &request)
            .await?;

    let credential = match response.response {
        CredentialResponseType::Credential { credential } => credential,
        CredentialResponseType::TransactionId { transaction_id } => {
            let e = Error::DeferredIssuanceNotSupported(transaction_id);
            tracing::error!(target: "Endpoint::credential", ?e);
            return Err(e);
        }
    };

    let displays = configuration.display.clone();
    let record = match &configuration.profile {
        FormatProfile::SdJwt { vct } => {
            let (issuer_signed, disclosures) = parse_sd_jwt(&credential)?;
            let expires_at = sd_jwt_expiry(&issuer_signed)?;
            CredentialRecord::SdJwt(SdJwtCredential {
                id: CredentialId::new(),
                vct: Vct::new(vct.clone())?,
                encoded_issuer_signed: issuer_signed,
                disclosures,
                key_id: key.key_id,
                credential_set_id: generate::credential_set_id(),
                state: CredentialState::default(),
                expires_at,
                displays,
            })
        }
        FormatProfile::Mdoc { doctype } => {
            let mdoc = Base64UrlUnpadded::decode_vec(&credential)
                .map_err(|e| Error::decode("mdoc", format!("credential is not base64url: {e}")))?;
            cbor::validate_issuer_signed(&mdoc)?;
            CredentialRecord::Mdoc(MdocCredential {
                id: CredentialId::new(),
                doc_type: DocType::new(doctype.clone())?,
                mdoc,
                key_id: key.key_id,
                credential_set_id: generate::credential_set_id(),
                state: CredentialState::default(),
                expires_at: None,
                displays,
            })
        }
    };

    Ok(record)
}

/// Construct and sign the proof-of-possession JWT binding the fresh key to
/// the issuer's `c_nonce`.
async fn proof_jwt(
    key_service: &impl KeyService, key_id: &str, algorithm: &crate::crypto::Algorithm,
    jwk: &PublicKeyJwk, issuer: &IssuerMetadata, token: &TokenResponse, client_id: Option<&str>,
) -> Result<String> {
    let header = ProofHeader {
        alg: algorithm.as_alg(),
        typ: "openid4vci-proof+jwt",
        jwk,
    };
    let claims = ProofClaims {
        iss: client_id.map(ToString::to_string),
        aud: issuer.credential_issuer.clone(),
        iat: Utc::now().timestamp(),
        nonce: token.c_nonce.clone(),
    };

    let header_raw = serde_json::to_vec(&header)
        .map_err(|e| Error::InvalidState(format!("proof header: {e}")))?;
    let claims_raw = serde_json::to_vec(&claims)
        .map_err(|e| Error::InvalidState(format!("proof claims: {e}")))?;
    let payload = format!(
        "{}.{}",
        Base64UrlUnpadded::encode_string(&header_raw),
        Base64UrlUnpadded::encode_string(&claims_raw)
    );

    let sig = KeyService::sign(key_service, key_id, payload.as_bytes()).await?;
    Ok(format!("{payload}.{}", Base64UrlUnpadded::encode_string(&sig)))
}

/// Split an SD-JWT compact serialization into the issuer-signed JWT and its
/// disclosures. A trailing key-binding JWT is tolerated and not treated as
/// a disclosure.
fn parse_sd_jwt(compact: &str) -> Result<(String, Vec<String>)> {
    let mut segments = compact.split('~');

    let Some(issuer_signed) = segments.next() else {
        return Err(Error::decode("sd-jwt", "empty credential"));
    };
    if issuer_signed.split('.').count() != 3 {
        return Err(Error::decode("sd-jwt", "issuer-signed segment is not a compact JWT"));
    }

    let mut disclosures =
        segments.filter(|s| !s.is_empty()).map(ToString::to_string).collect::<Vec<_>>();
    if disclosures.last().is_some_and(|last| last.split('.').count() == 3) {
        disclosures.pop();
    }

    Ok((issuer_signed.to_string(), disclosures))
}

/// Extract the expiry from the issuer-signed JWT's `exp` claim, when one is
/// declared.
fn sd_jwt_expiry(issuer_signed: &str) -> Result<Option<DateTime<Utc>>> {
    let payload = issuer_signed
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::decode("sd-jwt", "missing payload segment"))?;
    let decoded = Base64UrlUnpadded::decode_vec(payload)
        .map_err(|e| Error::decode("sd-jwt", format!("payload is not base64url: {e}")))?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded)
        .map_err(|e| Error::decode("sd-jwt", format!("payload is not JSON: {e}")))?;

    let Some(exp) = claims.get("exp").and_then(serde_json::Value::as_i64) else {
        return Ok(None);
    };
    Ok(DateTime::from_timestamp(exp, 0))
}
