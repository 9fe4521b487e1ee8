//! In-process provider for exercising issuance flows end to end: an issuer
//! simulator with canned metadata, in-memory stores and a P-256 key
//! service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use ciborium::Value;
use coset::{CborSerializable, CoseSign1Builder};
use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::SigningKey;
use p256::elliptic_curve::sec1::ToEncodedPoint as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

use oid4vc_holder::credential::CredentialRecord;
use oid4vc_holder::crypto::{Algorithm, PublicKeyJwk};
use oid4vc_holder::identifier::CredentialId;
use oid4vc_holder::provider::{
    CredentialStorer, HolderKey, HolderProvider, IssuerClient, KeyService, StateStore,
};
use oid4vc_holder::types::{
    CredentialConfiguration, CredentialOffer, CredentialRequest, CredentialRequestType,
    CredentialResponse, CredentialResponseType, DisplayMetadata, FormatProfile, IssuerMetadata,
    OAuthServerMetadata, PushedAuthorizationRequest, PushedAuthorizationResponse, TokenGrantType,
    TokenRequest, TokenResponse,
};
use oid4vc_holder::{Error, Result};

pub const CREDENTIAL_ISSUER: &str = "https://issuer.example.com";
pub const PRE_AUTH_CODE: &str = "abc";
pub const AUTH_CODE: &str = "xyz";
pub const REQUEST_URI: &str = "urn:ietf:params:oauth:request_uri:6esc_11ACC5bwc014ltc14eY22c";

#[derive(Clone)]
pub struct Provider {
    inner: Arc<Inner>,
}

struct Inner {
    metadata: IssuerMetadata,
    expected_tx_code: Option<String>,
    deferred: AtomicBool,
    key_counter: AtomicUsize,

    state: Mutex<HashMap<String, serde_json::Value>>,
    credentials: Mutex<HashMap<String, CredentialRecord>>,
    keys: Mutex<HashMap<String, SigningKey>>,

    par_requests: Mutex<Vec<PushedAuthorizationRequest>>,
    token_requests: Mutex<Vec<TokenRequest>>,
    credential_requests: Mutex<Vec<CredentialRequest>>,
}

impl Provider {
    pub fn new() -> Self {
        Self::configure(None)
    }

    pub fn with_tx_code(expected: &str) -> Self {
        Self::configure(Some(expected.to_string()))
    }

    fn configure(expected_tx_code: Option<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                metadata: issuer_metadata(),
                expected_tx_code,
                deferred: AtomicBool::new(false),
                key_counter: AtomicUsize::new(0),
                state: Mutex::new(HashMap::new()),
                credentials: Mutex::new(HashMap::new()),
                keys: Mutex::new(HashMap::new()),
                par_requests: Mutex::new(Vec::new()),
                token_requests: Mutex::new(Vec::new()),
                credential_requests: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn deferred(self) -> Self {
        self.inner.deferred.store(true, Ordering::SeqCst);
        self
    }

    pub fn stored_credentials(&self) -> Vec<CredentialRecord> {
        self.inner.credentials.lock().expect("lock").values().cloned().collect()
    }

    pub fn par_requests(&self) -> Vec<PushedAuthorizationRequest> {
        self.inner.par_requests.lock().expect("lock").clone()
    }

    pub fn token_requests(&self) -> Vec<TokenRequest> {
        self.inner.token_requests.lock().expect("lock").clone()
    }

    pub fn credential_requests(&self) -> Vec<CredentialRequest> {
        self.inner.credential_requests.lock().expect("lock").clone()
    }
}

fn issuer_metadata() -> IssuerMetadata {
    let mut configurations = HashMap::new();
    configurations.insert(
        "EU_PID".to_string(),
        CredentialConfiguration {
            profile: FormatProfile::SdJwt { vct: "EU.PID".to_string() },
            scope: Some("pid".to_string()),
            display: Some(vec![DisplayMetadata {
                name: Some("Identity Card".to_string()),
                locale: Some("en-US".to_string()),
                ..DisplayMetadata::default()
            }]),
        },
    );
    configurations.insert(
        "org.iso.18013.5.1.mDL".to_string(),
        CredentialConfiguration {
            profile: FormatProfile::Mdoc { doctype: "org.iso.18013.5.1.mDL".to_string() },
            scope: Some("mdl".to_string()),
            display: None,
        },
    );

    IssuerMetadata {
        credential_issuer: CREDENTIAL_ISSUER.to_string(),
        authorization_servers: None,
        credential_endpoint: format!("{CREDENTIAL_ISSUER}/credential"),
        credential_configurations_supported: configurations,
    }
}

fn oauth_metadata() -> OAuthServerMetadata {
    OAuthServerMetadata {
        issuer: Some(CREDENTIAL_ISSUER.to_string()),
        authorization_endpoint: format!("{CREDENTIAL_ISSUER}/authorize"),
        token_endpoint: format!("{CREDENTIAL_ISSUER}/token"),
        pushed_authorization_request_endpoint: Some(format!("{CREDENTIAL_ISSUER}/par")),
        code_challenge_methods_supported: Some(vec!["S256".to_string()]),
        additional: HashMap::new(),
    }
}

/// A minimal issuer-signed SD-JWT: header and payload are well-formed JSON,
/// the signature is not meant to verify.
fn sample_sd_jwt_credential() -> String {
    let segment = |value: serde_json::Value| {
        Base64UrlUnpadded::encode_string(value.to_string().as_bytes())
    };
    let jwt = format!(
        "{}.{}.c2lnbmF0dXJl",
        segment(serde_json::json!({"alg": "ES256", "typ": "vc+sd-jwt"})),
        segment(serde_json::json!({"vct": "EU.PID", "iss": CREDENTIAL_ISSUER})),
    );
    let disclosure =
        Base64UrlUnpadded::encode_string(br#"["2GLC42sKQveCfGfryNRN9w","given_name","Erika"]"#);
    format!("{jwt}~{disclosure}~")
}

/// A minimal `IssuerSigned` mdoc, base64url over CBOR.
fn sample_mdoc_credential() -> String {
    let item = Value::Map(vec![
        (Value::Text("digestID".into()), Value::Integer(1.into())),
        (Value::Text("elementIdentifier".into()), Value::Text("family_name".into())),
        (Value::Text("elementValue".into()), Value::Text("Mustermann".into())),
    ]);
    let mut item_bytes = Vec::new();
    ciborium::into_writer(&item, &mut item_bytes).expect("should serialize");

    let sign1 = CoseSign1Builder::new().payload(b"mso".to_vec()).build();
    let auth_bytes = sign1.to_vec().expect("should serialize COSE_Sign1");
    let auth_value: Value =
        ciborium::from_reader(auth_bytes.as_slice()).expect("should deserialize");

    let issuer_signed = Value::Map(vec![
        (
            Value::Text("nameSpaces".into()),
            Value::Map(vec![(
                Value::Text("org.iso.18013.5.1".into()),
                Value::Array(vec![Value::Tag(24, Box::new(Value::Bytes(item_bytes)))]),
            )]),
        ),
        (Value::Text("issuerAuth".into()), auth_value),
    ]);

    let mut bytes = Vec::new();
    ciborium::into_writer(&issuer_signed, &mut bytes).expect("should serialize");
    Base64UrlUnpadded::encode_string(&bytes)
}

impl IssuerClient for Provider {
    async fn fetch_offer(&self, _url: &str) -> Result<CredentialOffer> {
        Err(Error::TransportError("offer fetch not wired in tests".to_string()))
    }

    async fn issuer_metadata(&self, issuer: &str) -> Result<IssuerMetadata> {
        if issuer != CREDENTIAL_ISSUER {
            return Err(Error::MetadataFetchFailed { status: 404 });
        }
        Ok(self.inner.metadata.clone())
    }

    async fn oauth_server_metadata(&self, url: &str) -> Result<OAuthServerMetadata> {
        if !url.contains("/.well-known/oauth-authorization-server") {
            return Err(Error::MetadataFetchFailed { status: 404 });
        }
        Ok(oauth_metadata())
    }

    async fn pushed_authorization(
        &self, endpoint: &str, request: &PushedAuthorizationRequest,
    ) -> Result<PushedAuthorizationResponse> {
        if endpoint != format!("{CREDENTIAL_ISSUER}/par") {
            return Err(Error::PushedAuthorizationFailed {
                status: 404,
                body: "unknown endpoint".to_string(),
            });
        }
        self.inner.par_requests.lock().expect("lock").push(request.clone());
        Ok(PushedAuthorizationResponse {
            request_uri: REQUEST_URI.to_string(),
            expires_in: Some(60),
        })
    }

    async fn token(&self, _endpoint: &str, request: &TokenRequest) -> Result<TokenResponse> {
        self.inner.token_requests.lock().expect("lock").push(request.clone());

        match &request.grant {
            TokenGrantType::PreAuthorizedCode { pre_authorized_code, tx_code } => {
                if pre_authorized_code != PRE_AUTH_CODE {
                    return Err(Error::TokenExchangeFailed {
                        error: "invalid_grant".to_string(),
                        error_description: "unknown pre-authorized code".to_string(),
                    });
                }
                if self.inner.expected_tx_code.as_deref() != tx_code.as_deref() {
                    return Err(Error::TokenExchangeFailed {
                        error: "invalid_grant".to_string(),
                        error_description: "transaction code mismatch".to_string(),
                    });
                }
            }
            TokenGrantType::AuthorizationCode { code, code_verifier, .. } => {
                if code != AUTH_CODE || code_verifier.is_empty() {
                    return Err(Error::TokenExchangeFailed {
                        error: "invalid_grant".to_string(),
                        error_description: "unknown authorization code".to_string(),
                    });
                }
            }
        }

        Ok(TokenResponse {
            access_token: "access-token-1".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: Some(300),
            c_nonce: Some("c-nonce-1".to_string()),
            c_nonce_expires_in: Some(300),
        })
    }

    async fn credential(
        &self, _endpoint: &str, access_token: &str, request: &CredentialRequest,
    ) -> Result<CredentialResponse> {
        if access_token != "access-token-1" {
            return Err(Error::CredentialRequestFailed {
                status: 401,
                body: "invalid access token".to_string(),
            });
        }
        self.inner.credential_requests.lock().expect("lock").push(request.clone());

        if self.inner.deferred.load(Ordering::SeqCst) {
            return Ok(CredentialResponse {
                response: CredentialResponseType::TransactionId { transaction_id: "t1".to_string() },
                c_nonce: None,
                c_nonce_expires_in: None,
            });
        }

        let credential = match &request.credential_type {
            CredentialRequestType::SdJwt { .. } => sample_sd_jwt_credential(),
            CredentialRequestType::Mdoc { .. } => sample_mdoc_credential(),
        };
        Ok(CredentialResponse {
            response: CredentialResponseType::Credential { credential },
            c_nonce: Some("c-nonce-2".to_string()),
            c_nonce_expires_in: Some(300),
        })
    }
}

impl StateStore for Provider {
    async fn put(
        &self, key: &str, state: impl Serialize + Send, _expiry: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let value = serde_json::to_value(state)?;
        self.inner.state.lock().expect("lock").insert(key.to_string(), value);
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let Some(value) = self.inner.state.lock().expect("lock").get(key).cloned() else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn purge(&self, key: &str) -> anyhow::Result<()> {
        self.inner.state.lock().expect("lock").remove(key);
        Ok(())
    }
}

impl CredentialStorer for Provider {
    async fn save(&self, credential: &CredentialRecord) -> anyhow::Result<()> {
        self.inner
            .credentials
            .lock()
            .expect("lock")
            .insert(credential.id().to_string(), credential.clone());
        Ok(())
    }

    async fn load(&self, id: &CredentialId) -> anyhow::Result<Option<CredentialRecord>> {
        Ok(self.inner.credentials.lock().expect("lock").get(id.as_str()).cloned())
    }

    async fn all(&self) -> anyhow::Result<Vec<CredentialRecord>> {
        Ok(self.stored_credentials())
    }

    async fn remove(&self, id: &CredentialId) -> anyhow::Result<()> {
        self.inner.credentials.lock().expect("lock").remove(id.as_str());
        Ok(())
    }
}

impl KeyService for Provider {
    async fn generate_key(&self) -> anyhow::Result<HolderKey> {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let point = signing_key.verifying_key().to_encoded_point(false);
        let jwk = PublicKeyJwk {
            kty: "EC".to_string(),
            crv: Some("P-256".to_string()),
            x: point.x().map(|x| Base64UrlUnpadded::encode_string(x)),
            y: point.y().map(|y| Base64UrlUnpadded::encode_string(y)),
        };

        let n = self.inner.key_counter.fetch_add(1, Ordering::SeqCst);
        let key_id = format!("key-{n}");
        self.inner.keys.lock().expect("lock").insert(key_id.clone(), signing_key);

        Ok(HolderKey { key_id, algorithm: Algorithm::ES256, jwk })
    }

    async fn sign(&self, key_id: &str, msg: &[u8]) -> anyhow::Result<Vec<u8>> {
        let keys = self.inner.keys.lock().expect("lock");
        let Some(key) = keys.get(key_id) else {
            anyhow::bail!("unknown key: {key_id}");
        };
        let signature: p256::ecdsa::Signature = key.sign(msg);
        Ok(signature.to_bytes().to_vec())
    }
}

impl HolderProvider for Provider {}
