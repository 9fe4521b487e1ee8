//! Tests for the issuance flows: issuer-initiated pre-authorized issuance
//! and the authorization code flow with PAR and PKCE.

mod provider;

use base64ct::{Base64UrlUnpadded, Encoding};
use oid4vc_holder::core::pkce;
use oid4vc_holder::credential::{CredentialRecord, CredentialState};
use oid4vc_holder::issuance::{
    accept_offer, initiate_auth_flow, request_credential, resolve_offer, AcceptRequest,
    AuthFlowSession, AuthorizeRequest, ClientOptions, IssuanceSession, OfferRequest,
};
use oid4vc_holder::provider::StateStore;
use oid4vc_holder::types::{
    CredentialOfferMetadata, CredentialRequestType, TokenGrantType,
};
use oid4vc_holder::Error;
use provider::{Provider, AUTH_CODE, CREDENTIAL_ISSUER, PRE_AUTH_CODE, REQUEST_URI};

fn offer_uri(configuration_id: &str, grants: serde_json::Value) -> String {
    let offer = serde_json::json!({
        "credential_issuer": CREDENTIAL_ISSUER,
        "credential_configuration_ids": [configuration_id],
        "grants": grants,
    });
    format!(
        "openid-credential-offer://?credential_offer={}",
        urlencoding::encode(&offer.to_string())
    )
}

fn pre_auth_grants() -> serde_json::Value {
    serde_json::json!({
        "urn:ietf:params:oauth:grant-type:pre-authorized_code": {
            "pre-authorized_code": PRE_AUTH_CODE,
        }
    })
}

async fn resolved(provider: &Provider, uri: &str) -> CredentialOfferMetadata {
    resolve_offer(provider, &OfferRequest { uri: uri.to_string(), locale: None })
        .await
        .expect("should resolve offer")
}

// Pre-authorized issuance of an SD-JWT credential: one active record with
// the offered vct ends up in storage.
#[tokio::test]
async fn preauth_sd_jwt() {
    let provider = Provider::new();
    let offer = resolved(&provider, &offer_uri("EU_PID", pre_auth_grants())).await;

    let record = accept_offer(&provider, &AcceptRequest { offer, tx_code: None })
        .await
        .expect("should accept offer");

    let stored = provider.stored_credentials();
    assert_eq!(stored.len(), 1);
    let CredentialRecord::SdJwt(credential) = &stored[0] else {
        panic!("expected an SD-JWT record");
    };
    assert_eq!(credential.vct.as_str(), "EU.PID");
    assert_eq!(credential.state, CredentialState::Active);
    assert_eq!(credential.id, *record.id());
    assert_eq!(credential.disclosures.len(), 1);
    // display metadata travels with the record
    let displays = credential.displays.as_ref().expect("should carry displays");
    assert_eq!(displays[0].name.as_deref(), Some("Identity Card"));

    // the token request used the pre-authorized grant, anonymously
    let token_requests = provider.token_requests();
    assert_eq!(token_requests.len(), 1);
    assert_eq!(token_requests[0].client_id, None);
    assert!(matches!(
        &token_requests[0].grant,
        TokenGrantType::PreAuthorizedCode { pre_authorized_code, tx_code: None }
            if pre_authorized_code == PRE_AUTH_CODE
    ));

    // the proof-of-possession JWT carries the c_nonce
    let credential_requests = provider.credential_requests();
    assert_eq!(credential_requests.len(), 1);
    let jwt = &credential_requests[0].proof.jwt;
    let payload = jwt.split('.').nth(1).expect("should have payload");
    let claims: serde_json::Value =
        serde_json::from_slice(&Base64UrlUnpadded::decode_vec(payload).expect("should decode"))
            .expect("should parse");
    assert_eq!(claims["nonce"], "c-nonce-1");
    assert_eq!(claims["aud"], CREDENTIAL_ISSUER);
}

// Only the first configuration is issued on the pre-authorized path.
#[tokio::test]
async fn preauth_uses_first_configuration() {
    let provider = Provider::new();
    let offer_json = serde_json::json!({
        "credential_issuer": CREDENTIAL_ISSUER,
        "credential_configuration_ids": ["EU_PID", "org.iso.18013.5.1.mDL"],
        "grants": pre_auth_grants(),
    });
    let uri = format!(
        "openid-credential-offer://?credential_offer={}",
        urlencoding::encode(&offer_json.to_string())
    );
    let offer = resolved(&provider, &uri).await;

    accept_offer(&provider, &AcceptRequest { offer, tx_code: None })
        .await
        .expect("should accept offer");

    let requests = provider.credential_requests();
    assert_eq!(requests.len(), 1);
    assert!(matches!(&requests[0].credential_type, CredentialRequestType::SdJwt { vct } if vct == "EU.PID"));
}

// A transaction code mismatch surfaces the server's error and stores
// nothing.
#[tokio::test]
async fn preauth_wrong_tx_code() {
    let provider = Provider::with_tx_code("1234");
    let offer = resolved(&provider, &offer_uri("EU_PID", pre_auth_grants())).await;

    let err = accept_offer(&provider, &AcceptRequest { offer, tx_code: Some("9999".into()) })
        .await
        .expect_err("should reject wrong transaction code");

    let Error::TokenExchangeFailed { error, error_description } = err else {
        panic!("expected TokenExchangeFailed, got {err}");
    };
    assert_eq!(error, "invalid_grant");
    assert_eq!(error_description, "transaction code mismatch");
    assert!(provider.stored_credentials().is_empty());
}

// Deferred issuance is surfaced as a typed failure and nothing is
// persisted.
#[tokio::test]
async fn deferred_issuance_not_supported() {
    let provider = Provider::new().deferred();
    let offer = resolved(&provider, &offer_uri("EU_PID", pre_auth_grants())).await;

    let err = accept_offer(&provider, &AcceptRequest { offer, tx_code: None })
        .await
        .expect_err("should refuse deferred issuance");

    assert!(matches!(err, Error::DeferredIssuanceNotSupported(id) if id == "t1"));
    assert!(provider.stored_credentials().is_empty());
}

// Authorization code flow for an mdoc: PAR, session persistence, token
// exchange and a stored record with the offered doctype.
#[tokio::test]
async fn auth_code_mdoc() {
    let provider = Provider::new();
    let uri = offer_uri("org.iso.18013.5.1.mDL", serde_json::json!({"authorization_code": {}}));
    let offer = resolved(&provider, &uri).await;

    let client = ClientOptions {
        client_id: "wallet-client".to_string(),
        redirect_uri: "https://wallet.example.com/cb".to_string(),
    };
    let flow = initiate_auth_flow(&provider, &AuthorizeRequest { offer, client })
        .await
        .expect("should initiate flow");

    // the browser URL points at the authorization endpoint with the pushed
    // request reference
    assert!(flow
        .authorization_url
        .starts_with(&format!("{CREDENTIAL_ISSUER}/authorize?client_id=wallet-client&request_uri=")));
    let encoded = flow.authorization_url.split("request_uri=").nth(1).expect("should have param");
    assert_eq!(urlencoding::decode(encoded).expect("should decode"), REQUEST_URI);

    // exactly one session, keyed by the id sent as `state`
    let pars = provider.par_requests();
    assert_eq!(pars.len(), 1);
    assert_eq!(pars[0].state, flow.session_id);
    assert_eq!(pars[0].code_challenge_method, "S256");
    let session: AuthFlowSession = StateStore::get(&provider, &flow.session_id)
        .await
        .expect("should read store")
        .expect("session should exist");
    assert_eq!(pkce::code_challenge(&session.pkce.verifier), pars[0].code_challenge);
    assert_eq!(pars[0].code_challenge, session.pkce.challenge);
    assert_eq!(pars[0].redirect_uri, format!("https://wallet.example.com/cb?session={}", flow.session_id));

    // authorization details describe the offered mdoc
    let details: serde_json::Value =
        serde_json::from_str(&pars[0].authorization_details).expect("should parse");
    assert_eq!(details[0]["type"], "openid_credential");
    assert_eq!(details[0]["doctype"], "org.iso.18013.5.1.mDL");
    assert!(details[0]["vct"].is_null());
    assert_eq!(pars[0].scope.as_deref(), Some("mdl"));

    // resume with the redirect's code
    let records = request_credential(
        &provider,
        &IssuanceSession { session_id: flow.session_id.clone(), code: AUTH_CODE.to_string() },
    )
    .await
    .expect("should issue credential");

    assert_eq!(records.len(), 1);
    let CredentialRecord::Mdoc(credential) = &records[0] else {
        panic!("expected an mdoc record");
    };
    assert_eq!(credential.doc_type.as_str(), "org.iso.18013.5.1.mDL");
    assert_eq!(credential.state, CredentialState::Active);
    assert_eq!(provider.stored_credentials().len(), 1);

    // the token exchange used the verifier and session-bound redirect uri
    let tokens = provider.token_requests();
    assert_eq!(tokens.len(), 1);
    let TokenGrantType::AuthorizationCode { code, code_verifier, redirect_uri } =
        &tokens[0].grant
    else {
        panic!("expected authorization code grant");
    };
    assert_eq!(code, AUTH_CODE);
    assert_eq!(code_verifier, &session.pkce.verifier);
    assert_eq!(redirect_uri, &session.redirect_uri());

    // the session is gone once records are committed
    let gone: Option<AuthFlowSession> =
        StateStore::get(&provider, &flow.session_id).await.expect("should read store");
    assert!(gone.is_none());

    // a second resume finds no session
    let err = request_credential(
        &provider,
        &IssuanceSession { session_id: flow.session_id.clone(), code: AUTH_CODE.to_string() },
    )
    .await
    .expect_err("should fail after completion");
    assert!(matches!(err, Error::SessionNotFound(id) if id == flow.session_id));
}

// An offer referencing an unknown configuration is rejected with a reason
// naming the id.
#[tokio::test]
async fn offer_with_unknown_configuration() {
    let provider = Provider::new();
    let uri = offer_uri("NotAConfig", pre_auth_grants());

    let err = resolve_offer(&provider, &OfferRequest { uri, locale: None })
        .await
        .expect_err("should reject unknown configuration");

    let Error::OfferMalformed(reasons) = err else {
        panic!("expected OfferMalformed, got {err}");
    };
    assert!(reasons[0].contains("NotAConfig"));
}

// An offer without any decodable grant is rejected.
#[tokio::test]
async fn offer_without_grants() {
    let provider = Provider::new();
    let offer_json = serde_json::json!({
        "credential_issuer": CREDENTIAL_ISSUER,
        "credential_configuration_ids": ["EU_PID"],
    });
    let uri = format!(
        "openid-credential-offer://?credential_offer={}",
        urlencoding::encode(&offer_json.to_string())
    );

    let err = resolve_offer(&provider, &OfferRequest { uri, locale: None })
        .await
        .expect_err("should reject offer without grants");
    assert!(matches!(err, Error::OfferMalformed(_)));
}
