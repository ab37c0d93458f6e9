//! Shared helpers: RSA test key, token minting, a counting document source.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use dokumenter_saf::{
    BearerToken, DocumentOverviewData, DocumentSource, DownstreamStatus, GraphQlResponse, PdfBlob,
    SafResult, VariantOutcome, VariantRef,
};
use dokumenter_server::auth::{AuthConfig, TokenValidator};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::{pkcs8::EncodePrivateKey, pkcs8::EncodePublicKey, RsaPrivateKey};
use tower::ServiceExt;
use url::Url;

pub const ISSUER: &str = "https://login.test/tenant/v2.0";
pub const CLIENT_ID: &str = "dokumenter-client";

struct Keys {
    private_pem: String,
    public_pem: String,
}

fn keys() -> &'static Keys {
    static KEYS: OnceLock<Keys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).expect("failed to generate key");
        Keys {
            private_pem: private
                .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
                .unwrap()
                .to_string(),
            public_pem: private
                .to_public_key()
                .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
                .unwrap(),
        }
    })
}

/// RS256 token for `aud`, signed with the test key.
pub fn token_for(aud: &str, sub: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = serde_json::json!({
        "sub": sub,
        "iss": ISSUER,
        "aud": aud,
        "exp": now + 3600,
        "iat": now,
    });
    encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &EncodingKey::from_rsa_pem(keys().private_pem.as_bytes()).unwrap(),
    )
    .unwrap()
}

pub fn valid_token() -> String {
    token_for(CLIENT_ID, "caseworker")
}

pub fn validator() -> TokenValidator {
    let config = AuthConfig::new(
        ISSUER,
        Url::parse("https://login.test/keys").unwrap(),
        CLIENT_ID,
    );
    TokenValidator::new_with_static_key(keys().public_pem.as_bytes(), config).unwrap()
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().uri(uri);
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// `dokumentoversiktBruker` data from `(journalpostId, dokumentInfoId, variantformat)`
/// triples, grouped in first-seen order.
pub fn overview_json(variants: &[(&str, &str, &str)]) -> serde_json::Value {
    let mut journalposter: Vec<serde_json::Value> = Vec::new();

    for (jp, di, variantformat) in variants {
        let entry = match journalposter
            .iter()
            .position(|e| e["journalpostId"] == *jp)
        {
            Some(i) => i,
            None => {
                journalposter.push(serde_json::json!({ "journalpostId": jp, "dokumenter": [] }));
                journalposter.len() - 1
            }
        };

        let dokumenter = journalposter[entry]["dokumenter"].as_array_mut().unwrap();
        let doc = match dokumenter.iter().position(|d| d["dokumentInfoId"] == *di) {
            Some(i) => i,
            None => {
                dokumenter.push(serde_json::json!({ "dokumentInfoId": di, "dokumentvarianter": [] }));
                dokumenter.len() - 1
            }
        };

        dokumenter[doc]["dokumentvarianter"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!({ "variantformat": variantformat }));
    }

    serde_json::json!({ "dokumentoversiktBruker": { "journalposter": journalposter } })
}

/// Counts every call; returns canned overview and per-document outcomes.
pub struct StubSource {
    pub response: GraphQlResponse<DocumentOverviewData>,
    pub rejected: HashMap<String, DownstreamStatus>,
    pub list_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub last_limit: Mutex<Option<u32>>,
    pub last_variant: Mutex<Option<VariantRef>>,
}

impl StubSource {
    pub fn new(data: Option<serde_json::Value>, errors: Option<serde_json::Value>) -> Self {
        let response = serde_json::from_value(serde_json::json!({
            "data": data,
            "errors": errors,
        }))
        .unwrap();
        Self {
            response,
            rejected: HashMap::new(),
            list_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            last_limit: Mutex::new(None),
            last_variant: Mutex::new(None),
        }
    }

    pub fn empty() -> Self {
        Self::new(Some(overview_json(&[])), None)
    }

    pub fn reject(mut self, dokument_info_id: &str, status: DownstreamStatus) -> Self {
        self.rejected.insert(dokument_info_id.to_string(), status);
        self
    }

    pub fn calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst) + self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for StubSource {
    async fn list_documents(
        &self,
        _personident: &str,
        _inbound: &BearerToken,
        limit: Option<u32>,
    ) -> SafResult<GraphQlResponse<DocumentOverviewData>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_limit.lock().unwrap() = limit;
        Ok(self.response.clone())
    }

    async fn fetch_variant(
        &self,
        variant: &VariantRef,
        _inbound: &BearerToken,
    ) -> SafResult<VariantOutcome> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_variant.lock().unwrap() = Some(variant.clone());
        if let Some(status) = self.rejected.get(&variant.dokument_info_id) {
            return Ok(VariantOutcome::Rejected(*status));
        }
        Ok(VariantOutcome::Fetched(PdfBlob {
            data: format!("pdf:{}:{}", variant.dokument_info_id, variant.variantformat).into_bytes(),
            content_type: Some("application/pdf".to_string()),
            content_disposition: Some(format!("inline; filename={}.pdf", variant.dokument_info_id)),
        }))
    }
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
