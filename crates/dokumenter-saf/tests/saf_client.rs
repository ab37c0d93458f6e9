//! Integration tests for SafClient.
//!
//! Uses wiremock for both SAF and the token endpoint. Tests cover the
//! overview query, data/errors passthrough, variant fetch status mapping,
//! token failure short-circuit and transport retry.

use std::time::Duration;

use dokumenter_saf::{
    AzureConfig, BearerToken, DownstreamStatus, SafClient, SafConfig, SafError, VariantOutcome,
    VariantRef, Variantformat, SAF_USER_AGENT,
};
use url::Url;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/oauth2/v2.0/token";

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "obo-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

fn create_test_client(server: &MockServer, saf: SafConfig) -> SafClient {
    let endpoint = Url::parse(&format!("{}{}", server.uri(), TOKEN_PATH)).unwrap();
    let azure = AzureConfig::new("gateway-client", "gateway-secret", endpoint);
    SafClient::new(saf, azure).expect("failed to create client")
}

fn saf_config(server: &MockServer) -> SafConfig {
    SafConfig::new(Url::parse(&server.uri()).unwrap(), "api://saf/.default")
        .with_retry_base_delay(Duration::from_millis(1))
}

fn inbound() -> BearerToken {
    BearerToken::new("inbound-token")
}

fn arkiv(jp: &str, di: &str) -> VariantRef {
    VariantRef::new(jp, di, Variantformat::Arkiv)
}

#[tokio::test]
async fn test_list_documents_sends_query_with_delegated_credential() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer obo-token"))
        .and(header("user-agent", SAF_USER_AGENT))
        .and(header_exists("nav-callid"))
        .and(body_partial_json(serde_json::json!({
            "variables": {
                "brukerId": { "id": "12345678910", "type": "FNR" },
                "tema": ["AAP", "SYK", "SYM"],
                "foerste": 25,
                "etter": "0"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "dokumentoversiktBruker": {
                    "journalposter": [{
                        "journalpostId": "jp-1",
                        "tittel": "Vedtak",
                        "dokumenter": [{
                            "dokumentInfoId": "d-1",
                            "dokumentvarianter": [{ "variantformat": "ARKIV" }]
                        }]
                    }],
                    "sideInfo": { "finnesNesteSide": false }
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, saf_config(&server));
    let response = client
        .list_documents("12345678910", &inbound(), Some(25))
        .await
        .expect("query failed");

    assert!(response.errors().is_empty());
    let overview = response.into_overview().expect("overview");
    assert_eq!(overview.variants(), vec![arkiv("jp-1", "d-1")]);
}

#[tokio::test]
async fn test_list_documents_inbound_token_never_reaches_saf() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer inbound-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "dokumentoversiktBruker": { "journalposter": [] } }
        })))
        .mount(&server)
        .await;

    let client = create_test_client(&server, saf_config(&server));
    client
        .list_documents("12345678910", &inbound(), None)
        .await
        .expect("query failed");
}

#[tokio::test]
async fn test_list_documents_data_null_with_errors() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": null,
            "errors": [{
                "message": "Fant ikke bruker",
                "extensions": { "code": "not_found", "classification": "ExecutionAborted" }
            }]
        })))
        .mount(&server)
        .await;

    let client = create_test_client(&server, saf_config(&server));
    let response = client
        .list_documents("12345678910", &inbound(), None)
        .await
        .expect("query failed");

    assert!(response.data.is_none());
    assert_eq!(response.errors().len(), 1);
    assert_eq!(response.errors()[0].code(), Some("not_found"));
}

#[tokio::test]
async fn test_list_documents_overview_null_with_errors() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "dokumentoversiktBruker": null },
            "errors": [{
                "message": "Fant ikke bruker",
                "path": ["dokumentoversiktBruker"],
                "extensions": { "code": "not_found" }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, saf_config(&server));
    let response = client
        .list_documents("12345678910", &inbound(), None)
        .await
        .expect("query failed");

    let errors = response.into_overview().expect_err("overview should be absent");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code(), Some("not_found"));
}

#[tokio::test]
async fn test_list_documents_partial_success() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "dokumentoversiktBruker": { "journalposter": [] } },
            "errors": [{ "message": "Tilgang til dokument avvist", "path": ["dokumentoversiktBruker"] }]
        })))
        .mount(&server)
        .await;

    let client = create_test_client(&server, saf_config(&server));
    let response = client
        .list_documents("12345678910", &inbound(), None)
        .await
        .expect("query failed");

    assert!(response.is_partial());
}

#[tokio::test]
async fn test_list_documents_non_success_status() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, saf_config(&server));
    let result = client.list_documents("12345678910", &inbound(), None).await;

    assert!(matches!(
        result,
        Err(SafError::Downstream(DownstreamStatus::Forbidden))
    ));
}

#[tokio::test]
async fn test_list_documents_malformed_body() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = create_test_client(&server, saf_config(&server));
    let result = client.list_documents("12345678910", &inbound(), None).await;

    assert!(matches!(result, Err(SafError::InvalidResponse { .. })));
}

#[tokio::test]
async fn test_fetch_variant_success() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let pdf = b"%PDF-1.7 test".to_vec();
    Mock::given(method("GET"))
        .and(path("/graphql/rest/hentdokument/jp-1/d-1/ARKIV"))
        .and(header("authorization", "Bearer obo-token"))
        .and(header_exists("nav-callid"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(pdf.clone())
                .insert_header("content-type", "application/pdf")
                .insert_header("content-disposition", "inline; filename=vedtak.pdf"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, saf_config(&server));
    let outcome = client
        .fetch_variant(&arkiv("jp-1", "d-1"), &inbound())
        .await
        .expect("fetch failed");

    match outcome {
        VariantOutcome::Fetched(blob) => {
            assert_eq!(blob.data, pdf);
            assert_eq!(blob.content_type.as_deref(), Some("application/pdf"));
            assert_eq!(
                blob.content_disposition.as_deref(),
                Some("inline; filename=vedtak.pdf")
            );
        }
        other => panic!("expected Fetched, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_variant_status_mapping() {
    let cases = [
        (401, DownstreamStatus::Unauthorized),
        (403, DownstreamStatus::Forbidden),
        (404, DownstreamStatus::NotFound),
        (418, DownstreamStatus::Unrecognized(418)),
        (500, DownstreamStatus::Unrecognized(500)),
    ];

    for (code, expected) in cases {
        let server = MockServer::start().await;
        mount_token_endpoint(&server).await;

        Mock::given(method("GET"))
            .and(path("/graphql/rest/hentdokument/jp-1/d-1/ARKIV"))
            .respond_with(ResponseTemplate::new(code))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_test_client(&server, saf_config(&server));
        let outcome = client
            .fetch_variant(&arkiv("jp-1", "d-1"), &inbound())
            .await
            .expect("fetch failed");

        assert_eq!(outcome, VariantOutcome::Rejected(expected), "status {}", code);
    }
}

#[tokio::test]
async fn test_token_failure_makes_no_saf_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    Mock::given(path("/graphql"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = create_test_client(&server, saf_config(&server));

    let listed = client.list_documents("12345678910", &inbound(), None).await;
    assert!(matches!(listed, Err(SafError::TokenExchange { .. })));

    let fetched = client.fetch_variant(&arkiv("jp-1", "d-1"), &inbound()).await;
    assert!(matches!(fetched, Err(SafError::TokenExchange { .. })));
}

#[tokio::test]
async fn test_timeout_is_retried_then_reported() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/graphql/rest/hentdokument/jp-1/d-1/ARKIV"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(3)
        .mount(&server)
        .await;

    let config = saf_config(&server)
        .with_timeout(Duration::from_millis(150))
        .with_max_retries(2);
    let client = create_test_client(&server, config);

    let result = client.fetch_variant(&arkiv("jp-1", "d-1"), &inbound()).await;

    match result {
        Err(e @ SafError::Timeout { .. }) => assert!(e.is_retryable()),
        other => panic!("expected Timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_status_errors_are_not_retried() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, saf_config(&server).with_max_retries(3));
    let result = client.list_documents("12345678910", &inbound(), None).await;

    assert!(matches!(
        result,
        Err(SafError::Downstream(DownstreamStatus::Unrecognized(503)))
    ));
}

#[tokio::test]
async fn test_identifiers_are_percent_encoded() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/graphql/rest/hentdokument/jp%201/d%2F1/SLADDET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server, saf_config(&server));
    let outcome = client
        .fetch_variant(
            &VariantRef::new("jp 1", "d/1", Variantformat::Sladdet),
            &inbound(),
        )
        .await
        .expect("fetch failed");

    assert!(matches!(outcome, VariantOutcome::Fetched(_)));
}
