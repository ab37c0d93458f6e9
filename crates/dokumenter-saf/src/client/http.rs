//! HTTP layer: call id, secure request logging, retry, status mapping.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use std::time::Duration;

use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::auth::DelegatedCredential;
use crate::error::{SafError, SafResult};
use crate::types::{DownstreamStatus, GraphQlResponse, PdfBlob, VariantOutcome, VariantRef};

/// Correlation header SAF expects on every call.
pub(crate) const CALL_ID_HEADER: &str = "Nav-Callid";

const QUERY_PATH: &[&str] = &["graphql"];
const DOCUMENT_PATH: &[&str] = &["graphql", "rest", "hentdokument"];

const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// HTTP backend for SAF (holds the pooled reqwest client and retry policy).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) max_retries: u32,
    pub(crate) retry_base_delay: Duration,
}

impl HttpBackend {
    /// POST a GraphQL body; any non-2xx is `SafError::Downstream`.
    pub(crate) async fn query<T: DeserializeOwned>(
        &self,
        credential: &DelegatedCredential,
        body: &[u8],
    ) -> SafResult<GraphQlResponse<T>> {
        let url = self.endpoint(QUERY_PATH, &[]);
        let response = self
            .request(Method::POST, &url, credential, Some(body))
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(
                target: "secure_log",
                status = status.as_u16(),
                body = %text,
                "SAF query failed"
            );
            return Err(SafError::Downstream(DownstreamStatus::from_code(
                status.as_u16(),
            )));
        }

        let parsed: GraphQlResponse<T> =
            response
                .json()
                .await
                .map_err(|e| SafError::InvalidResponse {
                    message: format!("failed to parse GraphQL response: {}", e.without_url()),
                })?;

        if !parsed.errors().is_empty() {
            tracing::error!(
                target: "secure_log",
                errors = ?parsed.errors(),
                has_data = parsed.data.is_some(),
                "SAF response contains errors"
            );
        }

        Ok(parsed)
    }

    /// GET one variant; only `200` is `Fetched`.
    pub(crate) async fn fetch_document(
        &self,
        credential: &DelegatedCredential,
        variant: &VariantRef,
    ) -> SafResult<VariantOutcome> {
        let url = self.endpoint(
            DOCUMENT_PATH,
            &[
                &variant.journalpost_id,
                &variant.dokument_info_id,
                variant.variantformat.as_str(),
            ],
        );
        let response = self.request(Method::GET, &url, credential, None).await?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(
                target: "secure_log",
                status = status.as_u16(),
                journalpost_id = %variant.journalpost_id,
                dokument_info_id = %variant.dokument_info_id,
                variantformat = %variant.variantformat,
                body = %text,
                "SAF document fetch failed"
            );
            return Ok(VariantOutcome::Rejected(DownstreamStatus::from_code(
                status.as_u16(),
            )));
        }

        let content_type = header_string(response.headers(), CONTENT_TYPE.as_str());
        let content_disposition = header_string(response.headers(), CONTENT_DISPOSITION.as_str());
        let data = response.bytes().await?.to_vec();

        Ok(VariantOutcome::Fetched(PdfBlob {
            data,
            content_type,
            content_disposition,
        }))
    }

    /// Send with retry on transient transport failures.
    ///
    /// Never retries once the delegated credential has expired.
    async fn request(
        &self,
        method: Method,
        url: &Url,
        credential: &DelegatedCredential,
        body: Option<&[u8]>,
    ) -> SafResult<reqwest::Response> {
        use rand::Rng;

        let mut retries = 0;

        loop {
            let result = self
                .request_once(method.clone(), url, credential, body)
                .await;

            match result {
                Ok(response) => return Ok(response),
                Err(e)
                    if e.is_retryable()
                        && retries < self.max_retries
                        && !credential.is_expired() =>
                {
                    retries += 1;

                    let base_backoff = self
                        .retry_base_delay
                        .saturating_mul(1u32 << retries.min(8))
                        .min(MAX_BACKOFF);
                    let jittered_ms =
                        rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
                    let backoff = Duration::from_millis(jittered_ms.max(10));

                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying SAF request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request_once(
        &self,
        method: Method,
        url: &Url,
        credential: &DelegatedCredential,
        body: Option<&[u8]>,
    ) -> SafResult<reqwest::Response> {
        let call_id = Uuid::new_v4();

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(AUTHORIZATION, format!("Bearer {}", credential.token.expose()))
            .header(CALL_ID_HEADER, call_id.to_string());

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_vec());
        }

        debug!(target: "secure_log", call_id = %call_id, method = %method, url = %url, "SAF request");

        let response = request.send().await.map_err(|e| {
            warn!(target: "secure_log", call_id = %call_id, error = %e, "SAF request failed");
            SafError::from(e)
        })?;

        debug!(
            target: "secure_log",
            call_id = %call_id,
            status = response.status().as_u16(),
            "SAF response"
        );

        Ok(response)
    }

    /// `base_url` + fixed path + identifier segments (percent-encoded).
    fn endpoint(&self, path: &[&str], identifiers: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path).extend(identifiers);
        }
        url
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
