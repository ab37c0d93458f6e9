//! SAF client.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::auth::{BearerToken, OboTokenProvider};
use crate::config::{AzureConfig, SafConfig};
use crate::error::{SafError, SafResult};
use crate::query::dokumentoversikt_request;
use crate::source::DocumentSource;
use crate::types::{DocumentOverviewData, GraphQlResponse, VariantOutcome, VariantRef};

mod http;

use http::HttpBackend;

pub const SAF_USER_AGENT: &str = concat!("dokumenter-saf/", env!("CARGO_PKG_VERSION"));

/// Client for SAF. Every call exchanges the caller's token first.
#[derive(Debug, Clone)]
pub struct SafClient {
    http: HttpBackend,
    tokens: OboTokenProvider,
    pdf_concurrency: usize,
}

impl SafClient {
    pub fn new(config: SafConfig, azure: AzureConfig) -> SafResult<Self> {
        let tokens = OboTokenProvider::new(azure, config.scope.clone())?;
        Self::with_token_provider(config, tokens)
    }

    pub fn with_token_provider(config: SafConfig, tokens: OboTokenProvider) -> SafResult<Self> {
        if config.host.cannot_be_a_base() || !matches!(config.host.scheme(), "http" | "https") {
            return Err(SafError::Config {
                message: format!("SAF host must be an http(s) URL: {}", config.host),
            });
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(SAF_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| SafError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend {
                client,
                base_url: config.host,
                max_retries: config.max_retries,
                retry_base_delay: config.retry_base_delay,
            },
            tokens,
            pdf_concurrency: config.pdf_concurrency,
        })
    }

    pub fn from_env() -> SafResult<Self> {
        Self::new(SafConfig::from_env()?, AzureConfig::from_env()?)
    }

    /// Configured concurrency for PDF aggregation.
    pub fn pdf_concurrency(&self) -> usize {
        self.pdf_concurrency
    }

    /// Run `dokumentoversiktBruker` for `personident`.
    ///
    /// Returns `data` and `errors` exactly as SAF reported them; deciding what
    /// a data-less response means is up to the caller.
    pub async fn list_documents(
        &self,
        personident: &str,
        inbound: &BearerToken,
        limit: Option<u32>,
    ) -> SafResult<GraphQlResponse<DocumentOverviewData>> {
        let credential = self.tokens.exchange(inbound).await?;

        let body = serde_json::to_vec(&dokumentoversikt_request(personident, limit)).map_err(
            |e| SafError::InvalidResponse {
                message: format!("failed to encode query: {}", e),
            },
        )?;

        debug!(limit = ?limit, "querying document overview");
        self.http.query(&credential, &body).await
    }

    /// Fetch one variant. Statuses other than 200 come back as `Rejected`.
    pub async fn fetch_variant(
        &self,
        variant: &VariantRef,
        inbound: &BearerToken,
    ) -> SafResult<VariantOutcome> {
        let credential = self.tokens.exchange(inbound).await?;

        debug!(
            journalpost_id = %variant.journalpost_id,
            dokument_info_id = %variant.dokument_info_id,
            variantformat = %variant.variantformat,
            "fetching document variant"
        );
        self.http.fetch_document(&credential, variant).await
    }
}

#[async_trait]
impl DocumentSource for SafClient {
    async fn list_documents(
        &self,
        personident: &str,
        inbound: &BearerToken,
        limit: Option<u32>,
    ) -> SafResult<GraphQlResponse<DocumentOverviewData>> {
        SafClient::list_documents(self, personident, inbound, limit).await
    }

    async fn fetch_variant(
        &self,
        variant: &VariantRef,
        inbound: &BearerToken,
    ) -> SafResult<VariantOutcome> {
        SafClient::fetch_variant(self, variant, inbound).await
    }
}
