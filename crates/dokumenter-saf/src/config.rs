//! SAF and identity-provider configuration.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{SafError, SafResult};

const DEFAULT_SAF_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_PDF_CONCURRENCY: usize = 4;

/// Downstream SAF settings.
#[derive(Debug, Clone)]
pub struct SafConfig {
    /// Base URL of SAF (e.g. `https://saf.intern.nav.no`).
    pub host: Url,

    /// Scope requested in the on-behalf-of exchange (e.g. `api://prod-fss.teamdokumenthandtering.saf/.default`).
    pub scope: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Maximum retries for transient transport failures.
    pub max_retries: u32,

    /// Base delay of the exponential retry backoff.
    pub retry_base_delay: Duration,

    /// Concurrent variant fetches when aggregating all PDFs for a citizen.
    pub pdf_concurrency: usize,
}

impl SafConfig {
    pub fn new(host: Url, scope: impl Into<String>) -> Self {
        Self {
            host,
            scope: scope.into(),
            timeout: DEFAULT_SAF_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            pdf_concurrency: DEFAULT_PDF_CONCURRENCY,
        }
    }

    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `SAF_HOST` | SAF base URL (required) |
    /// | `SAF_SCOPE` | OBO scope (required) |
    /// | `DOKUMENTER_SAF_TIMEOUT` | Timeout in seconds |
    /// | `DOKUMENTER_SAF_MAX_RETRIES` | Transport retries |
    /// | `DOKUMENTER_PDF_CONCURRENCY` | Concurrent PDF fetches |
    pub fn from_env() -> SafResult<Self> {
        let host = parse_url("SAF_HOST", &required_env("SAF_HOST")?)?;
        let mut cfg = Self::new(host, required_env("SAF_SCOPE")?);

        if let Some(secs) = parsed_env::<u64>("DOKUMENTER_SAF_TIMEOUT") {
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parsed_env("DOKUMENTER_SAF_MAX_RETRIES") {
            cfg.max_retries = retries;
        }
        if let Some(n) = parsed_env::<usize>("DOKUMENTER_PDF_CONCURRENCY") {
            cfg = cfg.with_pdf_concurrency(n);
        }
        Ok(cfg)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Zero is clamped to one.
    pub fn with_pdf_concurrency(mut self, n: usize) -> Self {
        self.pdf_concurrency = n.max(1);
        self
    }
}

/// Identity-provider settings for the on-behalf-of exchange.
#[derive(Clone)]
pub struct AzureConfig {
    /// Client id of this gateway.
    pub client_id: String,

    /// Client secret of this gateway. Redacted in `Debug`.
    pub client_secret: String,

    /// Token endpoint of the identity provider.
    pub token_endpoint: Url,

    /// Timeout for the exchange request.
    pub timeout: Duration,

    /// Cache delegated credentials per inbound token until shortly before expiry.
    pub cache_tokens: bool,
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("token_endpoint", &self.token_endpoint.as_str())
            .field("timeout", &self.timeout)
            .field("cache_tokens", &self.cache_tokens)
            .finish()
    }
}

impl AzureConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_endpoint: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_endpoint,
            timeout: DEFAULT_TOKEN_TIMEOUT,
            cache_tokens: true,
        }
    }

    /// Create config from the `AZURE_*` variables injected by the platform.
    pub fn from_env() -> SafResult<Self> {
        let endpoint = required_env("AZURE_OPENID_CONFIG_TOKEN_ENDPOINT")?;
        let mut cfg = Self::new(
            required_env("AZURE_APP_CLIENT_ID")?,
            required_env("AZURE_APP_CLIENT_SECRET")?,
            parse_url("AZURE_OPENID_CONFIG_TOKEN_ENDPOINT", &endpoint)?,
        );

        if let Ok(v) = std::env::var("DOKUMENTER_OBO_CACHE") {
            cfg.cache_tokens = !(v == "0" || v.eq_ignore_ascii_case("false"));
        }
        Ok(cfg)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_tokens(mut self, enabled: bool) -> Self {
        self.cache_tokens = enabled;
        self
    }
}

/// Read a variable that must be present and non-empty.
pub fn required_env(name: &str) -> SafResult<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SafError::Config {
            message: format!("{} not set", name),
        }),
    }
}

pub fn parse_url(name: &str, value: &str) -> SafResult<Url> {
    Url::parse(value).map_err(|e| SafError::Config {
        message: format!("{} is not a valid URL: {}", name, e),
    })
}

fn parsed_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
