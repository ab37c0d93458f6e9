//! On-behalf-of token exchange.
//!
//! The caller's token is never sent to SAF. Each request to SAF carries a
//! delegated credential obtained from the identity provider's token endpoint
//! with the `jwt-bearer` grant:
//!
//! ```text
//! POST {token_endpoint}
//! grant_type=urn:ietf:params:oauth:grant-type:jwt-bearer
//! client_id=...&client_secret=...
//! assertion=<inbound token>
//! scope=<SAF scope>
//! requested_token_use=on_behalf_of
//! ```
//!
//! Credentials may be cached, keyed by the SHA-256 of the inbound token, so a
//! cached credential is only ever returned for the exact token it was issued for.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use sha2::{Digest, Sha256};

use crate::config::AzureConfig;
use crate::error::{SafError, SafResult};

const OBO_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Cached credentials are dropped this long before they expire.
const EXPIRY_BUFFER_SECS: i64 = 60;

const MAX_CACHED_CREDENTIALS: u64 = 10_000;
const CACHE_TTL: Duration = Duration::from_secs(3600);

/// A bearer token. Neither `Debug` nor `Display` prints the value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw value, for the `Authorization` header or the exchange body only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Hex SHA-256 of the token; used as cache key and in logs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Downstream-scoped token issued on behalf of one inbound token.
#[derive(Debug, Clone)]
pub struct DelegatedCredential {
    pub token: BearerToken,
    pub expires_at: DateTime<Utc>,
}

impl DelegatedCredential {
    /// Still usable for at least the expiry buffer.
    pub fn is_fresh(&self) -> bool {
        self.expires_at > Utc::now() + chrono::Duration::seconds(EXPIRY_BUFFER_SECS)
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Token endpoint success response.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    token_type: Option<String>,
}

/// Token endpoint error response (RFC 6749 §5.2).
#[derive(Debug, serde::Deserialize)]
struct TokenErrorResponse {
    error: String,
}

/// Exchanges inbound tokens for SAF-scoped delegated credentials.
#[derive(Clone)]
pub struct OboTokenProvider {
    client: reqwest::Client,
    config: AzureConfig,
    scope: String,
    cache: Option<Cache<String, DelegatedCredential>>,
}

impl fmt::Debug for OboTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OboTokenProvider")
            .field("config", &self.config)
            .field("scope", &self.scope)
            .field("cached", &self.cache.as_ref().map(|c| c.entry_count()))
            .finish()
    }
}

impl OboTokenProvider {
    pub fn new(config: AzureConfig, scope: impl Into<String>) -> SafResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| SafError::Config {
                message: format!("failed to create token endpoint client: {}", e),
            })?;

        let cache = config.cache_tokens.then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHED_CREDENTIALS)
                .time_to_live(CACHE_TTL)
                .build()
        });

        Ok(Self {
            client,
            config,
            scope: scope.into(),
            cache,
        })
    }

    /// Get a delegated credential for `inbound`, from cache when still fresh.
    ///
    /// Failures are not retried: the inbound token may be close to expiry and
    /// the caller gets a prompt upstream failure instead.
    pub async fn exchange(&self, inbound: &BearerToken) -> SafResult<DelegatedCredential> {
        let key = inbound.fingerprint();

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&key) {
                if cached.is_fresh() {
                    tracing::debug!("using cached delegated credential");
                    return Ok(cached);
                }
                cache.invalidate(&key);
            }
        }

        let credential = self.request_token(inbound).await?;

        if let Some(cache) = &self.cache {
            cache.insert(key, credential.clone());
        }

        Ok(credential)
    }

    async fn request_token(&self, inbound: &BearerToken) -> SafResult<DelegatedCredential> {
        let form = [
            ("grant_type", OBO_GRANT_TYPE),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("assertion", inbound.expose()),
            ("scope", self.scope.as_str()),
            ("requested_token_use", "on_behalf_of"),
        ];

        let response = self
            .client
            .post(self.config.token_endpoint.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| SafError::TokenExchange {
                message: format!("token endpoint unreachable: {}", e.without_url()),
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| "unparseable error body".to_string());

            tracing::error!(
                target: "secure_log",
                status = status.as_u16(),
                body = %body,
                "on-behalf-of exchange rejected"
            );

            return Err(SafError::TokenExchange {
                message: format!("HTTP {} - {}", status.as_u16(), reason),
            });
        }

        let token_response: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| SafError::TokenExchange {
                    message: format!("failed to parse token response: {}", e),
                })?;

        let expires_at = i64::try_from(token_response.expires_in)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| SafError::TokenExchange {
                message: format!(
                    "token response has out-of-range expires_in: {}",
                    token_response.expires_in
                ),
            })?;

        tracing::info!(
            expires_in = token_response.expires_in,
            token_type = token_response.token_type.as_deref().unwrap_or("Bearer"),
            "obtained delegated credential"
        );

        Ok(DelegatedCredential {
            token: BearerToken::new(token_response.access_token),
            expires_at,
        })
    }
}
