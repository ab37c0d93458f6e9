use std::sync::Arc;
use std::time::Instant;

use jsonwebtoken::DecodingKey;
use moka::sync::Cache;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use super::config::JwksSettings;
use super::AuthError;

/// 512 KiB limit for a JWKS document.
const MAX_JWKS_BYTES: usize = 512 * 1024;

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    n: Option<String>,
    e: Option<String>,
    x: Option<String>,
    y: Option<String>,
}

impl Jwk {
    fn decoding_key(&self) -> Option<DecodingKey> {
        match self.kty.as_str() {
            "RSA" => {
                let (n, e) = (self.n.as_deref()?, self.e.as_deref()?);
                DecodingKey::from_rsa_components(n, e).ok()
            }
            "EC" => {
                let (x, y) = (self.x.as_deref()?, self.y.as_deref()?);
                DecodingKey::from_ec_components(x, y).ok()
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// Fetches allowed in the current rate-limit window.
#[derive(Debug)]
struct RefreshWindow {
    started: Instant,
    fetches: u32,
}

impl RefreshWindow {
    fn try_acquire(&mut self, settings: &JwksSettings) -> bool {
        if self.started.elapsed() >= settings.window {
            self.started = Instant::now();
            self.fetches = 0;
        }
        if self.fetches >= settings.max_fetches {
            return false;
        }
        self.fetches += 1;
        true
    }
}

/// Remote key set, cached by `kid`.
///
/// Misses serialize on one refresh gate and re-check the cache once they
/// hold it, so concurrent misses never exceed the fetch budget.
#[derive(Clone)]
pub struct JwksProvider {
    cache: Cache<String, Arc<DecodingKey>>,
    client: Client,
    jwks_uri: Url,
    settings: JwksSettings,
    gate: Arc<Mutex<RefreshWindow>>,
}

impl JwksProvider {
    pub fn new(jwks_uri: Url, settings: JwksSettings) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("dokumenter/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::KeyUnavailable(format!("failed to build JWKS client: {}", e)))?;

        Ok(Self {
            cache: Cache::builder()
                .max_capacity(settings.max_keys)
                .time_to_live(settings.ttl)
                .build(),
            client,
            jwks_uri,
            gate: Arc::new(Mutex::new(RefreshWindow {
                started: Instant::now(),
                fetches: 0,
            })),
            settings,
        })
    }

    pub async fn get_key(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        if let Some(key) = self.cache.get(kid) {
            return Ok(key);
        }

        let mut window = self.gate.lock().await;

        // Another task may have refreshed while we waited.
        if let Some(key) = self.cache.get(kid) {
            return Ok(key);
        }

        if !window.try_acquire(&self.settings) {
            tracing::warn!(event = "jwks_rate_limited", kid = %kid);
            return Err(AuthError::KeyUnavailable(
                "JWKS refresh rate limit exceeded".to_string(),
            ));
        }

        self.refresh().await?;
        drop(window);

        self.cache
            .get(kid)
            .ok_or_else(|| AuthError::KeyUnavailable(format!("no key for kid {}", kid)))
    }

    async fn refresh(&self) -> Result<(), AuthError> {
        tracing::info!(event = "jwks_refresh", uri = %self.jwks_uri);

        let resp = self
            .client
            .get(self.jwks_uri.clone())
            .send()
            .await
            .map_err(|e| AuthError::KeyUnavailable(format!("JWKS fetch failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(AuthError::KeyUnavailable(format!(
                "JWKS endpoint returned HTTP {}",
                resp.status().as_u16()
            )));
        }

        if resp.content_length().is_some_and(|len| len > MAX_JWKS_BYTES as u64) {
            return Err(AuthError::KeyUnavailable("JWKS response too large".to_string()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| AuthError::KeyUnavailable(format!("JWKS read failed: {}", e)))?;
        if body.len() > MAX_JWKS_BYTES {
            return Err(AuthError::KeyUnavailable("JWKS response too large".to_string()));
        }

        let jwks: JwksResponse = serde_json::from_slice(&body)
            .map_err(|e| AuthError::KeyUnavailable(format!("failed to parse JWKS: {}", e)))?;

        let mut loaded = 0usize;
        for jwk in &jwks.keys {
            let (Some(kid), Some(key)) = (jwk.kid.as_ref(), jwk.decoding_key()) else {
                tracing::debug!(kty = %jwk.kty, "skipping unusable JWK");
                continue;
            };
            self.cache.insert(kid.clone(), Arc::new(key));
            loaded += 1;
        }

        tracing::info!(event = "jwks_loaded", keys = loaded);
        Ok(())
    }
}
