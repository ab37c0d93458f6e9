use std::time::Duration;

use dokumenter_saf::config::{parse_url, required_env};
use dokumenter_saf::SafResult;
use url::Url;

/// Key-set cache limits.
#[derive(Debug, Clone)]
pub struct JwksSettings {
    /// How long a fetched key stays cached.
    pub ttl: Duration,
    /// Upper bound on cached keys.
    pub max_keys: u64,
    /// Remote fetches allowed per `window`.
    pub max_fetches: u32,
    pub window: Duration,
    pub timeout: Duration,
}

impl Default for JwksSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_keys: 10,
            max_fetches: 10,
            window: Duration::from_secs(60),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Inbound token requirements.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub jwks_uri: Url,
    /// Client id of this gateway; `aud` must contain it.
    pub client_id: String,
    pub clock_skew_leeway: Duration,
    pub jwks: JwksSettings,
}

impl AuthConfig {
    pub fn new(issuer: impl Into<String>, jwks_uri: Url, client_id: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            jwks_uri,
            client_id: client_id.into(),
            clock_skew_leeway: Duration::from_secs(30),
            jwks: JwksSettings::default(),
        }
    }

    pub fn from_env() -> SafResult<Self> {
        let jwks_uri = parse_url(
            "AZURE_OPENID_CONFIG_JWKS_URI",
            &required_env("AZURE_OPENID_CONFIG_JWKS_URI")?,
        )?;
        let issuer = required_env("AZURE_OPENID_CONFIG_ISSUER")?;
        let client_id = required_env("AZURE_APP_CLIENT_ID")?;

        if jwks_uri.scheme() != "https" {
            tracing::warn!(uri = %jwks_uri, "JWKS URI is not HTTPS");
        }

        Ok(Self::new(issuer, jwks_uri, client_id))
    }

    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.clock_skew_leeway = leeway;
        self
    }

    pub fn with_jwks_settings(mut self, settings: JwksSettings) -> Self {
        self.jwks = settings;
        self
    }
}
