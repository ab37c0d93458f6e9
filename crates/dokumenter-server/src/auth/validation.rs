use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dokumenter_saf::BearerToken;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::config::AuthConfig;
use super::jwks::JwksProvider;
use super::{AuthError, IdentityContext};

const FORBIDDEN_HEADERS: [&str; 4] = ["jku", "jwk", "x5u", "x5c"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Option<String>,
    pub iss: Option<String>,
    pub aud: Option<serde_json::Value>, // string or array
    pub exp: u64,
    pub nbf: Option<u64>,
    pub iat: Option<u64>,
    /// Object id of the caller in the identity provider.
    pub oid: Option<String>,
    #[serde(rename = "NAVident")]
    pub nav_ident: Option<String>,
}

pub struct TokenValidator {
    jwks: Option<JwksProvider>,
    static_key: Option<Arc<DecodingKey>>,
    config: AuthConfig,
}

impl TokenValidator {
    pub fn new(jwks: JwksProvider, config: AuthConfig) -> Self {
        Self {
            jwks: Some(jwks),
            static_key: None,
            config,
        }
    }

    /// Validate against one RSA public key instead of a remote key set.
    pub fn new_with_static_key(key_pem: &[u8], config: AuthConfig) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(key_pem)
            .map_err(|e| AuthError::KeyUnavailable(format!("invalid RSA PEM: {}", e)))?;

        Ok(Self {
            jwks: None,
            static_key: Some(Arc::new(key)),
            config,
        })
    }

    pub fn from_config(config: AuthConfig) -> Result<Self, AuthError> {
        let jwks = JwksProvider::new(config.jwks_uri.clone(), config.jwks.clone())?;
        Ok(Self::new(jwks, config))
    }

    pub async fn validate(&self, token: &str) -> Result<IdentityContext, AuthError> {
        // Checked on the raw JSON: `Header` drops fields it does not know.
        let mut parts = token.split('.');
        let (Some(raw_header), Some(_), Some(_), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Malformed("invalid JWT format".to_string()));
        };

        let header_json = URL_SAFE_NO_PAD
            .decode(raw_header)
            .map_err(|_| AuthError::Malformed("header is not base64url".to_string()))?;
        let header_value: serde_json::Value = serde_json::from_slice(&header_json)
            .map_err(|_| AuthError::Malformed("header is not JSON".to_string()))?;

        if let Some(obj) = header_value.as_object() {
            if obj.contains_key("crit") {
                return Err(AuthError::Rejected(
                    "token contains critical extensions".to_string(),
                ));
            }
            if FORBIDDEN_HEADERS.iter().any(|h| obj.contains_key(*h)) {
                return Err(AuthError::Rejected(
                    "token contains dangerous headers (jku, jwk, x5u, x5c)".to_string(),
                ));
            }
        }

        let header =
            decode_header(token).map_err(|e| AuthError::Malformed(format!("header: {}", e)))?;

        match header.alg {
            Algorithm::RS256 | Algorithm::ES256 => {}
            other => {
                return Err(AuthError::Rejected(format!(
                    "algorithm {:?} not allowed (only RS256, ES256)",
                    other
                )))
            }
        }

        if let Some(typ) = &header.typ {
            let t = typ.to_ascii_lowercase();
            if t != "jwt" && t != "at+jwt" && t != "application/at+jwt" {
                return Err(AuthError::Rejected(format!("token type '{}' not accepted", typ)));
            }
        }

        let key = match (&self.static_key, &self.jwks) {
            (Some(key), _) => key.clone(),
            (None, Some(provider)) => {
                let kid = header
                    .kid
                    .as_deref()
                    .ok_or_else(|| AuthError::Rejected("missing kid".to_string()))?;
                provider.get_key(kid).await?
            }
            (None, None) => {
                return Err(AuthError::KeyUnavailable(
                    "no signing keys configured".to_string(),
                ))
            }
        };

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.config.clock_skew_leeway.as_secs();
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_audience(&[self.config.client_id.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let data = decode::<Claims>(token, &key, &validation)
            .map_err(|e| AuthError::Rejected(e.to_string()))?;

        Ok(IdentityContext {
            claims: data.claims,
            token: BearerToken::new(token),
        })
    }
}
