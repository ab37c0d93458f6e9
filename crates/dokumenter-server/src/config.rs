use dokumenter_saf::{AzureConfig, SafConfig, SafResult};

use crate::auth::AuthConfig;

/// Everything the gateway reads from the environment at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub saf: SafConfig,
    pub azure: AzureConfig,
    pub auth: AuthConfig,
}

impl GatewayConfig {
    pub fn from_env() -> SafResult<Self> {
        Ok(Self {
            saf: SafConfig::from_env()?,
            azure: AzureConfig::from_env()?,
            auth: AuthConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [(&str, &str); 7] = [
        ("SAF_HOST", "https://saf.test"),
        ("SAF_SCOPE", "api://saf/.default"),
        ("AZURE_APP_CLIENT_ID", "dokumenter"),
        ("AZURE_APP_CLIENT_SECRET", "s3cret"),
        ("AZURE_OPENID_CONFIG_TOKEN_ENDPOINT", "https://login.test/token"),
        ("AZURE_OPENID_CONFIG_ISSUER", "https://login.test/v2.0"),
        ("AZURE_OPENID_CONFIG_JWKS_URI", "https://login.test/keys"),
    ];

    #[test]
    #[serial]
    fn test_from_env_complete() {
        for (k, v) in VARS {
            std::env::set_var(k, v);
        }
        let cfg = GatewayConfig::from_env();
        for (k, _) in VARS {
            std::env::remove_var(k);
        }

        let cfg = cfg.unwrap();
        assert_eq!(cfg.auth.client_id, cfg.azure.client_id);
        assert_eq!(cfg.saf.scope, "api://saf/.default");
    }

    #[test]
    #[serial]
    fn test_each_variable_is_required() {
        for (missing, _) in VARS {
            for (k, v) in VARS {
                std::env::set_var(k, v);
            }
            std::env::remove_var(missing);

            let err = GatewayConfig::from_env().unwrap_err();
            assert!(err.to_string().contains(missing), "{}", missing);
        }
        for (k, _) in VARS {
            std::env::remove_var(k);
        }
    }
}
