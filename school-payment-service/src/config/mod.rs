use secrecy::{ExposeSecret, Secret};
use service_core::config::{self as core_config, get_env, get_env_parsed, Environment};
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub gateway: GatewayConfig,
    pub school: SchoolConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: Secret<String>,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub expiry_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Sandbox,
    Production,
}

impl std::str::FromStr for GatewayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "sandbox" => Ok(GatewayMode::Sandbox),
            "production" | "prod" => Ok(GatewayMode::Production),
            other => Err(format!("Invalid PAYMENT_ENV: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub mode: GatewayMode,
    /// Collect-request endpoint for the selected mode.
    pub url: String,
    /// Merchant key issued by the gateway, sent inside the signed payload.
    pub pg_key: String,
    /// Shared secret used to sign the collect payload.
    pub api_key: Secret<String>,
    /// Label stored on every order.
    pub gateway_name: String,
}

#[derive(Debug, Clone)]
pub struct SchoolConfig {
    pub school_id: String,
    pub trustee_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub auth_attempts: u32,
    pub auth_window_seconds: u64,
}

impl PaymentConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let environment = Environment::from_env()?;
        let is_prod = environment.is_prod();

        let mode: GatewayMode = get_env("PAYMENT_ENV", Some("sandbox"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let url = match mode {
            GatewayMode::Sandbox => get_env("PAYMENT_GATEWAY_SANDBOX", None, is_prod)?,
            GatewayMode::Production => get_env("PAYMENT_GATEWAY_PROD", None, is_prod)?,
        };

        let expiry_raw = get_env("JWT_EXPIRY", Some("1h"), is_prod)?;
        let expiry_seconds = parse_expiry(&expiry_raw)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("JWT_EXPIRY: {}", e)))?;

        let config = PaymentConfig {
            common,
            environment,
            service_name: get_env("SERVICE_NAME", Some("school-payment-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            mongodb: MongoConfig {
                uri: Secret::new(get_env("MONGODB_URI", None, is_prod)?),
                database: get_env("MONGODB_DATABASE", Some("school_payments"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: Secret::new(get_env("JWT_SECRET", None, is_prod)?),
                expiry_seconds,
            },
            gateway: GatewayConfig {
                mode,
                url,
                pg_key: get_env("PG_KEY", None, is_prod)?,
                api_key: Secret::new(get_env("PAYMENT_API_KEY", None, is_prod)?),
                gateway_name: get_env("GATEWAY_NAME", Some("EduVanz"), is_prod)?,
            },
            school: SchoolConfig {
                school_id: get_env("SCHOOL_ID", None, is_prod)?,
                trustee_id: env::var("TRUSTEE_ID").ok().filter(|s| !s.is_empty()),
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:5173"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
            rate_limit: RateLimitConfig {
                auth_attempts: get_env_parsed("RATE_LIMIT_AUTH_ATTEMPTS", Some("10"), is_prod)?,
                auth_window_seconds: get_env_parsed(
                    "RATE_LIMIT_AUTH_WINDOW_SECONDS",
                    Some("60"),
                    is_prod,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must not be empty"
            )));
        }

        if self.jwt.expiry_seconds <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_EXPIRY must be positive"
            )));
        }

        if self.gateway.api_key.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PAYMENT_API_KEY must not be empty"
            )));
        }

        match reqwest::Url::parse(&self.gateway.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Payment gateway URL '{}' is not a valid http(s) URL",
                    self.gateway.url
                )))
            }
        }

        if self.school.school_id.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SCHOOL_ID must not be empty"
            )));
        }

        if self.environment.is_prod() {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.gateway.mode == GatewayMode::Sandbox {
                tracing::warn!("Running in production against the sandbox payment gateway");
            }
        }

        Ok(())
    }
}

/// Parse a token lifetime such as `3600`, `45s`, `30m`, `1h` or `7d` into seconds.
pub fn parse_expiry(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty duration".to_string());
    }

    let (digits, multiplier) = match raw.char_indices().last() {
        Some((idx, 's')) => (&raw[..idx], 1),
        Some((idx, 'm')) => (&raw[..idx], 60),
        Some((idx, 'h')) => (&raw[..idx], 60 * 60),
        Some((idx, 'd')) => (&raw[..idx], 24 * 60 * 60),
        _ => (raw, 1),
    };

    let value: i64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration '{}'", raw))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("duration '{}' is too large", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PaymentConfig {
        PaymentConfig {
            common: core_config::Config { port: 8080 },
            environment: Environment::Dev,
            service_name: "school-payment-service".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            mongodb: MongoConfig {
                uri: Secret::new("mongodb://localhost:27017".to_string()),
                database: "school_payments".to_string(),
            },
            jwt: JwtConfig {
                secret: Secret::new("secret".to_string()),
                expiry_seconds: 3600,
            },
            gateway: GatewayConfig {
                mode: GatewayMode::Sandbox,
                url: "https://sandbox.example.com/create-collect-request".to_string(),
                pg_key: "pg-key".to_string(),
                api_key: Secret::new("api-key".to_string()),
                gateway_name: "EduVanz".to_string(),
            },
            school: SchoolConfig {
                school_id: "school-1".to_string(),
                trustee_id: None,
            },
            security: SecurityConfig {
                allowed_origins: vec!["*".to_string()],
            },
            rate_limit: RateLimitConfig {
                auth_attempts: 10,
                auth_window_seconds: 60,
            },
        }
    }

    #[test]
    fn parse_expiry_units() {
        assert_eq!(parse_expiry("3600"), Ok(3600));
        assert_eq!(parse_expiry("45s"), Ok(45));
        assert_eq!(parse_expiry("30m"), Ok(1800));
        assert_eq!(parse_expiry("1h"), Ok(3600));
        assert_eq!(parse_expiry("7d"), Ok(604_800));
        assert!(parse_expiry("").is_err());
        assert!(parse_expiry("h").is_err());
        assert!(parse_expiry("soon").is_err());
    }

    #[test]
    fn gateway_mode_parsing() {
        assert_eq!("production".parse::<GatewayMode>(), Ok(GatewayMode::Production));
        assert_eq!("Sandbox".parse::<GatewayMode>(), Ok(GatewayMode::Sandbox));
        assert!("live".parse::<GatewayMode>().is_err());
    }

    #[test]
    fn wildcard_origin_allowed_in_dev_only() {
        let mut config = valid_config();
        assert!(config.validate().is_ok());

        config.environment = Environment::Prod;
        assert!(config.validate().is_err());

        config.security.allowed_origins = vec!["https://fees.example.com".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn gateway_url_must_be_http() {
        let mut config = valid_config();
        config.gateway.url = "ftp://gateway".to_string();
        assert!(config.validate().is_err());

        config.gateway.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_secrets_are_rejected() {
        let mut config = valid_config();
        config.jwt.secret = Secret::new(String::new());
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.gateway.api_key = Secret::new(String::new());
        assert!(config.validate().is_err());
    }
}
