//! Application configuration from environment variables.
//!
//! Load configuration using `Config::from_env()` after calling `dotenvy::dotenv()`.

/// Default address the HTTP server listens on
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Default renewal credential lifetime in days
const DEFAULT_RENEWAL_TTL_DAYS: i64 = 7;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on
    /// Example: 0.0.0.0:8080
    pub bind_addr: String,

    /// Renewal credential lifetime in days
    pub renewal_ttl_days: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    /// Unset or unparseable variables fall back to defaults; the JWT
    /// variables are read separately by `JwtConfig::from_env`.
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let renewal_ttl_days = std::env::var("REFRESH_TOKEN_EXPIRATION_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RENEWAL_TTL_DAYS);

        Self {
            bind_addr,
            renewal_ttl_days,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Config Struct Tests (no env var dependencies - thread safe)
    // ========================================================================

    #[test]
    fn test_config_with_all_fields() {
        let config = Config {
            bind_addr: "0.0.0.0:8080".to_string(),
            renewal_ttl_days: 30,
        };

        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.renewal_ttl_days, 30);
    }

    #[test]
    fn test_config_from_env_returns_config() {
        // Just verify from_env() returns a Config without errors
        // Actual values depend on environment, so we don't assert specific values
        let config = Config::from_env();

        assert!(!config.bind_addr.is_empty());
    }

    #[test]
    fn test_config_default_calls_from_env() {
        // Default implementation calls from_env()
        let config = Config::default();

        assert!(!config.bind_addr.is_empty());
    }

    #[test]
    fn test_config_clone() {
        let config = Config {
            bind_addr: "127.0.0.1:4000".to_string(),
            renewal_ttl_days: 14,
        };

        let cloned = config.clone();

        assert_eq!(config.bind_addr, cloned.bind_addr);
        assert_eq!(config.renewal_ttl_days, cloned.renewal_ttl_days);
    }

    #[test]
    fn test_config_debug() {
        let config = Config {
            bind_addr: "127.0.0.1:3000".to_string(),
            renewal_ttl_days: 7,
        };

        let debug_str = format!("{:?}", config);

        assert!(debug_str.contains("Config"));
        assert!(debug_str.contains("bind_addr"));
        assert!(debug_str.contains("127.0.0.1:3000"));
    }
}
