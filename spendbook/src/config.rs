//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `SPENDBOOK_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `SPENDBOOK_` override YAML values
//! 3. **Bare variables** - `ACCESS_TOKEN_SECRET`, `REFRESH_TOKEN_SECRET`, `DB_URL`, `PORT`
//!    and `CLIENT_ORIGIN` are accepted without the prefix
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `SPENDBOOK_AUTH__ACCESS_TOKEN_EXPIRY=30m` sets the `auth.access_token_expiry` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use spendbook::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "SPENDBOOK_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation, except the
/// token secrets which must be provided before the server will start.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// SQLite connection string (e.g., "sqlite:spendbook.db?mode=rwc")
    /// Can also be set via the DB_URL environment variable.
    pub database_url: String,
    /// Bare DB_URL override folded into `database_url` during load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_url: Option<String>,
    /// Browser origin allowed to make credentialed CORS requests
    /// (e.g., "http://localhost:5173" for the Vite dev server)
    pub client_origin: String,
    /// Secret for signing access tokens (required)
    pub access_token_secret: Option<String>,
    /// Secret for signing refresh tokens (required, must differ from the access secret)
    pub refresh_token_secret: Option<String>,
    /// Authentication configuration (token lifetimes, cookies, password rules)
    pub auth: AuthConfig,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Access token lifetime
    #[serde(with = "humantime_serde")]
    pub access_token_expiry: Duration,
    /// Refresh token lifetime (must exceed the access token lifetime)
    #[serde(with = "humantime_serde")]
    pub refresh_token_expiry: Duration,
    /// Password validation rules
    pub password: PasswordConfig,
    /// Auth cookie attributes
    pub cookies: CookieConfig,
}

/// Password validation rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
    /// Argon2 memory cost in KiB (default: 19456 KiB = 19 MB, secure for production)
    pub argon2_memory_kib: u32,
    /// Argon2 iterations (default: 2, secure for production)
    pub argon2_iterations: u32,
    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

/// Auth cookie configuration.
///
/// Both the `access_token` and `refresh_token` cookies use these attributes, and
/// the logout clearing cookie repeats them so browsers actually drop the value.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CookieConfig {
    /// Set the Secure flag on cookies (HTTPS only)
    pub secure: bool,
    /// SameSite cookie attribute ("Strict", "Lax", or "None")
    pub same_site: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: "sqlite:spendbook.db?mode=rwc".to_string(),
            db_url: None,
            client_origin: "http://localhost:5173".to_string(),
            access_token_secret: None,
            refresh_token_secret: None,
            auth: AuthConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_expiry: Duration::from_secs(15 * 60), // 15 minutes
            refresh_token_expiry: Duration::from_secs(7 * 24 * 60 * 60), // 7 days
            password: PasswordConfig::default(),
            cookies: CookieConfig::default(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 64,
            // Secure defaults for production (Argon2id RFC recommendations)
            argon2_memory_kib: 19456, // 19 MB
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: true,
            same_site: "Strict".to_string(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // Fold the bare DB_URL override into the canonical field
        if let Some(url) = config.db_url.take() {
            config.database_url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("SPENDBOOK_").split("__"))
            // Bare variables the deployment scripts already export
            .merge(Env::raw().only(&[
                "ACCESS_TOKEN_SECRET",
                "REFRESH_TOKEN_SECRET",
                "DB_URL",
                "PORT",
                "CLIENT_ORIGIN",
            ]))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.access_token_secret.is_none() {
            return Err(Error::Internal {
                operation: "Config validation: access_token_secret is not configured. \
                 Please set the ACCESS_TOKEN_SECRET environment variable or add access_token_secret to the config file."
                    .to_string(),
            });
        }

        if self.refresh_token_secret.is_none() {
            return Err(Error::Internal {
                operation: "Config validation: refresh_token_secret is not configured. \
                 Please set the REFRESH_TOKEN_SECRET environment variable or add refresh_token_secret to the config file."
                    .to_string(),
            });
        }

        if self.access_token_secret == self.refresh_token_secret {
            return Err(Error::Internal {
                operation: "Config validation: access_token_secret and refresh_token_secret must differ. \
                 A single secret would let a refresh token pass as an access token."
                    .to_string(),
            });
        }

        // Short-lived access, long-lived refresh
        if self.auth.access_token_expiry >= self.auth.refresh_token_expiry {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: access_token_expiry ({:?}) must be shorter than refresh_token_expiry ({:?})",
                    self.auth.access_token_expiry, self.auth.refresh_token_expiry
                ),
            });
        }

        if self.auth.password.min_length > self.auth.password.max_length {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: Invalid password configuration: min_length ({}) cannot be greater than max_length ({})",
                    self.auth.password.min_length, self.auth.password.max_length
                ),
            });
        }

        if self.auth.password.min_length < 1 {
            return Err(Error::Internal {
                operation: "Config validation: Invalid password configuration: min_length must be at least 1".to_string(),
            });
        }

        match self.auth.cookies.same_site.as_str() {
            "Strict" | "Lax" | "None" => {}
            other => {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: Invalid cookie same_site value '{other}'. Expected 'Strict', 'Lax', or 'None'"
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn test_args() -> Args {
        Args {
            config: "test.yaml".to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_with_secrets() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
access_token_secret: access-secret
refresh_token_secret: refresh-secret
"#,
            )?;

            let config = Config::load(&test_args())?;

            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.port, 8000);
            assert_eq!(config.database_url, "sqlite:spendbook.db?mode=rwc");
            assert_eq!(config.auth.access_token_expiry, Duration::from_secs(15 * 60));
            assert_eq!(config.auth.refresh_token_expiry, Duration::from_secs(7 * 24 * 60 * 60));

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
access_token_secret: access-secret
refresh_token_secret: refresh-secret
"#,
            )?;

            jail.set_env("SPENDBOOK_HOST", "127.0.0.1");
            jail.set_env("PORT", "9090");
            jail.set_env("CLIENT_ORIGIN", "https://spendbook.example.com");
            jail.set_env("DB_URL", "sqlite::memory:");

            let config = Config::load(&test_args())?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 9090);
            assert_eq!(config.client_origin, "https://spendbook.example.com");
            assert_eq!(config.database_url, "sqlite::memory:");

            Ok(())
        });
    }

    #[test]
    fn test_secrets_from_bare_env() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "")?;

            jail.set_env("ACCESS_TOKEN_SECRET", "env-access");
            jail.set_env("REFRESH_TOKEN_SECRET", "env-refresh");

            let config = Config::load(&test_args())?;

            assert_eq!(config.access_token_secret.as_deref(), Some("env-access"));
            assert_eq!(config.refresh_token_secret.as_deref(), Some("env-refresh"));

            Ok(())
        });
    }

    #[test]
    fn test_missing_secrets_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "")?;

            let result = Config::load(&test_args());
            assert!(result.is_err());

            Ok(())
        });
    }

    #[test]
    fn test_identical_secrets_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
access_token_secret: same
refresh_token_secret: same
"#,
            )?;

            let result = Config::load(&test_args());
            assert!(result.is_err());

            Ok(())
        });
    }

    #[test]
    fn test_access_expiry_must_be_shorter() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
access_token_secret: access-secret
refresh_token_secret: refresh-secret
auth:
  access_token_expiry: 8d
  refresh_token_expiry: 7d
"#,
            )?;

            let result = Config::load(&test_args());
            assert!(result.is_err());

            Ok(())
        });
    }

    #[test]
    fn test_nested_auth_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
access_token_secret: access-secret
refresh_token_secret: refresh-secret
auth:
  access_token_expiry: 5m
  cookies:
    secure: false
    same_site: Lax
"#,
            )?;

            jail.set_env("SPENDBOOK_AUTH__PASSWORD__MIN_LENGTH", "12");

            let config = Config::load(&test_args())?;

            assert_eq!(config.auth.access_token_expiry, Duration::from_secs(5 * 60));
            assert!(!config.auth.cookies.secure);
            assert_eq!(config.auth.cookies.same_site, "Lax");
            assert_eq!(config.auth.password.min_length, 12);

            Ok(())
        });
    }
}
