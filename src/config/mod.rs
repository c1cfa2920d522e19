use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    None,
    Token,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    /// HMAC secret for signing tokens. Required when mode is `token`.
    #[serde(default)]
    pub secret_key: Option<String>,
    pub admin_username: String,
    pub admin_password: String,
    #[serde(default = "AuthConfig::default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

impl AuthConfig {
    const fn default_token_ttl_hours() -> u64 {
        24
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./netdiag.db".to_string());
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let auth_mode = std::env::var("AUTH_MODE")
            .unwrap_or_else(|_| "token".to_string())
            .to_lowercase();
        let mode = match auth_mode.as_str() {
            "none" => AuthMode::None,
            "token" => AuthMode::Token,
            other => {
                tracing::warn!(
                    "Unknown AUTH_MODE '{other}', falling back to 'token'. Supported values: none, token"
                );
                AuthMode::Token
            }
        };

        let secret_key = if matches!(mode, AuthMode::Token) {
            Some(
                std::env::var("SECRET_KEY")
                    .context("SECRET_KEY must be set when AUTH_MODE=token")?,
            )
        } else {
            std::env::var("SECRET_KEY").ok()
        };

        let admin_username =
            std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password =
            std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
        let token_ttl_hours = std::env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(AuthConfig::default_token_ttl_hours);

        Ok(Config {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            server: ServerConfig { host, port },
            auth: AuthConfig {
                mode,
                secret_key,
                admin_username,
                admin_password,
                token_ttl_hours,
            },
        })
    }
}
