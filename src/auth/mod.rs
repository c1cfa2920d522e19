use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{AuthConfig, AuthMode};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

/// Signed-token gate in front of the diagnostics API. A single admin
/// credential pair issues HS256 bearer tokens; every protected request is
/// a yes/no check against the signature and expiry.
pub struct AuthService {
    mode: AuthMode,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    admin_username: String,
    admin_password: String,
    token_ttl_hours: u64,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> anyhow::Result<Self> {
        let secret = config.secret_key.clone().unwrap_or_default();
        if matches!(config.mode, AuthMode::Token) && secret.is_empty() {
            anyhow::bail!("auth mode 'token' requires a non-empty secret key");
        }
        Ok(Self {
            mode: config.mode,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            admin_username: config.admin_username.clone(),
            admin_password: config.admin_password.clone(),
            token_ttl_hours: config.token_ttl_hours,
        })
    }

    pub fn check_credentials(&self, username: &str, password: &str) -> bool {
        username == self.admin_username && password == self.admin_password
    }

    pub fn issue_token(&self, username: &str) -> anyhow::Result<String> {
        let expires_at = chrono::Utc::now()
            + chrono::Duration::hours(self.token_ttl_hours as i64);
        let claims = Claims {
            sub: username.to_string(),
            exp: expires_at.timestamp() as usize,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    pub fn verify_token(&self, token: &str) -> bool {
        decode::<Claims>(token, &self.decoding_key, &Validation::default()).is_ok()
    }

    /// The authorized-request predicate: strips an optional `Bearer `
    /// prefix from the Authorization header and verifies the token.
    pub fn is_authorized(&self, headers: &HeaderMap) -> bool {
        if matches!(self.mode, AuthMode::None) {
            return true;
        }
        let Some(raw) = headers.get("Authorization").and_then(|h| h.to_str().ok()) else {
            return false;
        };
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw);
        self.verify_token(token)
    }
}

pub async fn auth_middleware(
    auth_service: Arc<AuthService>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    if auth_service.is_authorized(&headers) {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Unauthorized" })),
        )
            .into_response()
    }
}
