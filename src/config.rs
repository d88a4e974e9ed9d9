use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{StoredSession, TokenStore, TokenVerifier};

/// Backend address used when running locally without `LIBLINK_API_URL`.
pub const LOCAL_API_URL: &str = "http://localhost:8080";

/// Default location of the persisted login token.
pub const DEFAULT_TOKEN_PATH: &str = ".liblink/token";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// ClientConfig
///
/// Everything the client needs to reach the LibLink backend and to judge its stored
/// credentials. Loaded once at startup and then only read.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    // Base URL every request path is joined onto.
    pub api_base_url: String,
    // File holding the token returned by the last login.
    pub token_path: PathBuf,
    // HS256 secret; when present token signatures are checked locally too.
    pub jwt_secret: Option<String>,
    pub request_timeout: Duration,
    // Runtime environment marker. Selects defaults and the log format.
    pub env: Env,
}

/// Env
///
/// `Local` falls back to a backend on localhost; `Production` requires every address to
/// be configured explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for ClientConfig {
    /// Test-safe values that need no environment variables.
    fn default() -> Self {
        Self {
            api_base_url: LOCAL_API_URL.to_string(),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            jwt_secret: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            env: Env::Local,
        }
    }
}

impl ClientConfig {
    /// load
    ///
    /// Reads the configuration from the environment (`APP_ENV`, `LIBLINK_API_URL`,
    /// `LIBLINK_TOKEN_PATH`, `LIBLINK_JWT_SECRET`, `LIBLINK_TIMEOUT_SECS`).
    ///
    /// # Panics
    /// Panics in production when `LIBLINK_API_URL` is not set, so a deployed client never
    /// silently talks to localhost.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let api_base_url = match env {
            Env::Production => env::var("LIBLINK_API_URL")
                .expect("FATAL: LIBLINK_API_URL must be set in production."),
            Env::Local => {
                env::var("LIBLINK_API_URL").unwrap_or_else(|_| LOCAL_API_URL.to_string())
            }
        };

        let token_path = env::var("LIBLINK_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_PATH));

        // An empty secret is the same as none at all.
        let jwt_secret = env::var("LIBLINK_JWT_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty());

        let request_timeout = env::var("LIBLINK_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Self {
            api_base_url,
            token_path,
            jwt_secret,
            request_timeout,
            env,
        }
    }

    pub fn token_verifier(&self) -> TokenVerifier {
        TokenVerifier::new(self.jwt_secret.clone())
    }

    pub fn token_store(&self) -> TokenStore {
        TokenStore::new(self.token_path.clone())
    }

    /// A validator that re-reads the token file on every guard evaluation.
    pub fn stored_session(&self) -> StoredSession {
        StoredSession::new(self.token_store(), self.token_verifier())
    }
}
