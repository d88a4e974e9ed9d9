use async_trait::async_trait;
use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, dangerous::insecure_decode, decode,
    errors::ErrorKind as JwtErrorKind, get_current_timestamp,
};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Claims
///
/// Payload of the HS256 tokens issued by `POST /login`.
/// The backend stores the user's email next to the standard claims; only `exp` is
/// required for a token to be considered at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiration Time (exp): seconds since the Unix epoch.
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to access token store at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// TokenVerifier
///
/// Decides whether a stored token is still usable. Expiry is always checked.
/// The signature is verified only when the shared secret is known; a UI normally does
/// not hold it and relies on the server to reject forged tokens.
#[derive(Debug, Clone, Default)]
pub struct TokenVerifier {
    secret: Option<String>,
}

impl TokenVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// decode
    ///
    /// Expiry is exact: the backend grants no leeway, so neither does the client.
    /// Without a secret the payload is read unverified and only `exp` is checked.
    pub fn decode(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        let Some(secret) = &self.secret else {
            let claims = insecure_decode::<Claims>(token)?.claims;
            if claims.exp < get_current_timestamp() as i64 {
                return Err(JwtErrorKind::ExpiredSignature.into());
            }
            return Ok(claims);
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let key = DecodingKey::from_secret(secret.as_bytes());
        decode::<Claims>(token, &key, &validation).map(|data| data.claims)
    }

    /// Missing, malformed, forged and expired tokens are all just invalid.
    pub fn is_valid(&self, token: &str) -> bool {
        match self.decode(token) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(reason = ?e.kind(), "token rejected");
                false
            }
        }
    }
}

/// TokenValidator
///
/// The authentication state the router guard consults on every navigation. Passing it
/// explicitly lets callers and tests decide where the token comes from.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn is_token_valid(&self) -> Result<bool, AuthError>;
}

/// Session
///
/// An in-memory authentication context: the token (if any) plus the verifier that
/// judges it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    verifier: TokenVerifier,
}

impl Session {
    pub fn new(token: Option<String>, verifier: TokenVerifier) -> Self {
        Self { token, verifier }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn claims(&self) -> Option<Claims> {
        self.token
            .as_deref()
            .and_then(|token| self.verifier.decode(token).ok())
    }
}

#[async_trait]
impl TokenValidator for Session {
    async fn is_token_valid(&self) -> Result<bool, AuthError> {
        Ok(self
            .token
            .as_deref()
            .is_some_and(|token| self.verifier.is_valid(token)))
    }
}

/// TokenStore
///
/// Persists the raw token in a single file, the CLI's stand-in for browser local storage.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `None` when nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<String>, AuthError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.storage_error(e)),
        }
    }

    pub async fn save(&self, token: &str) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error(e))?;
        }
        tokio::fs::write(&self.path, token)
            .await
            .map_err(|e| self.storage_error(e))
    }

    pub async fn clear(&self) -> Result<(), AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(self.storage_error(e)),
            _ => Ok(()),
        }
    }

    fn storage_error(&self, source: std::io::Error) -> AuthError {
        AuthError::Storage {
            path: self.path.clone(),
            source,
        }
    }
}

/// StoredSession
///
/// Reads the token from a [`TokenStore`] on every check, so a logout or an expired
/// token is noticed on the next navigation.
#[derive(Debug, Clone)]
pub struct StoredSession {
    store: TokenStore,
    verifier: TokenVerifier,
}

impl StoredSession {
    pub fn new(store: TokenStore, verifier: TokenVerifier) -> Self {
        Self { store, verifier }
    }
}

#[async_trait]
impl TokenValidator for StoredSession {
    async fn is_token_valid(&self) -> Result<bool, AuthError> {
        let token = self.store.load().await?;
        Ok(token.is_some_and(|token| self.verifier.is_valid(&token)))
    }
}
