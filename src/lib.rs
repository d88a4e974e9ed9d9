use std::sync::Arc;

// --- Module Structure ---

// Typed HTTP surface of the LibLink backend.
pub mod account;
pub mod archives;
pub mod models;
pub mod request;

// Credentials, configuration and navigation.
pub mod auth;
pub mod config;
pub mod router;

// --- Public Re-exports ---

pub use account::AccountApi;
pub use archives::ArchiveApi;
pub use auth::{Session, StoredSession, TokenStore, TokenValidator, TokenVerifier};
pub use config::{ClientConfig, Env};
pub use request::{
    DispatcherState, MockDispatcher, ReqwestDispatcher, RequestDescriptor, RequestDispatcher,
    RequestError,
};
pub use router::{Navigation, NavigationError, Router, RouterError, create_router};

/// ClientState
///
/// The single container a front end holds on to: both API facades sharing one
/// dispatcher, the router and the configuration they were built from. Cloning is cheap.
#[derive(Clone)]
pub struct ClientState {
    pub archives: ArchiveApi,
    pub account: AccountApi,
    pub router: Arc<Router>,
    pub config: ClientConfig,
}

impl ClientState {
    pub fn new(config: ClientConfig, dispatcher: DispatcherState) -> Result<Self, RouterError> {
        Ok(Self {
            archives: ArchiveApi::new(dispatcher.clone()),
            account: AccountApi::new(dispatcher),
            router: Arc::new(create_router()?),
            config,
        })
    }
}

/// build_dispatcher
///
/// The reqwest dispatcher for `config`, authenticated with `token` when one is stored.
pub fn build_dispatcher(
    config: &ClientConfig,
    token: Option<&str>,
) -> Result<ReqwestDispatcher, RequestError> {
    let dispatcher = ReqwestDispatcher::new(&config.api_base_url, config.request_timeout)?;
    Ok(match token {
        Some(token) => dispatcher.with_bearer_token(token),
        None => dispatcher,
    })
}
