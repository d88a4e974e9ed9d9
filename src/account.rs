use crate::{
    models::{ApiMessage, LoginRequest, LoginResponse, RegisterRequest},
    request::{DispatcherState, Method, RequestDescriptor, RequestError},
};

pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";
pub const PING: &str = "/api/ping";

/// login_request
///
/// `POST /login` with the credentials as JSON body. Served outside `/api`, so no token
/// is needed.
pub fn login_request(credentials: &LoginRequest) -> Result<RequestDescriptor, RequestError> {
    RequestDescriptor::new(Method::Post, LOGIN).with_json(credentials)
}

/// register_request
///
/// `POST /register` with username, email and password as JSON body.
pub fn register_request(payload: &RegisterRequest) -> Result<RequestDescriptor, RequestError> {
    RequestDescriptor::new(Method::Post, REGISTER).with_json(payload)
}

/// `GET /api/ping`, the cheapest authenticated round trip.
pub fn ping_request() -> RequestDescriptor {
    RequestDescriptor::new(Method::Get, PING)
}

/// AccountApi
///
/// Login, registration and the authenticated ping. The backend serves the first two
/// outside `/api`, so they work without a token.
#[derive(Clone)]
pub struct AccountApi {
    dispatcher: DispatcherState,
}

impl AccountApi {
    pub fn new(dispatcher: DispatcherState) -> Self {
        Self { dispatcher }
    }

    /// Exchanges credentials for a token. Storing it is up to the caller.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, RequestError> {
        let response = self.dispatcher.dispatch(login_request(credentials)?).await?;
        response.json()
    }

    /// Creates an account; the backend does not log the new user in.
    pub async fn register(&self, payload: &RegisterRequest) -> Result<ApiMessage, RequestError> {
        let response = self.dispatcher.dispatch(register_request(payload)?).await?;
        response.message()
    }

    pub async fn ping(&self) -> Result<ApiMessage, RequestError> {
        let response = self.dispatcher.dispatch(ping_request()).await?;
        response.message()
    }
}
