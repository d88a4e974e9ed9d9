use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::models::{ApiMessage, FileUpload};

/// Content type declared by descriptors that carry a multipart form.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Correlation header attached to every outgoing request.
pub const X_REQUEST_ID: &str = "x-request-id";

/// RequestError
///
/// The single failure class of the client: a request that could not be built, sent,
/// or understood. API functions hand it back to the caller exactly as the dispatcher
/// produced it.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to encode request payload: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

/// HTTP verbs used by the LibLink API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
        }
    }
}

/// A multipart form made of named file fields, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    fields: Vec<(String, FileUpload)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: impl Into<String>, file: FileUpload) -> Self {
        self.fields.push((name.into(), file));
        self
    }

    pub fn fields(&self) -> &[(String, FileUpload)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FileUpload> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, file)| file)
    }
}

/// Request body carried by a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Multipart(MultipartForm),
}

/// RequestDescriptor
///
/// Everything a dispatcher needs to perform one HTTP call: method, URL path, query
/// parameters, body and headers. Descriptors are assembled with the consuming `with_*`
/// methods and expose no way to change them afterwards; the dispatcher takes them by value.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    url: String,
    method: Method,
    params: Option<Map<String, Value>>,
    data: Option<RequestBody>,
    headers: BTreeMap<String, String>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            params: None,
            data: None,
            headers: BTreeMap::new(),
        }
    }

    /// Serializes `query` into the parameter map. The value must serialize to a JSON
    /// object; keys and values are forwarded as they come out of serde.
    pub fn with_query<T: Serialize>(mut self, query: &T) -> Result<Self, RequestError> {
        match serde_json::to_value(query).map_err(RequestError::Encode)? {
            Value::Object(params) => {
                self.params = Some(params);
                Ok(self)
            }
            other => Err(RequestError::Encode(
                <serde_json::Error as serde::ser::Error>::custom(format!(
                    "query parameters must serialize to an object, got {other}"
                )),
            )),
        }
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, RequestError> {
        let body = serde_json::to_value(body).map_err(RequestError::Encode)?;
        self.data = Some(RequestBody::Json(body));
        Ok(self)
    }

    pub fn with_multipart(mut self, form: MultipartForm) -> Self {
        self.data = Some(RequestBody::Multipart(form));
        self.with_header("Content-Type", MULTIPART_FORM_DATA)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn params(&self) -> Option<&Map<String, Value>> {
        self.params.as_ref()
    }

    pub fn data(&self) -> Option<&RequestBody> {
        self.data.as_ref()
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A successful response: status code plus the raw body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        serde_json::from_str(&self.body).map_err(RequestError::Decode)
    }

    /// Decodes the `{message}` / `{msg}` / `{error}` envelope. An empty body is an empty message.
    pub fn message(&self) -> Result<ApiMessage, RequestError> {
        if self.body.trim().is_empty() {
            return Ok(ApiMessage::default());
        }
        self.json()
    }
}

// 1. Dispatcher Contract
/// RequestDispatcher
///
/// The seam between the API functions and the network. Each call performs exactly one
/// request for the given descriptor; retries, caching and deduplication are not part
/// of the contract.
#[async_trait]
pub trait RequestDispatcher: Send + Sync {
    async fn dispatch(&self, request: RequestDescriptor) -> Result<ApiResponse, RequestError>;
}

/// DispatcherState
///
/// Shared handle to the dispatcher used by every API facade.
pub type DispatcherState = Arc<dyn RequestDispatcher>;

// 2. The Real Implementation (reqwest)
/// ReqwestDispatcher
///
/// Sends descriptors to the LibLink backend. Descriptor URLs are paths and are joined
/// onto `base_url`. When a bearer token is set every request carries it in the
/// `Authorization` header.
#[derive(Clone)]
pub struct ReqwestDispatcher {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl ReqwestDispatcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: None,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RequestDispatcher for ReqwestDispatcher {
    async fn dispatch(&self, request: RequestDescriptor) -> Result<ApiResponse, RequestError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "api_request",
            method = request.method().as_str(),
            url = %request.url(),
            req_id = %request_id,
        );

        async move {
            let mut builder = self
                .client
                .request(request.method().into(), self.endpoint(request.url()))
                .header(X_REQUEST_ID, request_id.to_string());

            if let Some(token) = &self.bearer_token {
                builder = builder.bearer_auth(token);
            }

            if let Some(params) = request.params().filter(|params| !params.is_empty()) {
                builder = builder.query(&query_pairs(params));
            }

            // reqwest writes the multipart Content-Type itself, boundary included.
            let is_multipart = matches!(request.data(), Some(RequestBody::Multipart(_)));
            for (name, value) in request.headers() {
                if is_multipart && name.eq_ignore_ascii_case("content-type") {
                    continue;
                }
                builder = builder.header(name.as_str(), value.as_str());
            }

            builder = match request.data() {
                Some(RequestBody::Json(body)) => builder.json(body),
                Some(RequestBody::Multipart(form)) => builder.multipart(to_reqwest_form(form)?),
                None => builder,
            };

            let response = builder.send().await?;
            let status = response.status();
            let body = response.text().await?;

            tracing::debug!(status = status.as_u16(), "api response received");

            if !status.is_success() {
                return Err(RequestError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            Ok(ApiResponse {
                status: status.as_u16(),
                body,
            })
        }
        .instrument(span)
        .await
    }
}

/// Flattens the parameter map into query pairs. Strings go out unquoted, nulls are dropped.
fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key.clone(), text.clone())),
            other => Some((key.clone(), other.to_string())),
        })
        .collect()
}

fn to_reqwest_form(form: &MultipartForm) -> Result<reqwest::multipart::Form, RequestError> {
    let mut multipart = reqwest::multipart::Form::new();
    for (name, file) in form.fields() {
        let mut part =
            reqwest::multipart::Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }
        multipart = multipart.part(name.clone(), part);
    }
    Ok(multipart)
}

// 3. The Mock Implementation (For Unit Tests)
/// MockDispatcher
///
/// Records every descriptor it receives and answers with a canned body, so API
/// functions can be exercised without a network. The failing variant answers every
/// call with a 500.
#[derive(Debug)]
pub struct MockDispatcher {
    recorded: Mutex<Vec<RequestDescriptor>>,
    response_body: String,
    should_fail: bool,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self::with_response("{}")
    }

    pub fn with_response(body: impl Into<String>) -> Self {
        Self {
            recorded: Mutex::new(Vec::new()),
            response_body: body.into(),
            should_fail: false,
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    /// All descriptors dispatched so far, oldest first.
    pub fn recorded(&self) -> Vec<RequestDescriptor> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<RequestDescriptor> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Default for MockDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestDispatcher for MockDispatcher {
    async fn dispatch(&self, request: RequestDescriptor) -> Result<ApiResponse, RequestError> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        if self.should_fail {
            return Err(RequestError::Status {
                status: 500,
                body: "Mock Dispatcher Error: Simulation requested".to_string(),
            });
        }

        Ok(ApiResponse {
            status: 200,
            body: self.response_body.clone(),
        })
    }
}
