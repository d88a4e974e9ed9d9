use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use ts_rs::TS;

/// Borrow state the backend assigns to archives that are on the shelf.
pub const NOT_BORROWED: &str = "未借阅";

// --- Core Records (Returned by the Backend) ---

/// Archive
///
/// A library archive record as served by `/api/archives/*`.
/// The backend embeds its ORM base model without JSON tags, so the bookkeeping fields
/// travel as `ID`, `CreatedAt`, `UpdatedAt` and `DeletedAt` while the archive's own
/// columns are snake case.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct Archive {
    #[serde(rename = "ID")]
    #[ts(type = "number")]
    pub id: u64,
    #[serde(rename = "CreatedAt")]
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "UpdatedAt")]
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    // Soft-delete marker; null for live records.
    #[serde(rename = "DeletedAt", default)]
    #[ts(type = "string | null")]
    pub deleted_at: Option<DateTime<Utc>>,

    pub file_no: String,
    pub title: String,
    pub contract_no: String,
    pub inst_no: String,
    pub arc_type: String,
    pub borrow_state: String,
    #[ts(type = "number")]
    pub folder_id: u64,
}

/// Folder
///
/// A node of the archive folder tree. Root folders have `parent_id == 0`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct Folder {
    #[serde(rename = "ID")]
    #[ts(type = "number")]
    pub id: u64,
    #[serde(rename = "CreatedAt")]
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "UpdatedAt")]
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "DeletedAt", default)]
    #[ts(type = "string | null")]
    pub deleted_at: Option<DateTime<Utc>>,

    pub name: String,
    pub path: String,
    #[ts(type = "number")]
    pub parent_id: u64,
}

// --- Request Payloads (Input Schemas) ---

/// ArchivePayload
///
/// Body of `POST /api/archives/add` and `PUT /api/archives/update/{id}`.
/// Update is a full-resource replacement, so both operations send every field.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq, Eq)]
#[ts(export)]
pub struct ArchivePayload {
    pub file_no: String,
    pub title: String,
    pub contract_no: String,
    pub inst_no: String,
    pub arc_type: String,
    pub borrow_state: String,
    #[ts(type = "number")]
    pub folder_id: u64,
}

/// ArchiveListQuery
///
/// Query string of `GET /api/archives/list`. Unset filters are left out of the URL.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq, Eq)]
#[ts(export)]
pub struct ArchiveListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arc_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrow_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub folder_id: Option<u64>,
}

/// BorrowQuery
///
/// Query string of `PATCH /api/archives/borrow`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq, Eq)]
#[ts(export)]
pub struct BorrowQuery {
    #[ts(type = "number")]
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrower: Option<String>,
}

/// Query string of `PATCH /api/archives/return`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq, Eq)]
#[ts(export)]
pub struct ReturnQuery {
    #[ts(type = "number")]
    pub id: u64,
}

/// Credentials for `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Sign-up payload for `POST /register`. The password is forwarded, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

// --- Responses (Output Schemas) ---

/// ArchiveList
///
/// Response of `GET /api/archives/list`, the backend's `{total, list}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq)]
#[ts(export)]
pub struct ArchiveList {
    #[ts(type = "number")]
    pub total: u64,
    #[serde(default)]
    pub list: Vec<Archive>,
}

/// ApiMessage
///
/// Envelope of the mutating endpoints. Handlers answer with `message` (or the older
/// `msg` key) on success and with `error` when they reject the request.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Default, PartialEq, Eq)]
#[ts(export)]
pub struct ApiMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiMessage {
    /// The success text, whichever key the handler used. `message` wins when both are set.
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.msg.as_deref())
    }
}

/// Response of `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq, Eq)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
}

// --- Uploads ---

/// FileUpload
///
/// An opaque file handed to the batch endpoints. The bytes are never inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Reads the whole file; the upload is named after the path's final component.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}
