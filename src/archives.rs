use crate::{
    models::{
        ApiMessage, ArchiveList, ArchiveListQuery, ArchivePayload, BorrowQuery, FileUpload,
        ReturnQuery,
    },
    request::{DispatcherState, Method, MultipartForm, RequestDescriptor, RequestError},
};

// --- Endpoints ---

pub const LIST_ARCHIVES: &str = "/api/archives/list";
pub const ADD_ARCHIVE: &str = "/api/archives/add";
pub const BORROW_ARCHIVE: &str = "/api/archives/borrow";
pub const RETURN_ARCHIVE: &str = "/api/archives/return";
pub const BATCH_IMPORT_ARCHIVES: &str = "/api/archives/batch_import";
pub const BATCH_OPERATE_ARCHIVES: &str = "/api/archives/batch_operate";
pub const UPDATE_ARCHIVE: &str = "/api/archives/update";

/// Multipart field the batch endpoints read the uploaded file from.
pub const UPLOAD_FIELD: &str = "file";

// --- Descriptor Builders ---

/// list_archives_request
///
/// `GET /api/archives/list`. Filters are forwarded verbatim as query parameters.
pub fn list_archives_request(query: &ArchiveListQuery) -> Result<RequestDescriptor, RequestError> {
    RequestDescriptor::new(Method::Get, LIST_ARCHIVES).with_query(query)
}

/// add_archive_request
///
/// `POST /api/archives/add` with the payload as JSON body.
pub fn add_archive_request(payload: &ArchivePayload) -> Result<RequestDescriptor, RequestError> {
    RequestDescriptor::new(Method::Post, ADD_ARCHIVE).with_json(payload)
}

/// borrow_archive_request
///
/// `PATCH /api/archives/borrow`. The target archive travels in the query string; what
/// a borrow changes on the record is decided by the server.
pub fn borrow_archive_request(query: &BorrowQuery) -> Result<RequestDescriptor, RequestError> {
    RequestDescriptor::new(Method::Patch, BORROW_ARCHIVE).with_query(query)
}

/// return_archive_request
///
/// `PATCH /api/archives/return`. Same shape as a borrow: the archive id goes in the
/// query string and the server resets the borrow state.
pub fn return_archive_request(query: &ReturnQuery) -> Result<RequestDescriptor, RequestError> {
    RequestDescriptor::new(Method::Patch, RETURN_ARCHIVE).with_query(query)
}

/// batch_import_request
///
/// `POST /api/archives/batch_import` with `file` as the only multipart field.
pub fn batch_import_request(file: FileUpload) -> RequestDescriptor {
    RequestDescriptor::new(Method::Post, BATCH_IMPORT_ARCHIVES)
        .with_multipart(MultipartForm::new().file(UPLOAD_FIELD, file))
}

/// batch_operate_request
///
/// `POST /api/archives/batch_operate` with `file` as the only multipart field. The file
/// is passed through untouched.
pub fn batch_operate_request(file: FileUpload) -> RequestDescriptor {
    RequestDescriptor::new(Method::Post, BATCH_OPERATE_ARCHIVES)
        .with_multipart(MultipartForm::new().file(UPLOAD_FIELD, file))
}

/// update_archive_request
///
/// `PUT /api/archives/update/{id}`. The identifier lives in the path and the payload
/// replaces the whole record.
pub fn update_archive_request(
    id: u64,
    payload: &ArchivePayload,
) -> Result<RequestDescriptor, RequestError> {
    RequestDescriptor::new(Method::Put, format!("{UPDATE_ARCHIVE}/{id}")).with_json(payload)
}

// --- API Facade ---

/// ArchiveApi
///
/// One method per archive endpoint. Each builds its descriptor, dispatches it once and
/// decodes the typed response. Dispatcher errors come back untouched.
#[derive(Clone)]
pub struct ArchiveApi {
    dispatcher: DispatcherState,
}

impl ArchiveApi {
    pub fn new(dispatcher: DispatcherState) -> Self {
        Self { dispatcher }
    }

    /// Fetches one page of archives matching the filters.
    pub async fn get_archives(&self, query: &ArchiveListQuery) -> Result<ArchiveList, RequestError> {
        let response = self.dispatcher.dispatch(list_archives_request(query)?).await?;
        response.json()
    }

    pub async fn add_archive(&self, payload: &ArchivePayload) -> Result<ApiMessage, RequestError> {
        let response = self.dispatcher.dispatch(add_archive_request(payload)?).await?;
        response.message()
    }

    pub async fn borrow_archive(&self, query: &BorrowQuery) -> Result<ApiMessage, RequestError> {
        let response = self.dispatcher.dispatch(borrow_archive_request(query)?).await?;
        response.message()
    }

    pub async fn return_archive(&self, query: &ReturnQuery) -> Result<ApiMessage, RequestError> {
        let response = self.dispatcher.dispatch(return_archive_request(query)?).await?;
        response.message()
    }

    pub async fn batch_import_archives(&self, file: FileUpload) -> Result<ApiMessage, RequestError> {
        let response = self.dispatcher.dispatch(batch_import_request(file)).await?;
        response.message()
    }

    pub async fn batch_operate_archives(
        &self,
        file: FileUpload,
    ) -> Result<ApiMessage, RequestError> {
        let response = self.dispatcher.dispatch(batch_operate_request(file)).await?;
        response.message()
    }

    /// Replaces the archive `id` with `payload`.
    pub async fn update_archive(
        &self,
        id: u64,
        payload: &ArchivePayload,
    ) -> Result<ApiMessage, RequestError> {
        let response = self
            .dispatcher
            .dispatch(update_archive_request(id, payload)?)
            .await?;
        response.message()
    }
}
