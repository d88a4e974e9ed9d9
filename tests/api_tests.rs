use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    routing::{get, patch, post, put},
};
use liblink_ui::{
    AccountApi, ArchiveApi, ClientConfig, RequestError, build_dispatcher,
    models::{
        ArchiveListQuery, ArchivePayload, BorrowQuery, FileUpload, LoginRequest, NOT_BORROWED,
        RegisterRequest, ReturnQuery,
    },
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

// --- Stub Backend ---

/// One request as the stub backend saw it.
#[derive(Debug, Clone)]
struct Seen {
    method: String,
    path: String,
    query: Option<String>,
    authorization: Option<String>,
    request_id: Option<String>,
    content_type: Option<String>,
    body: String,
    // (field name, file name, bytes) for multipart uploads.
    files: Vec<(String, Option<String>, Vec<u8>)>,
}

#[derive(Clone, Default)]
struct Captured {
    inner: Arc<Mutex<Vec<Seen>>>,
}

impl Captured {
    fn push(&self, seen: Seen) {
        self.inner.lock().unwrap().push(seen);
    }

    fn all(&self) -> Vec<Seen> {
        self.inner.lock().unwrap().clone()
    }

    fn last(&self) -> Seen {
        self.all().pop().expect("no request reached the stub backend")
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn seen(method: &Method, uri: &Uri, headers: &HeaderMap, body: String) -> Seen {
    Seen {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_value(headers, header::AUTHORIZATION.as_str()),
        request_id: header_value(headers, "x-request-id"),
        content_type: header_value(headers, header::CONTENT_TYPE.as_str()),
        body,
        files: Vec::new(),
    }
}

async fn record(
    State(captured): State<Captured>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    captured.push(seen(&method, &uri, &headers, body));
    Json(json!({ "msg": "add successfully" }))
}

async fn list_archives(
    State(captured): State<Captured>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Value> {
    captured.push(seen(&method, &uri, &headers, String::new()));
    Json(json!({
        "total": 1,
        "list": [{
            "ID": 1,
            "CreatedAt": "2024-05-01T10:00:00Z",
            "UpdatedAt": "2024-05-01T10:00:00Z",
            "DeletedAt": null,
            "file_no": "A001",
            "title": "档案1",
            "contract_no": "",
            "inst_no": "",
            "arc_type": "",
            "borrow_state": "未借阅",
            "folder_id": 2
        }]
    }))
}

async fn return_archive(
    State(captured): State<Captured>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let authorized = headers.contains_key(header::AUTHORIZATION);
    captured.push(seen(&method, &uri, &headers, String::new()));
    if authorized {
        (StatusCode::OK, Json(json!({ "message": "returned" })))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "请求头中auth为空" })),
        )
    }
}

async fn batch_upload(
    State(captured): State<Captured>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut entry = seen(&method, &uri, &headers, String::new());
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap().to_vec();
        entry.files.push((name, file_name, bytes));
    }
    captured.push(entry);
    Json(json!({ "message": "queued" }))
}

async fn login(Json(credentials): Json<Value>) -> (StatusCode, Json<Value>) {
    if credentials["password"] == "correct horse" {
        (StatusCode::OK, Json(json!({ "token": "header.payload.signature" })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "bad credentials" })))
    }
}

struct TestBackend {
    address: String,
    captured: Captured,
}

async fn spawn_backend() -> TestBackend {
    let captured = Captured::default();

    let app = Router::new()
        .route("/api/archives/list", get(list_archives))
        .route("/api/archives/add", post(record))
        .route("/api/archives/borrow", patch(record))
        .route("/api/archives/return", patch(return_archive))
        .route("/api/archives/update/{id}", put(record))
        .route("/api/archives/batch_import", post(batch_upload))
        .route("/api/archives/batch_operate", post(batch_upload))
        .route("/login", post(login))
        .route("/register", post(record))
        .with_state(captured.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestBackend { address, captured }
}

fn archive_api(backend: &TestBackend, token: Option<&str>) -> ArchiveApi {
    let config = ClientConfig {
        api_base_url: backend.address.clone(),
        ..ClientConfig::default()
    };
    ArchiveApi::new(Arc::new(build_dispatcher(&config, token).unwrap()))
}

fn payload() -> ArchivePayload {
    ArchivePayload {
        file_no: "A002".to_string(),
        title: "档案2".to_string(),
        contract_no: "C-7".to_string(),
        inst_no: "I-1".to_string(),
        arc_type: "合同".to_string(),
        borrow_state: NOT_BORROWED.to_string(),
        folder_id: 4,
    }
}

// --- Tests ---

#[tokio::test]
async fn list_sends_query_and_decodes_archives() {
    let backend = spawn_backend().await;
    let api = archive_api(&backend, Some("t0ken"));

    let list = api
        .get_archives(&ArchiveListQuery {
            page: Some(1),
            title: Some("contract".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(list.total, 1);
    assert_eq!(list.list[0].file_no, "A001");

    let seen = backend.captured.last();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/api/archives/list");
    let mut query: Vec<_> = seen.query.unwrap().split('&').map(str::to_string).collect();
    query.sort();
    assert_eq!(query, vec!["page=1", "title=contract"]);
    assert_eq!(seen.authorization.as_deref(), Some("Bearer t0ken"));
    assert!(seen.request_id.is_some());
}

#[tokio::test]
async fn list_without_filters_sends_no_query() {
    let backend = spawn_backend().await;
    let api = archive_api(&backend, None);

    api.get_archives(&ArchiveListQuery::default()).await.unwrap();

    let seen = backend.captured.last();
    assert_eq!(seen.query, None);
    assert_eq!(seen.authorization, None);
}

#[tokio::test]
async fn add_and_update_send_json_body() {
    let backend = spawn_backend().await;
    let api = archive_api(&backend, Some("t0ken"));

    let added = api.add_archive(&payload()).await.unwrap();
    assert_eq!(added.text(), Some("add successfully"));

    api.update_archive(42, &payload()).await.unwrap();

    let seen = backend.captured.all();
    assert_eq!(seen.len(), 2);

    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/api/archives/add");
    assert_eq!(seen[1].method, "PUT");
    assert_eq!(seen[1].path, "/api/archives/update/42");

    for request in &seen {
        assert_eq!(request.content_type.as_deref(), Some("application/json"));
        let body: ArchivePayload = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body, payload());
    }
}

#[tokio::test]
async fn borrow_patches_with_query() {
    let backend = spawn_backend().await;
    let api = archive_api(&backend, Some("t0ken"));

    api.borrow_archive(&BorrowQuery {
        id: 9,
        borrower: None,
    })
    .await
    .unwrap();

    let seen = backend.captured.last();
    assert_eq!(seen.method, "PATCH");
    assert_eq!(seen.path, "/api/archives/borrow");
    assert_eq!(seen.query.as_deref(), Some("id=9"));
    assert!(seen.body.is_empty());
}

#[tokio::test]
async fn rejected_request_surfaces_status() {
    let backend = spawn_backend().await;
    let api = archive_api(&backend, None);

    let result = api.return_archive(&ReturnQuery { id: 9 }).await;

    match result {
        Err(RequestError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("auth"));
        }
        other => panic!("expected a 401, got {other:?}"),
    }
    // Exactly one attempt, no retry.
    assert_eq!(backend.captured.all().len(), 1);
}

#[tokio::test]
async fn batch_uploads_carry_one_file_field() {
    let backend = spawn_backend().await;
    let api = archive_api(&backend, Some("t0ken"));

    let upload = FileUpload::new("archives.xlsx", b"col1,col2\n1,2\n".to_vec())
        .with_content_type("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet");

    api.batch_import_archives(upload.clone()).await.unwrap();
    api.batch_operate_archives(upload.clone()).await.unwrap();

    let seen = backend.captured.all();
    assert_eq!(seen[0].path, "/api/archives/batch_import");
    assert_eq!(seen[1].path, "/api/archives/batch_operate");

    for request in &seen {
        assert_eq!(request.method, "POST");
        let content_type = request.content_type.as_deref().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(
            request.files,
            vec![(
                "file".to_string(),
                Some("archives.xlsx".to_string()),
                upload.bytes.clone()
            )]
        );
    }
}

#[tokio::test]
async fn login_returns_token_or_status() {
    let backend = spawn_backend().await;
    let config = ClientConfig {
        api_base_url: backend.address.clone(),
        ..ClientConfig::default()
    };
    let account = AccountApi::new(Arc::new(build_dispatcher(&config, None).unwrap()));

    let ok = account
        .login(&LoginRequest {
            email: "reader@liblink.dev".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(ok.token, "header.payload.signature");

    let denied = account
        .login(&LoginRequest {
            email: "reader@liblink.dev".to_string(),
            password: "wrong".to_string(),
        })
        .await;
    assert!(matches!(denied, Err(RequestError::Status { status: 401, .. })));
}

#[tokio::test]
async fn register_posts_account_as_json() {
    let backend = spawn_backend().await;
    let config = ClientConfig {
        api_base_url: backend.address.clone(),
        ..ClientConfig::default()
    };
    let account = AccountApi::new(Arc::new(build_dispatcher(&config, None).unwrap()));

    let message = account
        .register(&RegisterRequest {
            username: "reader".to_string(),
            email: "reader@liblink.dev".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();
    assert!(message.text().is_some());

    let seen = backend.captured.last();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.path, "/register");
    assert_eq!(seen.content_type.as_deref(), Some("application/json"));
    let body: Value = serde_json::from_str(&seen.body).unwrap();
    assert_eq!(
        body,
        json!({ "username": "reader", "email": "reader@liblink.dev", "password": "secret" })
    );
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let config = ClientConfig {
        api_base_url: address,
        ..ClientConfig::default()
    };
    let api = ArchiveApi::new(Arc::new(build_dispatcher(&config, None).unwrap()));

    let result = api.get_archives(&ArchiveListQuery::default()).await;
    assert!(matches!(result, Err(RequestError::Transport(_))));
}
