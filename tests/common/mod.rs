//! Mock backend service for HTTP-level tests.
//!
//! Serves the same routes as the real backend on `127.0.0.1:0`, storing
//! everything in an [`InMemoryCaseStore`] the test can seed directly.
//! Uploads whose `case_name` is `"explode"` fail with `502`.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use caselens_core::models::CaseId;
use caselens_core::store::memory::InMemoryCaseStore;
use caselens_core::store::CaseStore;
use caselens_core::upload::{UploadFile, UploadRequest};
use serde::Deserialize;
use serde_json::json;

pub const FAILING_CASE_NAME: &str = "explode";

pub struct MockBackend {
    pub addr: SocketAddr,
    pub store: Arc<InMemoryCaseStore>,
}

impl MockBackend {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

#[derive(Deserialize)]
struct RenameBody {
    name: String,
}

fn error(status: StatusCode, err: anyhow::Error) -> Response {
    (status, Json(json!({ "detail": format!("{:#}", err) }))).into_response()
}

async fn list_cases(State(store): State<Arc<InMemoryCaseStore>>) -> Response {
    match store.list_cases().await {
        Ok(cases) => Json(cases).into_response(),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn get_case(
    State(store): State<Arc<InMemoryCaseStore>>,
    Path(id): Path<i64>,
) -> Response {
    match store.get_case(CaseId(id)).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found" }))).into_response(),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn rename_case(
    State(store): State<Arc<InMemoryCaseStore>>,
    Path(id): Path<i64>,
    Json(body): Json<RenameBody>,
) -> Response {
    match store.rename_case(CaseId(id), &body.name).await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(e) => error(StatusCode::NOT_FOUND, e),
    }
}

async fn delete_case(
    State(store): State<Arc<InMemoryCaseStore>>,
    Path(id): Path<i64>,
) -> Response {
    match store.delete_case(CaseId(id)).await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(e) => error(StatusCode::NOT_FOUND, e),
    }
}

async fn upload(
    State(store): State<Arc<InMemoryCaseStore>>,
    mut multipart: Multipart,
) -> Response {
    let mut request = UploadRequest {
        case_name: String::new(),
        files: Vec::new(),
        target: None,
    };
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let Ok(data) = field.bytes().await else {
            return (StatusCode::BAD_REQUEST, "unreadable field").into_response();
        };
        match name.as_str() {
            "case_name" => request.case_name = String::from_utf8_lossy(&data).into_owned(),
            "case_id" => {
                request.target = String::from_utf8_lossy(&data).parse::<CaseId>().ok();
            }
            "files" => request.files.push(UploadFile::new(
                file_name.unwrap_or_default(),
                data.to_vec(),
            )),
            _ => {}
        }
    }

    if request.case_name == FAILING_CASE_NAME {
        return (StatusCode::BAD_GATEWAY, "summarizer unavailable").into_response();
    }
    match store.upload(&request).await {
        Ok(case_id) => Json(json!({ "ok": true, "case_id": case_id })).into_response(),
        Err(e) => error(StatusCode::BAD_REQUEST, e),
    }
}

/// Start the mock backend on an ephemeral port. Must be called inside a
/// tokio runtime; the server runs until the runtime shuts down.
pub async fn spawn_backend() -> MockBackend {
    let store = Arc::new(InMemoryCaseStore::new());
    let app = Router::new()
        .route("/api/cases", get(list_cases))
        .route(
            "/api/case/{id}",
            get(get_case).patch(rename_case).delete(delete_case),
        )
        .route("/upload", post(upload))
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend { addr, store }
}
