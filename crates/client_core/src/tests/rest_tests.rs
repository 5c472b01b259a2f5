use super::*;
use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use shared::domain::{CompanyId, Education};
use shared::error::ErrorCode;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct Captured {
    method: String,
    path: String,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct ServerState {
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl ServerState {
    async fn record(
        &self,
        method: &str,
        path: &str,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: Option<Value>,
    ) {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        self.captured.lock().await.push(Captured {
            method: method.to_string(),
            path: path.to_string(),
            query,
            headers,
            body,
        });
    }

    async fn find(&self, method: &str, path: &str) -> Captured {
        self.captured
            .lock()
            .await
            .iter()
            .find(|c| c.method == method && c.path == path)
            .cloned()
            .unwrap_or_else(|| panic!("no {method} {path} captured"))
    }
}

fn job_row(id: i64, title: &str) -> Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "description": "Build things. Ship them.",
        "location": "Goa",
        "company_id": 1,
        "recruiter_id": "user_r1",
        "requirements": "Rust",
        "isOpen": true,
        "company": {"name": "Acme", "logo_url": null},
        "saved": []
    })
}

async fn list_jobs(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let single = headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("pgrst.object"));
    state
        .record("GET", "/rest/v1/jobs", query.clone(), &headers, None)
        .await;
    if single {
        if query.get("id").map(String::as_str) == Some("eq.404") {
            return (
                StatusCode::NOT_ACCEPTABLE,
                Json(serde_json::json!({"message": "JSON object requested, multiple (or no) rows returned"})),
            );
        }
        return (StatusCode::OK, Json(job_row(7, "Platform Engineer")));
    }
    (
        StatusCode::OK,
        Json(Value::Array(vec![job_row(1, "Rust Developer")])),
    )
}

async fn upload_object(
    State(state): State<ServerState>,
    Path((bucket, object)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state
        .record(
            "POST",
            &format!("/storage/v1/object/{bucket}"),
            HashMap::from([("object".to_string(), object.clone())]),
            &headers,
            Some(Value::from(body.len())),
        )
        .await;
    Json(serde_json::json!({ "Key": format!("{bucket}/{object}") }))
}

async fn insert_application(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state
        .record("POST", "/rest/v1/applications", HashMap::new(), &headers, Some(body.clone()))
        .await;
    let mut row = body[0].clone();
    row["id"] = Value::from(31);
    (StatusCode::CREATED, Json(Value::Array(vec![row])))
}

async fn reject_company(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state
        .record("POST", "/rest/v1/companies", HashMap::new(), &headers, Some(body))
        .await;
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"message": "Name required", "code": "23502"})),
    )
}

async fn delete_saved(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state
        .record("DELETE", "/rest/v1/saved_jobs", query, &headers, None)
        .await;
    StatusCode::NO_CONTENT
}

async fn patch_jobs(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state
        .record("PATCH", "/rest/v1/jobs", query, &headers, Some(body.clone()))
        .await;
    let mut row = job_row(7, "Platform Engineer");
    row["isOpen"] = body["isOpen"].clone();
    Json(Value::Array(vec![row]))
}

async fn spawn_backend_server() -> anyhow::Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/rest/v1/jobs", get(list_jobs).patch(patch_jobs))
        .route("/rest/v1/applications", post(insert_application))
        .route("/rest/v1/companies", post(reject_company))
        .route("/rest/v1/saved_jobs", axum::routing::delete(delete_saved))
        .route("/storage/v1/object/:bucket/:object", post(upload_object))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn backend_for(server_url: &str) -> RestBackend {
    RestBackend::new(RestConfig {
        backend_url: format!("{server_url}/"),
        api_key: "anon-key".to_string(),
        access_token: Some("session-jwt".to_string()),
        request_timeout: Some(Duration::from_secs(5)),
    })
    .expect("backend")
}

#[tokio::test]
async fn get_jobs_sends_filters_and_auth_headers() {
    let (server_url, state) = spawn_backend_server().await.expect("spawn server");
    let backend = backend_for(&server_url);
    assert_eq!(backend.base_url(), server_url);

    let jobs = backend
        .get_jobs(&JobFilter {
            location: Some("Goa".to_string()),
            company_id: Some(CompanyId(4)),
            search_query: Some("rust".to_string()),
        })
        .await
        .expect("jobs");

    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].title, "Rust Developer");

    let captured = state.find("GET", "/rest/v1/jobs").await;
    assert_eq!(captured.query.get("location").map(String::as_str), Some("eq.Goa"));
    assert_eq!(captured.query.get("company_id").map(String::as_str), Some("eq.4"));
    assert_eq!(captured.query.get("title").map(String::as_str), Some("ilike.*rust*"));
    assert_eq!(
        captured.query.get("select").map(String::as_str),
        Some(JOB_LIST_SELECT)
    );
    assert_eq!(captured.headers.get("apikey").map(String::as_str), Some("anon-key"));
    assert_eq!(
        captured.headers.get("authorization").map(String::as_str),
        Some("Bearer session-jwt")
    );
}

#[tokio::test]
async fn empty_filter_only_selects() {
    let (server_url, state) = spawn_backend_server().await.expect("spawn server");
    backend_for(&server_url)
        .get_jobs(&JobFilter::default())
        .await
        .expect("jobs");
    let captured = state.find("GET", "/rest/v1/jobs").await;
    assert_eq!(captured.query.len(), 1);
}

#[tokio::test]
async fn single_job_requests_object_and_maps_missing_row() {
    let (server_url, _state) = spawn_backend_server().await.expect("spawn server");
    let backend = backend_for(&server_url);

    let job = backend.get_single_job(JobId(7)).await.expect("job");
    assert_eq!(job.title, "Platform Engineer");

    let err = backend
        .get_single_job(JobId(404))
        .await
        .expect_err("missing job");
    let api = err.downcast_ref::<ApiException>().expect("api exception");
    assert_eq!(api.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn apply_uploads_resume_then_inserts_public_url() {
    let (server_url, state) = spawn_backend_server().await.expect("spawn server");
    let backend = backend_for(&server_url);

    let rows = backend
        .apply_to_job(&NewApplication {
            job_id: JobId(7),
            candidate_id: UserId::new("user_c1"),
            name: "Asha Rao".to_string(),
            status: ApplicationStatus::Applied,
            experience: 3,
            skills: "rust, sql".to_string(),
            education: Education::Graduate,
            resume: FileUpload {
                filename: "cv.pdf".to_string(),
                mime_type: Some("application/pdf".to_string()),
                bytes: b"%PDF-1.4".to_vec(),
            },
        })
        .await
        .expect("apply");

    assert_eq!(rows.len(), 1);
    let upload = state.find("POST", "/storage/v1/object/resumes").await;
    let object = upload.query.get("object").cloned().expect("object name");
    assert!(object.starts_with("resume-"), "object: {object}");
    assert!(object.ends_with("-user_c1"), "object: {object}");
    assert_eq!(
        upload.headers.get("content-type").map(String::as_str),
        Some("application/pdf")
    );

    let insert = state.find("POST", "/rest/v1/applications").await;
    assert_eq!(
        insert.headers.get("prefer").map(String::as_str),
        Some("return=representation")
    );
    let body = insert.body.expect("insert body");
    assert_eq!(
        body[0]["resume"],
        Value::from(format!(
            "{server_url}/storage/v1/object/public/resumes/{object}"
        ))
    );
    assert_eq!(body[0]["education"], Value::from("Graduate"));
    assert_eq!(body[0]["status"], Value::from("applied"));
    assert_eq!(rows[0].resume, body[0]["resume"].as_str().expect("resume url"));
}

#[tokio::test]
async fn backend_error_message_reaches_operation_error() {
    let (server_url, _state) = spawn_backend_server().await.expect("spawn server");
    let backend = backend_for(&server_url);

    let err = backend
        .add_new_company(&NewCompany {
            name: String::new(),
            logo: FileUpload {
                filename: "logo.png".to_string(),
                mime_type: Some("image/png".to_string()),
                bytes: vec![0x89, b'P', b'N', b'G'],
            },
        })
        .await
        .expect_err("insert rejected");

    let op = crate::error::OperationError::from(err);
    assert_eq!(op.message(), "Name required");
}

#[tokio::test]
async fn unsave_deletes_row_and_returns_nothing() {
    let (server_url, state) = spawn_backend_server().await.expect("spawn server");
    let rows = backend_for(&server_url)
        .save_job(
            true,
            &SaveJobRequest {
                user_id: UserId::new("user_c1"),
                job_id: JobId(9),
            },
        )
        .await
        .expect("unsave");

    assert!(rows.is_empty());
    let captured = state.find("DELETE", "/rest/v1/saved_jobs").await;
    assert_eq!(captured.query.get("job_id").map(String::as_str), Some("eq.9"));
    assert_eq!(captured.query.get("user_id").map(String::as_str), Some("eq.user_c1"));
}

#[tokio::test]
async fn hiring_status_patch_sends_open_flag() {
    let (server_url, state) = spawn_backend_server().await.expect("spawn server");
    let rows = backend_for(&server_url)
        .update_hiring_status(JobId(7), false)
        .await
        .expect("patch");

    assert!(!rows[0].is_open);
    let captured = state.find("PATCH", "/rest/v1/jobs").await;
    assert_eq!(captured.query.get("id").map(String::as_str), Some("eq.7"));
    assert_eq!(captured.body, Some(serde_json::json!({"isOpen": false})));
}

#[tokio::test]
async fn unreachable_backend_reports_context() {
    let backend = RestBackend::new(RestConfig {
        backend_url: "http://127.0.0.1:9".to_string(),
        api_key: "anon-key".to_string(),
        access_token: None,
        request_timeout: Some(Duration::from_secs(2)),
    })
    .expect("backend");

    let err = backend.get_companies().await.expect_err("no server");
    assert!(
        format!("{err:#}").starts_with("failed to fetch companies"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn object_names_are_sanitised() {
    assert_eq!(object_safe("Acme Corp/EU"), "Acme-Corp-EU");
    assert_eq!(object_safe("user_2x.y"), "user_2x.y");
}
