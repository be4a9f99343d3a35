use std::sync::{Arc, Mutex as StdMutex};

use super::*;
use anyhow::Result;
use axum::{
    extract::{Multipart, State},
    http::StatusCode as HttpStatus,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::domain::GarmentType;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReceivedPart {
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone, Default)]
struct Recorder {
    parts: Arc<Mutex<Vec<ReceivedPart>>>,
    try_ons: Arc<Mutex<Vec<TryOnRequest>>>,
}

async fn spawn_server(app: Router) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

fn service_for(server_url: &str) -> HttpTryOnService {
    let settings = ClientSettings {
        api_base_url: server_url.to_string(),
        upload_chunk_bytes: 3,
        ..ClientSettings::default()
    };
    HttpTryOnService::new(&settings).expect("valid settings")
}

fn png(name: &str) -> ImageFile {
    ImageFile::new(name, None, vec![0x89, b'P', b'N', b'G', 1, 2, 3, 4])
}

fn request() -> TryOnRequest {
    TryOnRequest {
        person_image_url: "/static/uploads/p1.png".to_string(),
        garment_image_url: "/static/uploads/g1.png".to_string(),
        garment_type: GarmentType::Bottom,
    }
}

async fn record_upload(State(recorder): State<Recorder>, mut multipart: Multipart) -> Json<UploadReply> {
    while let Ok(Some(field)) = multipart.next_field().await {
        let part = ReceivedPart {
            field: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            bytes: field.bytes().await.map(|b| b.to_vec()).unwrap_or_default(),
        };
        recorder.parts.lock().await.push(part);
    }
    Json(UploadReply::success("/static/uploads/p1.png"))
}

async fn record_try_on(
    State(recorder): State<Recorder>,
    Json(payload): Json<TryOnRequest>,
) -> Json<TryOnReply> {
    recorder.try_ons.lock().await.push(payload);
    Json(TryOnReply::success("/static/results/r1.png"))
}

async fn spawn_recording_server() -> Result<(String, Recorder)> {
    let recorder = Recorder::default();
    let app = Router::new()
        .route(UPLOAD_PATH, post(record_upload))
        .route(TRY_ON_PATH, post(record_try_on))
        .with_state(recorder.clone());
    Ok((spawn_server(app).await?, recorder))
}

async fn spawn_try_on_server(status: HttpStatus, body: &'static str) -> Result<String> {
    let app = Router::new().route(
        TRY_ON_PATH,
        post(move || async move {
            (
                status,
                [(axum::http::header::CONTENT_TYPE, "application/json")],
                body,
            )
        }),
    );
    spawn_server(app).await
}

#[tokio::test]
async fn upload_sends_file_field_and_reports_progress() {
    let (server_url, recorder) = spawn_recording_server().await.expect("spawn server");
    let service = service_for(&server_url);
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let progress: ProgressCallback = Arc::new(move |update| sink.lock().unwrap().push(update));

    let url = service
        .upload_image(&png("person.png"), Some(progress))
        .await
        .expect("upload");

    assert_eq!(url, "/static/uploads/p1.png");
    let parts = recorder.parts.lock().await.clone();
    assert_eq!(
        parts,
        vec![ReceivedPart {
            field: UPLOAD_FIELD.to_string(),
            file_name: Some("person.png".to_string()),
            content_type: Some("image/png".to_string()),
            bytes: png("person.png").bytes.to_vec(),
        }]
    );

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 3);
    assert!(seen.windows(2).all(|pair| pair[0].sent < pair[1].sent));
    assert_eq!(seen.last(), Some(&UploadProgress { sent: 8, total: 8 }));
}

#[tokio::test]
async fn upload_error_body_wins_over_status_code() {
    let app = Router::new().route(
        UPLOAD_PATH,
        post(|| async {
            (
                HttpStatus::BAD_REQUEST,
                Json(UploadReply::failure("No file part")),
            )
        }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");

    let err = service_for(&server_url)
        .upload_image(&png("person.png"), None)
        .await
        .unwrap_err();

    assert_eq!(err, TryOnError::Upload("No file part".to_string()));
}

#[tokio::test]
async fn upload_non_json_reply_reports_status() {
    let app = Router::new().route(
        UPLOAD_PATH,
        post(|| async { (HttpStatus::INTERNAL_SERVER_ERROR, "boom").into_response() }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");

    let err = service_for(&server_url)
        .upload_image(&png("person.png"), None)
        .await
        .unwrap_err();

    assert!(
        matches!(&err, TryOnError::Upload(detail) if detail.contains("500")),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn try_on_posts_json_request_and_parses_success() {
    let (server_url, recorder) = spawn_recording_server().await.expect("spawn server");

    let outcome = service_for(&server_url)
        .submit_try_on(&request())
        .await
        .expect("try-on");

    assert_eq!(
        outcome,
        TryOnOutcome::Success {
            image_url: "/static/results/r1.png".to_string(),
            task_id: None,
        }
    );
    assert_eq!(recorder.try_ons.lock().await.clone(), vec![request()]);
}

#[tokio::test]
async fn try_on_submitted_reply_carries_task_id() {
    let server_url = spawn_try_on_server(
        HttpStatus::OK,
        r#"{"status":"submitted","task_id":"t-42","message":"queued"}"#,
    )
    .await
    .expect("spawn server");

    let outcome = service_for(&server_url)
        .submit_try_on(&request())
        .await
        .expect("try-on");

    assert_eq!(
        outcome,
        TryOnOutcome::Submitted {
            task_id: Some("t-42".to_string())
        }
    );
}

#[tokio::test]
async fn try_on_error_reply_is_a_service_error() {
    let server_url = spawn_try_on_server(
        HttpStatus::INTERNAL_SERVER_ERROR,
        r#"{"status":"error","message":"face not detected"}"#,
    )
    .await
    .expect("spawn server");

    let err = service_for(&server_url)
        .submit_try_on(&request())
        .await
        .unwrap_err();

    assert_eq!(err, TryOnError::Service("face not detected".to_string()));
}

#[tokio::test]
async fn try_on_reply_without_status_is_a_protocol_error() {
    let server_url = spawn_try_on_server(
        HttpStatus::TOO_MANY_REQUESTS,
        r#"{"error":"rate limit exceeded"}"#,
    )
    .await
    .expect("spawn server");

    let err = service_for(&server_url)
        .submit_try_on(&request())
        .await
        .unwrap_err();

    assert_eq!(err, TryOnError::Protocol("unknown status".to_string()));
}

#[tokio::test]
async fn try_on_unknown_status_and_garbage_are_protocol_errors() {
    for body in [r#"{"status":"processing"}"#, "<html>gateway</html>"] {
        let server_url = spawn_try_on_server(HttpStatus::OK, body)
            .await
            .expect("spawn server");

        let err = service_for(&server_url)
            .submit_try_on(&request())
            .await
            .unwrap_err();

        assert!(
            matches!(err, TryOnError::Protocol(_)),
            "{body}: unexpected error {err:?}"
        );
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");

    let err = service_for(&format!("http://{addr}"))
        .submit_try_on(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, TryOnError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn fetch_image_resolves_relative_urls_and_checks_status() {
    let app = Router::new().route(
        "/static/results/r1.png",
        get(|| async { vec![0x89u8, b'P', b'N', b'G'] }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");
    let service = service_for(&server_url);

    let bytes = service
        .fetch_image("/static/results/r1.png")
        .await
        .expect("fetch");
    assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);

    let absolute = format!("{server_url}/static/results/r1.png");
    assert_eq!(service.fetch_image(&absolute).await.expect("fetch"), bytes);

    let err = service
        .fetch_image("/static/results/missing.png")
        .await
        .unwrap_err();
    assert!(matches!(err, TryOnError::Transport(_)));
}

#[tokio::test]
async fn health_check_reads_status() {
    let app = Router::new().route(
        HEALTH_PATH,
        get(|| async {
            Json(HealthReply {
                status: "ok".to_string(),
                message: Some("ready".to_string()),
            })
        }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");

    let reply = service_for(&server_url)
        .check_health()
        .await
        .expect("health");

    assert!(reply.is_ok());
    assert_eq!(reply.message.as_deref(), Some("ready"));
}

#[test]
fn base_path_is_kept_for_endpoints() {
    let service = service_for("https://tryon.example.com/app");
    assert_eq!(
        service.endpoint(UPLOAD_PATH).unwrap().as_str(),
        "https://tryon.example.com/app/api/tryon/upload"
    );
}

#[test]
fn resolve_url_handles_relative_absolute_and_empty() {
    let base = Url::parse("http://localhost:5001/").unwrap();

    assert_eq!(
        resolve_url(&base, "/static/results/r1.png").unwrap().as_str(),
        "http://localhost:5001/static/results/r1.png"
    );
    assert_eq!(
        resolve_url(&base, "https://cdn.example.com/r1.png")
            .unwrap()
            .as_str(),
        "https://cdn.example.com/r1.png"
    );
    assert!(matches!(
        resolve_url(&base, "  "),
        Err(TryOnError::Protocol(_))
    ));
}
