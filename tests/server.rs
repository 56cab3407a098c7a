#![cfg(feature = "server")]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use pulid_relay::{
    server::{self, AppState},
    DownloadedImage, GenerationRequest, ImagePipeline, RelayError,
};
use tempfile::TempDir;

/// Stands in for the remote space: records requests and replays a canned outcome.
struct FakePipeline {
    outcome: Box<dyn Fn() -> Result<DownloadedImage, RelayError> + Send + Sync>,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl FakePipeline {
    fn new(
        outcome: impl Fn() -> Result<DownloadedImage, RelayError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            outcome: Box::new(outcome),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ImagePipeline for FakePipeline {
    async fn generate(&self, request: GenerationRequest) -> Result<DownloadedImage, RelayError> {
        self.seen.lock().unwrap().push(request);
        (self.outcome)()
    }
}

fn image_at(path: PathBuf) -> DownloadedImage {
    DownloadedImage {
        filename: path.file_name().unwrap().to_string_lossy().into_owned(),
        path,
        remote_path: "imgs/foo.png".to_string(),
        bytes_written: 0,
    }
}

#[actix_web::test]
async fn generate_returns_file_as_attachment() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("foo.png");
    std::fs::write(&file, b"\x89PNG fake").unwrap();

    let pipeline = FakePipeline::new(move || Ok(image_at(file.clone())));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(pipeline.clone())))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/generate")
        .set_form([("prompt", "a knight"), ("id_image", "faces/me.jpg")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/octet-stream"
    );
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("foo.png"));

    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"\x89PNG fake");

    let seen = pipeline.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].prompt, "a knight");
    assert_eq!(seen[0].id_image, "faces/me.jpg");
}

#[actix_web::test]
async fn missing_local_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("vanished.png");

    let pipeline = FakePipeline::new(move || Ok(image_at(file.clone())));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(pipeline)))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/generate")
        .set_form([("prompt", "p"), ("id_image", "i")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "LOCAL_ARTIFACT_MISSING");
    assert!(body["detail"].as_str().unwrap().contains("vanished.png"));
}

#[actix_web::test]
async fn unreadable_local_file_is_not_reported_missing() {
    let dir = TempDir::new().unwrap();
    let unreadable = dir.path().join("foo.png");
    std::fs::create_dir(&unreadable).unwrap();

    let pipeline = FakePipeline::new(move || Ok(image_at(unreadable.clone())));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(pipeline)))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/generate")
        .set_form([("prompt", "p"), ("id_image", "i")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "ARTIFACT_READ_ERROR");
}

#[actix_web::test]
async fn upstream_status_is_passed_through() {
    let pipeline = FakePipeline::new(|| {
        Err(RelayError::Submission {
            status: 429,
            body: "queue full".to_string(),
        })
    });
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(pipeline)))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/generate")
        .set_form([("prompt", "p"), ("id_image", "i")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "SUBMISSION_ERROR");
    assert!(body["detail"].as_str().unwrap().contains("queue full"));
}

#[actix_web::test]
async fn missing_form_field_is_rejected() {
    let pipeline = FakePipeline::new(|| Err(RelayError::NoCompletionData));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(pipeline.clone())))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/generate")
        .set_form([("prompt", "only a prompt")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(pipeline.seen.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn health_reports_service() {
    let pipeline = FakePipeline::new(|| Err(RelayError::NoCompletionData));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(pipeline)))
            .configure(server::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "pulid-relay");
}
