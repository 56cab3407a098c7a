use actix_web::{
    http::{
        header::{ContentDisposition, ContentType, DispositionParam, DispositionType},
        StatusCode,
    },
    web, HttpResponse, ResponseError,
};
use serde::Deserialize;
use serde_json::json;
use std::io;
use std::path::Path;
use uuid::Uuid;

use super::AppState;
use crate::{
    error::RelayError,
    models::{DownloadedImage, GenerationRequest},
};

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    pub prompt: String,
    pub id_image: String,
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(RelayError::status_code(self)).unwrap_or(StatusCode::BAD_GATEWAY)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(ResponseError::status_code(self)).json(json!({
            "detail": self.to_string(),
            "error": self.kind(),
        }))
    }
}

pub async fn generate(
    state: web::Data<AppState>,
    form: web::Form<GenerateForm>,
) -> Result<HttpResponse, RelayError> {
    let request_id = Uuid::new_v4();
    let form = form.into_inner();

    log::info!("[req:{}] Generation requested", request_id);
    log::debug!(
        "[req:{}] prompt={:?} id_image={:?}",
        request_id,
        form.prompt,
        form.id_image
    );

    let request = GenerationRequest::new(form.prompt, form.id_image);
    let image = state.pipeline.generate(request).await.map_err(|e| {
        log::error!("[req:{}] Generation failed: {}", request_id, e);
        e
    })?;

    let body = read_artifact(&image).await?;
    log::info!(
        "[req:{}] Returning {} ({} bytes)",
        request_id,
        image.filename,
        body.len()
    );

    Ok(HttpResponse::Ok()
        .content_type(ContentType::octet_stream())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(image.filename.clone())],
        })
        .body(body))
}

async fn read_artifact(image: &DownloadedImage) -> Result<Vec<u8>, RelayError> {
    tokio::fs::read(&image.path).await.map_err(|e| {
        log::error!("Cannot read {}: {}", image.path.display(), e);
        artifact_error(&image.path, e)
    })
}

fn artifact_error(path: &Path, err: io::Error) -> RelayError {
    match err.kind() {
        io::ErrorKind::NotFound => RelayError::LocalArtifactMissing(path.to_path_buf()),
        _ => RelayError::ArtifactRead {
            path: path.to_path_buf(),
            source: err,
        },
    }
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_found_means_missing() {
        let path = Path::new("out/foo.png");

        let missing = artifact_error(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing, RelayError::LocalArtifactMissing(ref p) if p == path));

        let denied = artifact_error(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(
            denied,
            RelayError::ArtifactRead { ref path, .. } if path.ends_with("foo.png")
        ));
        assert_eq!(denied.kind(), "ARTIFACT_READ_ERROR");
        assert_eq!(RelayError::status_code(&denied), 500);
    }
}
