pub mod handlers;

use crate::pulid::ImagePipeline;
use actix_web::web;
use std::sync::Arc;

pub use handlers::GenerateForm;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<dyn ImagePipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<dyn ImagePipeline>) -> Self {
        Self { pipeline }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/generate", web::post().to(handlers::generate))
        .route("/health", web::get().to(handlers::health));
}
