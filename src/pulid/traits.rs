use crate::{
    error::Result,
    models::{DownloadedImage, GenerationRequest},
};
use async_trait::async_trait;

/// Turns a generation request into a local image file.
#[async_trait]
pub trait ImagePipeline: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<DownloadedImage>;
}
