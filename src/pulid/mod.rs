pub mod event_stream;
pub mod file_client;
pub mod job_client;
pub mod result;
pub mod traits;

use crate::{
    config::PulidConfig,
    error::{RelayError, Result},
    logger,
    models::{DownloadedImage, GenerationRequest},
};
use async_trait::async_trait;
use reqwest::Client;

pub use event_stream::{CompletionTracker, EventStreamClient, LineBuffer};
pub use file_client::FileClient;
pub use job_client::{extract_event_id, JobClient};
pub use result::extract_image_path;
pub use traits::ImagePipeline;

/// Client for the hosted PuLID space. Each call to [`PulidClient::generate`]
/// runs submit, poll, extract and download in sequence and shares no state
/// with other calls beyond the connection pool.
#[derive(Clone)]
pub struct PulidClient {
    job_client: JobClient,
    event_client: EventStreamClient,
    file_client: FileClient,
}

impl PulidClient {
    pub fn new(config: PulidConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: PulidConfig) -> Self {
        Self {
            job_client: JobClient::new(client.clone(), config.api_url.clone()),
            event_client: EventStreamClient::new(
                client.clone(),
                config.api_url,
                config.poll_timeout,
            ),
            file_client: FileClient::new(
                client,
                config.download_url,
                config.output_dir,
                config.download_timeout,
            ),
        }
    }

    pub fn jobs(&self) -> &JobClient {
        &self.job_client
    }

    pub fn events(&self) -> &EventStreamClient {
        &self.event_client
    }

    pub fn files(&self) -> &FileClient {
        &self.file_client
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<DownloadedImage> {
        let _timer = logger::timer("pulid generation");

        let job = self.job_client.submit(request).await?;
        let record = self.event_client.wait_for_completion(&job).await?;

        let remote_path = extract_image_path(&record).map_err(|e| {
            log::error!("Unusable completion record for {}: {}", job.event_id, e);
            log::debug!("Completion record: {}", record.joined());
            e
        })?;
        log::info!("Generated image available at {}", remote_path);

        self.file_client.download(&remote_path).await
    }
}

#[async_trait]
impl ImagePipeline for PulidClient {
    async fn generate(&self, request: GenerationRequest) -> Result<DownloadedImage> {
        PulidClient::generate(self, &request).await
    }
}
