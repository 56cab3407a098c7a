use crate::{
    error::{RelayError, Result},
    models::{GenerationRequest, JobHandle},
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

#[derive(Deserialize)]
struct SubmissionResponse {
    event_id: String,
}

/// Submits generation jobs to the space's `/call/<fn>` endpoint.
#[derive(Clone)]
pub struct JobClient {
    client: Client,
    api_url: String,
}

impl JobClient {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    pub async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle> {
        let payload = request.to_payload();

        log::info!("Submitting generation job to {}", self.api_url);
        log::debug!("Job submission payload: {}", payload);

        let response = self
            .client
            .post(&self.api_url)
            .json(&payload)
            .send()
            .await
            .map_err(RelayError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(RelayError::Transport)?;

        if status != StatusCode::OK {
            log::error!("Job submission rejected with status {}", status);
            return Err(RelayError::Submission {
                status: status.as_u16(),
                body,
            });
        }

        let event_id = extract_event_id(&body)?;
        log::info!("Job accepted, event id: {}", event_id);

        Ok(JobHandle::new(event_id))
    }
}

/// Pulls the event id out of a submission response.
///
/// The space answers `{"event_id": "..."}`. Bodies that do not parse fall back
/// to the positional contract: the fourth `"`-delimited segment of the raw text.
pub fn extract_event_id(body: &str) -> Result<String> {
    if let Ok(parsed) = serde_json::from_str::<SubmissionResponse>(body) {
        return Ok(parsed.event_id);
    }

    body.split('"')
        .nth(3)
        .map(str::to_string)
        .ok_or_else(|| RelayError::IdentifierExtraction(body.to_string()))
}
