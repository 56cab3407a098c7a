use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Error in POST request (status {status}): {body}")]
    Submission { status: u16, body: String },

    #[error("Failed to send job submission: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to extract event ID from response: {0:?}")]
    IdentifierExtraction(String),

    #[error("Error while polling event (status {status}): {body}")]
    Poll { status: u16, body: String },

    #[error("Error while polling: {0}")]
    StreamRead(#[source] reqwest::Error),

    #[error("No complete event data received.")]
    NoCompletionData,

    #[error("Event stream line exceeded {limit} bytes without a newline")]
    StreamLineTooLong { limit: usize },

    #[error("Timed out after {0:?} waiting for the complete event")]
    PollTimeout(Duration),

    #[error("JSON decode error: {0}")]
    PayloadDecode(#[from] serde_json::Error),

    #[error("Could not extract image path from response JSON.")]
    PayloadShape,

    #[error("Failed to download image: {reason}")]
    Download {
        status: Option<u16>,
        reason: String,
        #[source]
        source: Option<DownloadFault>,
    },

    #[error("Image file not found after generation: {}", .0.display())]
    LocalArtifactMissing(PathBuf),

    #[error("Failed to read generated image {}: {source}", .path.display())]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Underlying cause of a failed download.
#[derive(Debug, Error)]
pub enum DownloadFault {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RelayError {
    pub(crate) fn download(reason: impl Into<String>) -> Self {
        RelayError::Download {
            status: None,
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn download_fault(
        reason: impl Into<String>,
        cause: impl Into<DownloadFault>,
    ) -> Self {
        RelayError::Download {
            status: None,
            reason: reason.into(),
            source: Some(cause.into()),
        }
    }

    pub(crate) fn download_status(status: u16) -> Self {
        RelayError::Download {
            status: Some(status),
            reason: format!("remote answered with status {}", status),
            source: None,
        }
    }

    /// HTTP status the facade answers with. Remote statuses are passed through
    /// unchanged so the caller sees what the upstream service said.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::Submission { status, .. } | RelayError::Poll { status, .. } => *status,
            RelayError::Download {
                status: Some(status),
                ..
            } => *status,
            RelayError::PollTimeout(_) => 504,
            _ => 500,
        }
    }

    /// Short machine-readable kind, used in error bodies and log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Config(_) => "CONFIG_ERROR",
            RelayError::Submission { .. } => "SUBMISSION_ERROR",
            RelayError::Transport(_) => "TRANSPORT_ERROR",
            RelayError::IdentifierExtraction(_) => "IDENTIFIER_EXTRACTION_ERROR",
            RelayError::Poll { .. } => "POLL_ERROR",
            RelayError::StreamRead(_) => "STREAM_READ_ERROR",
            RelayError::NoCompletionData => "NO_COMPLETION_DATA",
            RelayError::StreamLineTooLong { .. } => "STREAM_LINE_TOO_LONG",
            RelayError::PollTimeout(_) => "POLL_TIMEOUT",
            RelayError::PayloadDecode(_) => "PAYLOAD_DECODE_ERROR",
            RelayError::PayloadShape => "PAYLOAD_SHAPE_ERROR",
            RelayError::Download { .. } => "DOWNLOAD_ERROR",
            RelayError::LocalArtifactMissing(_) => "LOCAL_ARTIFACT_MISSING",
            RelayError::ArtifactRead { .. } => "ARTIFACT_READ_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_statuses_are_preserved() {
        let err = RelayError::Submission {
            status: 422,
            body: "bad input".into(),
        };
        assert_eq!(err.status_code(), 422);
        assert!(err.to_string().contains("bad input"));

        let err = RelayError::Poll {
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.status_code(), 404);

        let err = RelayError::download_status(403);
        assert_eq!(err.status_code(), 403);
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn local_failures_map_to_500() {
        assert_eq!(RelayError::NoCompletionData.status_code(), 500);
        assert_eq!(RelayError::PayloadShape.status_code(), 500);
        assert_eq!(RelayError::download("disk full").status_code(), 500);
        assert_eq!(
            RelayError::LocalArtifactMissing(PathBuf::from("foo.png")).status_code(),
            500
        );
    }

    #[test]
    fn download_fault_keeps_its_cause() {
        use std::error::Error as _;

        let cause = io::Error::new(io::ErrorKind::Other, "no space left");
        let err = RelayError::download_fault("writing foo.png", cause);
        assert_eq!(err.status_code(), 500);

        let source = err.source().expect("download error should expose its cause");
        assert_eq!(source.to_string(), "no space left");
        assert!(source.downcast_ref::<DownloadFault>().is_some());
    }

    #[test]
    fn poll_timeout_maps_to_gateway_timeout() {
        let err = RelayError::PollTimeout(Duration::from_secs(5));
        assert_eq!(err.status_code(), 504);
        assert_eq!(err.kind(), "POLL_TIMEOUT");
    }
}
