//! Relay for a hosted PuLID-FLUX image generation space.
//!
//! A request carries a prompt and an identity image reference. The relay
//! submits a job, follows the job's event stream until the `complete` record
//! arrives, downloads the image it names and hands the file back.

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod pulid;
#[cfg(feature = "server")]
pub mod server;

pub use config::{PulidConfig, RelayConfig, ServerConfig};
pub use error::{RelayError, Result};
pub use models::{DownloadedImage, GenerationParams, GenerationRequest, JobHandle};
pub use pulid::{ImagePipeline, PulidClient};
