use serde::Serialize;
use std::path::PathBuf;

/// A generated image saved to the local output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedImage {
    /// Final segment of the remote path, used as the local file name.
    pub filename: String,
    pub path: PathBuf,
    /// The path reported by the space, before the download prefix was applied.
    pub remote_path: String,
    pub bytes_written: u64,
}
