use crate::{
    error::{RelayError, Result},
    models::DownloadedImage,
};
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::{
    fs::{self, File},
    io::{AsyncWriteExt, BufWriter},
};

pub const DOWNLOAD_CHUNK_SIZE: usize = 1024;

#[derive(Clone)]
pub struct FileClient {
    client: Client,
    download_url: String,
    output_dir: PathBuf,
    timeout: Option<Duration>,
}

impl FileClient {
    pub fn new(
        client: Client,
        download_url: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            client,
            download_url: download_url.into(),
            output_dir: output_dir.into(),
            timeout,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Download URL is the configured prefix with the remote path appended verbatim.
    pub fn url_for(&self, remote_path: &str) -> String {
        format!("{}{}", self.download_url, remote_path)
    }

    pub async fn download(&self, remote_path: &str) -> Result<DownloadedImage> {
        let filename = local_filename(remote_path)?.to_string();
        let url = self.url_for(remote_path);

        log::info!("Downloading image from {}", url);

        let mut request = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RelayError::download_fault(format!("request failed: {}", e), e))?;

        let status = response.status();
        if status != StatusCode::OK {
            log::error!("Image download failed with status {}", status);
            return Err(RelayError::download_status(status.as_u16()));
        }

        let path = self.output_dir.join(&filename);
        let part_path = self.output_dir.join(format!("{}.part", filename));

        let saved = match write_body(response, &part_path).await {
            Ok(bytes_written) => fs::rename(&part_path, &path)
                .await
                .map(|_| bytes_written)
                .map_err(|e| {
                    RelayError::download_fault(format!("moving into {}: {}", path.display(), e), e)
                }),
            Err(e) => Err(e),
        };

        // the previous file under this name, if any, is only replaced by a complete body
        let bytes_written = match saved {
            Ok(bytes_written) => bytes_written,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&part_path).await {
                    log::debug!("Could not remove {}: {}", part_path.display(), cleanup);
                }
                log::error!("Image download into {} failed: {}", path.display(), e);
                return Err(e);
            }
        };

        log::info!("Saved {} ({} bytes)", path.display(), bytes_written);

        Ok(DownloadedImage {
            filename,
            path,
            remote_path: remote_path.to_string(),
            bytes_written,
        })
    }
}

/// Streams the response body into `part_path`; the caller renames it once complete.
async fn write_body(response: Response, part_path: &Path) -> Result<u64> {
    let file = File::create(part_path).await.map_err(|e| {
        RelayError::download_fault(format!("{}: {}", part_path.display(), e), e)
    })?;
    let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);

    let mut bytes_written = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| RelayError::download_fault(format!("reading body: {}", e), e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| RelayError::download_fault(format!("writing body: {}", e), e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| RelayError::download_fault(format!("flushing body: {}", e), e))?;

    Ok(bytes_written)
}

/// Final `/` segment of the remote path. Segments that cannot name a file in
/// the output directory are refused.
pub fn local_filename(remote_path: &str) -> Result<&str> {
    let name = remote_path.rsplit('/').next().unwrap_or(remote_path);
    if matches!(name, "" | "." | "..") || name.contains('\\') {
        return Err(RelayError::download(format!(
            "remote path {:?} has no usable file name",
            remote_path
        )));
    }
    Ok(name)
}
