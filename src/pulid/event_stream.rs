use crate::{
    error::{RelayError, Result},
    models::{CompletionBuffer, FrameKind, JobHandle, StreamFrame},
};
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use std::time::Duration;

const COMPLETE_EVENT: &str = "complete";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Complete,
}

/// Line-at-a-time state machine over the job event stream.
///
/// Only `data:` lines that arrive after an `event: complete` marker are kept,
/// and the record ends at the next blank line once at least one of them has
/// been collected. A blank line in any other situation starts a new frame and
/// drops whatever was collected so far. The marker itself is sticky: it is not
/// cleared by a frame boundary, so data in later frames is collected too.
#[derive(Debug, Default)]
pub struct CompletionTracker {
    complete_seen: bool,
    buffer: CompletionBuffer,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete_seen(&self) -> bool {
        self.complete_seen
    }

    pub fn feed(&mut self, line: &str) -> Step {
        let frame = StreamFrame::parse(line);

        match frame.kind {
            FrameKind::Blank => {
                if self.complete_seen && !self.buffer.is_empty() {
                    return Step::Complete;
                }
                self.buffer.clear();
            }
            FrameKind::Event => {
                log::debug!("Stream event: {}", frame.payload);
                if frame.payload == COMPLETE_EVENT {
                    self.complete_seen = true;
                }
            }
            FrameKind::Data => {
                if self.complete_seen {
                    self.buffer.push(frame.payload);
                } else {
                    log::trace!("Discarding data before complete event: {}", frame.payload);
                }
            }
            FrameKind::Other => {}
        }

        Step::Continue
    }

    /// Hands out the collected record. Also called at end of stream, where a
    /// marked, non-empty buffer counts as a finished record.
    pub fn finish(self) -> Result<CompletionBuffer> {
        if self.complete_seen && !self.buffer.is_empty() {
            Ok(self.buffer)
        } else {
            Err(RelayError::NoCompletionData)
        }
    }
}

/// Longest line accepted from the event stream.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Splits a chunked byte stream into lines. Bytes are held until a `\n`
/// arrives, so neither lines nor UTF-8 sequences are cut at chunk borders.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no `\n`.
    scanned: usize,
    max_line: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    pub fn with_limit(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            scanned: 0,
            max_line,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start + self.scanned..]
            .iter()
            .position(|&b| b == b'\n')
        {
            let end = start + self.scanned + offset;
            lines.push(decode_line(&self.pending[start..end]));
            start = end + 1;
            self.scanned = 0;
        }

        self.pending.drain(..start);
        self.scanned = self.pending.len();

        if self.pending.len() > self.max_line {
            return Err(RelayError::StreamLineTooLong {
                limit: self.max_line,
            });
        }
        Ok(lines)
    }

    /// Trailing text that never got its newline.
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        if self.pending.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        Some(decode_line(&line))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Waits on `{api_url}/{event_id}` for the job's completion record.
#[derive(Clone)]
pub struct EventStreamClient {
    client: Client,
    api_url: String,
    timeout: Option<Duration>,
}

impl EventStreamClient {
    pub fn new(client: Client, api_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            timeout,
        }
    }

    pub async fn wait_for_completion(&self, job: &JobHandle) -> Result<CompletionBuffer> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.read_stream(job))
                .await
                .map_err(|_| {
                    log::error!("No complete event for {} within {:?}", job.event_id, limit);
                    RelayError::PollTimeout(limit)
                })?,
            None => self.read_stream(job).await,
        }
    }

    async fn read_stream(&self, job: &JobHandle) -> Result<CompletionBuffer> {
        let url = job.poll_url(&self.api_url);
        log::info!("Polling event stream: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(RelayError::StreamRead)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    log::debug!("Could not read error body from event stream: {}", e);
                    String::new()
                }
            };
            log::error!("Event stream answered with status {}", status);
            return Err(RelayError::Poll {
                status: status.as_u16(),
                body,
            });
        }

        let mut tracker = CompletionTracker::new();
        let mut lines = LineBuffer::default();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(RelayError::StreamRead)?;
            for line in lines.push(&chunk)? {
                if tracker.feed(&line) == Step::Complete {
                    log::info!("Complete event received for {}", job.event_id);
                    return tracker.finish();
                }
            }
        }

        if let Some(line) = lines.finish() {
            tracker.feed(&line);
        }

        log::debug!(
            "Event stream for {} closed (complete seen: {})",
            job.event_id,
            tracker.complete_seen()
        );
        tracker.finish()
    }
}
