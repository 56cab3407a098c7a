#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Event,
    Data,
    Blank,
    Other,
}

/// One line of the job event stream, classified by its prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFrame<'a> {
    pub kind: FrameKind,
    /// Trimmed remainder after the `event:`/`data:` prefix; the raw line for `Other`.
    pub payload: &'a str,
}

impl<'a> StreamFrame<'a> {
    pub fn parse(line: &'a str) -> Self {
        if line.is_empty() {
            StreamFrame {
                kind: FrameKind::Blank,
                payload: "",
            }
        } else if let Some(rest) = line.strip_prefix("event:") {
            StreamFrame {
                kind: FrameKind::Event,
                payload: rest.trim(),
            }
        } else if let Some(rest) = line.strip_prefix("data:") {
            StreamFrame {
                kind: FrameKind::Data,
                payload: rest.trim(),
            }
        } else {
            StreamFrame {
                kind: FrameKind::Other,
                payload: line,
            }
        }
    }
}

/// `data:` payloads collected after a `complete` marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionBuffer {
    lines: Vec<String>,
}

impl CompletionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}
