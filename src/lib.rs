//! yt-transcript - pull the existing caption track of a video and turn it into a clean transcript
//!
//! This library resolves a video identifier from a URL, asks `yt-dlp` for the English
//! caption tracks (authored or auto-generated) as SRT, picks the best file, and parses it
//! into a de-duplicated, timestamped transcript.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod server;
pub mod transcribe;
pub mod utils;

use serde::Serialize;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{resolve, ProcessRunner, VideoId};
pub use transcribe::{PipelineResult, Transcript, TranscriptPipeline};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Coarse classification of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The input did not look like any supported URL shape
    InvalidInput,
    /// The captioning tool binary could not be spawned
    ToolNotInstalled,
    /// The captioning tool ran and exited with a failure status
    ExternalToolError,
    /// The captioning tool did not finish within the configured limit
    Timeout,
    /// The tool succeeded but produced no usable caption file
    NotFound,
    /// A caption file existed but held no text after cleanup
    EmptyResult,
    Unknown,
}

/// Error types specific to the transcript pipeline
#[derive(thiserror::Error, Debug)]
pub enum TranscriptorError {
    #[error("Invalid YouTube URL")]
    InvalidUrl,

    #[error("{0} is not installed")]
    ToolNotInstalled(String),

    #[error("{tool} failed to fetch subtitles")]
    ToolFailed { tool: String, detail: String },

    #[error("{tool} timed out after {}s", .timeout.as_secs())]
    ToolTimedOut {
        tool: String,
        timeout: std::time::Duration,
    },

    #[error("No transcripts/subtitles found for this video")]
    NoSubtitles { detail: String },

    #[error("Transcript text was empty after de-dupe")]
    EmptyTranscript,

    #[error("Failed to run {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Unknown(String),
}

impl TranscriptorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranscriptorError::InvalidUrl => ErrorKind::InvalidInput,
            TranscriptorError::ToolNotInstalled(_) => ErrorKind::ToolNotInstalled,
            TranscriptorError::ToolFailed { .. } => ErrorKind::ExternalToolError,
            TranscriptorError::ToolTimedOut { .. } => ErrorKind::Timeout,
            TranscriptorError::NoSubtitles { .. } => ErrorKind::NotFound,
            TranscriptorError::EmptyTranscript => ErrorKind::EmptyResult,
            TranscriptorError::ToolSpawn { .. }
            | TranscriptorError::Io(_)
            | TranscriptorError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Raw tool output attached to the failure, if any. Not sanitized.
    pub fn detail(&self) -> Option<&str> {
        match self {
            TranscriptorError::ToolFailed { detail, .. }
            | TranscriptorError::NoSubtitles { detail } => {
                Some(detail.as_str()).filter(|d| !d.is_empty())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_labels() {
        assert_eq!(TranscriptorError::InvalidUrl.to_string(), "Invalid YouTube URL");
        assert_eq!(
            TranscriptorError::ToolNotInstalled("yt-dlp".into()).to_string(),
            "yt-dlp is not installed"
        );
        assert_eq!(
            TranscriptorError::ToolTimedOut {
                tool: "yt-dlp".into(),
                timeout: Duration::from_secs(90),
            }
            .to_string(),
            "yt-dlp timed out after 90s"
        );
    }

    #[test]
    fn test_kind_and_detail() {
        let err = TranscriptorError::ToolFailed {
            tool: "yt-dlp".into(),
            detail: "ERROR: Private video".into(),
        };
        assert_eq!(err.kind(), ErrorKind::ExternalToolError);
        assert_eq!(err.detail(), Some("ERROR: Private video"));

        let empty = TranscriptorError::NoSubtitles { detail: String::new() };
        assert_eq!(empty.kind(), ErrorKind::NotFound);
        assert_eq!(empty.detail(), None);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ToolNotInstalled).unwrap();
        assert_eq!(json, "\"tool_not_installed\"");
    }
}
