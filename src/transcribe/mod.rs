use futures_util::FutureExt;
use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{Config, ToolConfig};
use crate::extractors::youtube::{TokioProcessRunner, YtDlp};
use crate::extractors::{resolve, ProcessRunner, RunnerError, VideoId};
use crate::utils::{count_words, format_clock};
use crate::{ErrorKind, TranscriptorError};

pub mod processor;
pub mod scratch;
pub mod selector;

pub use processor::{dedupe, Deduplicator, SrtParser};
pub use scratch::{CaptionStore, LocalCaptionStore};
pub use selector::select_candidate;

/// Cue boundary with whole-second precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CueTime(u32);

impl CueTime {
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(
            hours
                .saturating_mul(3600)
                .saturating_add(minutes.saturating_mul(60))
                .saturating_add(seconds),
        )
    }

    pub fn from_secs(seconds: u32) -> Self {
        Self(seconds)
    }

    pub fn as_secs(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CueTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_clock(self.0))
    }
}

impl Serialize for CueTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One cue of the caption track
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionSegment {
    /// Cue number from the file; gaps are normal after de-duplication
    pub index: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<CueTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<CueTime>,

    /// Cue text with line breaks folded into single spaces
    pub text: String,
}

/// Non-empty, de-duplicated sequence of caption segments
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    segments: Vec<CaptionSegment>,
}

impl Transcript {
    /// Fails with [`TranscriptorError::EmptyTranscript`] when nothing survives de-duplication
    pub fn new(segments: Vec<CaptionSegment>) -> Result<Self, TranscriptorError> {
        let segments = dedupe(segments);
        if segments.is_empty() {
            return Err(TranscriptorError::EmptyTranscript);
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[CaptionSegment] {
        &self.segments
    }

    /// Segment texts joined by newlines
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn word_count(&self) -> usize {
        count_words(&self.text())
    }
}

/// A transcript that was fetched and cleaned
#[derive(Debug, Clone)]
pub struct TranscriptSuccess {
    pub video_id: VideoId,
    pub transcript: Transcript,
    pub word_count: usize,

    /// Caption file the transcript was parsed from
    pub source_file: String,

    pub fetched_at: chrono::DateTime<chrono::Utc>,
}

/// Why a request produced no transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineFailure {
    pub kind: ErrorKind,
    pub message: String,

    /// Raw output of the captioning tool. Untrusted.
    pub detail: Option<String>,
}

impl From<TranscriptorError> for PipelineFailure {
    fn from(err: TranscriptorError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            detail: err.detail().map(str::to_string),
        }
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub enum PipelineResult {
    Success(TranscriptSuccess),
    Failure(PipelineFailure),
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success(_))
    }

    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            PipelineResult::Success(_) => None,
            PipelineResult::Failure(failure) => Some(failure.kind),
        }
    }
}

/// URL in, transcript or typed failure out.
///
/// Stateless between calls: every run gets its own scratch directory and child process, so
/// one pipeline can serve concurrent requests.
pub struct TranscriptPipeline {
    tool: YtDlp,
    runner: Arc<dyn ProcessRunner>,
    store: Arc<dyn CaptionStore>,
}

impl TranscriptPipeline {
    /// Pipeline backed by real processes and the local disk
    pub fn new(config: &Config) -> Self {
        Self::with_collaborators(
            config.tool.clone(),
            Arc::new(TokioProcessRunner::new()),
            Arc::new(LocalCaptionStore::new(config.app.temp_dir.clone())),
        )
    }

    pub fn with_collaborators(
        tool: ToolConfig,
        runner: Arc<dyn ProcessRunner>,
        store: Arc<dyn CaptionStore>,
    ) -> Self {
        Self {
            tool: YtDlp::new(tool),
            runner,
            store,
        }
    }

    /// Run the whole pipeline. Never returns an error and never panics; every fault ends up
    /// as [`PipelineResult::Failure`].
    pub async fn run(&self, url: &str) -> PipelineResult {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("transcript", %request_id, url);

        let outcome = AssertUnwindSafe(self.fetch(url))
            .catch_unwind()
            .instrument(span.clone())
            .await;

        span.in_scope(|| match outcome {
            Ok(Ok(success)) => {
                tracing::info!(
                    video_id = %success.video_id,
                    segments = success.transcript.segments().len(),
                    words = success.word_count,
                    "Transcript ready"
                );
                PipelineResult::Success(success)
            }
            Ok(Err(err)) => {
                tracing::warn!(kind = ?err.kind(), "Transcript failed: {}", err);
                PipelineResult::Failure(err.into())
            }
            Err(panic) => {
                let message = panic_message(&*panic);
                tracing::error!("Transcript pipeline panicked: {}", message);
                PipelineResult::Failure(PipelineFailure {
                    kind: ErrorKind::Unknown,
                    message,
                    detail: None,
                })
            }
        })
    }

    /// Run each URL in turn. One result per URL, in input order; a failed video never stops
    /// the rest.
    pub async fn run_batch<S: AsRef<str>>(&self, urls: &[S]) -> Vec<PipelineResult> {
        tracing::info!(count = urls.len(), "Fetching transcript batch");

        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            results.push(self.run(url.as_ref()).await);
        }

        let succeeded = results.iter().filter(|result| result.is_success()).count();
        tracing::info!(succeeded, failed = results.len() - succeeded, "Transcript batch finished");
        results
    }

    async fn fetch(&self, url: &str) -> Result<TranscriptSuccess, TranscriptorError> {
        let video_id = resolve(url).ok_or(TranscriptorError::InvalidUrl)?;
        tracing::info!(%video_id, "Fetching captions");

        // Dropped on every exit path, unwinding included
        let scratch = self.store.scratch_dir().await?;
        let result = self.fetch_into(&video_id, scratch.path()).await;

        let scratch_path = scratch.path().to_path_buf();
        if let Err(err) = scratch.close() {
            tracing::warn!("Failed to remove scratch directory {}: {}", scratch_path.display(), err);
        }

        result
    }

    async fn fetch_into(
        &self,
        video_id: &VideoId,
        scratch_dir: &Path,
    ) -> Result<TranscriptSuccess, TranscriptorError> {
        let tool = self.tool.binary();
        let invocation = self.tool.subtitle_invocation(video_id, scratch_dir);

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|err| match err {
                RunnerError::NotFound(_) => TranscriptorError::ToolNotInstalled(tool.to_string()),
                RunnerError::TimedOut { timeout, .. } => TranscriptorError::ToolTimedOut {
                    tool: tool.to_string(),
                    timeout,
                },
                RunnerError::Io(source) => TranscriptorError::ToolSpawn {
                    tool: tool.to_string(),
                    source,
                },
            })?;

        if !output.success {
            tracing::debug!(exit_code = ?output.exit_code, "Captioning tool failed");
            return Err(TranscriptorError::ToolFailed {
                tool: tool.to_string(),
                detail: output.diagnostics(),
            });
        }

        let files = self.store.srt_files(scratch_dir).await?;
        tracing::debug!(?files, "Caption files written");

        let selected = select_candidate(&files, video_id.as_str()).ok_or_else(|| {
            TranscriptorError::NoSubtitles {
                detail: output.diagnostics(),
            }
        })?;
        tracing::debug!(file = %selected, "Selected caption file");

        let content = self.store.read_to_string(&scratch_dir.join(&selected)).await?;
        let transcript = Transcript::new(SrtParser::parse(&content))?;
        let word_count = transcript.word_count();

        Ok(TranscriptSuccess {
            video_id: video_id.clone(),
            transcript,
            word_count,
            source_file: selected,
            fetched_at: chrono::Utc::now(),
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unexpected internal error".to_string()
    }
}
