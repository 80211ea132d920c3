use anyhow::Result;
use serde::Serialize;

use crate::extractors::VideoId;
use crate::transcribe::{CaptionSegment, CueTime, PipelineFailure, PipelineResult, TranscriptSuccess};
use crate::ErrorKind;

/// JSON shape returned by the HTTP endpoint and `--format json`
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<CaptionSegment>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<VideoId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,

    /// Raw tool output; clients must escape it before display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TranscriptResponse {
    pub fn success(success: &TranscriptSuccess) -> Self {
        Self {
            success: true,
            transcript: Some(success.transcript.text()),
            segments: Some(success.transcript.segments().to_vec()),
            video_id: Some(success.video_id.clone()),
            word_count: Some(success.word_count),
            fetched_at: Some(success.fetched_at),
            error: None,
            kind: None,
            detail: None,
        }
    }

    pub fn failure(failure: &PipelineFailure) -> Self {
        Self {
            success: false,
            transcript: None,
            segments: None,
            video_id: None,
            word_count: None,
            fetched_at: None,
            error: Some(failure.message.clone()),
            kind: Some(failure.kind),
            detail: failure.detail.clone(),
        }
    }
}

impl From<&PipelineResult> for TranscriptResponse {
    fn from(result: &PipelineResult) -> Self {
        match result {
            PipelineResult::Success(success) => Self::success(success),
            PipelineResult::Failure(failure) => Self::failure(failure),
        }
    }
}

/// One video of a batch. `video_id` and `text` are `null` when the video failed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub url: String,
    pub video_id: Option<VideoId>,
    pub word_count: usize,
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<CaptionSegment>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl BatchEntry {
    pub fn new(url: &str, result: &PipelineResult) -> Self {
        match result {
            PipelineResult::Success(success) => Self {
                url: url.to_string(),
                video_id: Some(success.video_id.clone()),
                word_count: success.word_count,
                text: Some(success.transcript.text()),
                segments: Some(success.transcript.segments().to_vec()),
                error: None,
                kind: None,
            },
            PipelineResult::Failure(failure) => Self {
                url: url.to_string(),
                video_id: None,
                word_count: 0,
                text: None,
                segments: None,
                error: Some(failure.message.clone()),
                kind: Some(failure.kind),
            },
        }
    }
}

/// Results of a multi-video fetch, in request order
#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub transcripts: Vec<BatchEntry>,
}

impl BatchResponse {
    pub fn new<S: AsRef<str>>(urls: &[S], results: &[PipelineResult]) -> Self {
        Self {
            transcripts: urls
                .iter()
                .zip(results)
                .map(|(url, result)| BatchEntry::new(url.as_ref(), result))
                .collect(),
        }
    }
}

/// Plain transcript, one segment per line
pub fn format_as_text(success: &TranscriptSuccess, include_timestamps: bool) -> String {
    if !include_timestamps {
        return success.transcript.text();
    }

    success
        .transcript
        .segments()
        .iter()
        .map(|segment| match segment.start {
            Some(start) => format!("[{}] {}", start, segment.text),
            None => segment.text.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_as_json(success: &TranscriptSuccess) -> Result<String> {
    Ok(serde_json::to_string_pretty(&TranscriptResponse::success(success))?)
}

/// Re-emit the cleaned segments as SRT, numbered from 1
pub fn format_as_srt(success: &TranscriptSuccess) -> String {
    let srt_time = |time: Option<CueTime>| format!("{},000", time.unwrap_or(CueTime::from_secs(0)));

    let mut out = String::new();
    for (number, segment) in success.transcript.segments().iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            number + 1,
            srt_time(segment.start),
            srt_time(segment.end),
            segment.text
        ));
    }
    out
}
