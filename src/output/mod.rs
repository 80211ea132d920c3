use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::transcribe::TranscriptSuccess;

pub mod formatters;

pub use formatters::*;

/// Render a transcript in the requested format
pub fn render(success: &TranscriptSuccess, format: OutputFormat, include_timestamps: bool) -> Result<String> {
    let content = match format {
        OutputFormat::Text => format_as_text(success, include_timestamps),
        OutputFormat::Json => format_as_json(success)?,
        OutputFormat::Srt => format_as_srt(success),
    };
    Ok(content)
}

/// Save transcript to a file. A directory target gets `transcript_<id>.<ext>` inside it.
pub async fn save_to_file(
    success: &TranscriptSuccess,
    path: &Path,
    format: OutputFormat,
    include_timestamps: bool,
) -> Result<PathBuf> {
    let target = if path.is_dir() {
        path.join(success.video_id.transcript_filename(format.extension()))
    } else {
        path.to_path_buf()
    };

    let content = render(success, format, include_timestamps)?;

    fs_err::write(&target, content).context("Failed to write transcript")?;
    Ok(target)
}

/// Print transcript to console
pub fn print_to_console(success: &TranscriptSuccess, format: OutputFormat, include_timestamps: bool) -> Result<()> {
    let content = render(success, format, include_timestamps)?;

    println!("{}", content);
    Ok(())
}
