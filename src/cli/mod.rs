use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "yt-transcript",
    about = "Fetch a clean, de-duplicated transcript from a YouTube video's captions",
    version,
    long_about = "Downloads the existing English caption track (authored or auto-generated) of a YouTube video with yt-dlp and turns it into plain text, with repeated auto-caption lines removed. Nothing is transcribed from audio."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Path to a config file (defaults to ./config.yaml, then the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the transcript of a video
    Transcript {
        /// Video URL (watch, youtu.be, embed, shorts) or bare 11-character video id
        #[arg(value_name = "URL")]
        url: String,

        /// Output file or directory (prints to console if not specified)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Prefix each text line with its start time
        #[arg(long)]
        timestamps: bool,

        /// Captioning tool to run instead of the configured one
        #[arg(long, value_name = "BIN", env = "YT_TRANSCRIPT_TOOL")]
        tool: Option<String>,

        /// Seconds to wait for the captioning tool
        #[arg(long, value_name = "SECS", env = "YT_TRANSCRIPT_TIMEOUT")]
        timeout: Option<u64>,
    },

    /// Fetch the transcripts of several videos as one JSON document
    Batch {
        /// Video URLs or ids, fetched in order
        #[arg(value_name = "URL", required = true, num_args = 1..)]
        urls: Vec<String>,

        /// Output file (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Captioning tool to run instead of the configured one
        #[arg(long, value_name = "BIN", env = "YT_TRANSCRIPT_TOOL")]
        tool: Option<String>,

        /// Seconds to wait for the captioning tool, per video
        #[arg(long, value_name = "SECS", env = "YT_TRANSCRIPT_TIMEOUT")]
        timeout: Option<u64>,
    },

    /// Serve transcripts over HTTP
    Serve {
        /// Listen address (defaults to the configured one)
        #[arg(short, long, value_name = "ADDR", env = "YT_TRANSCRIPT_BIND")]
        bind: Option<String>,
    },

    /// Show or initialise the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write the current configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON with segments and metadata
    Json,
    /// De-duplicated SRT
    Srt,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Srt => "srt",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_batch() {
        let cli = Cli::try_parse_from(["yt-transcript", "batch", "dQw4w9WgXcQ", "https://youtu.be/9bZkp7q19f0"])
            .unwrap();

        match cli.command {
            Commands::Batch { urls, output, .. } => {
                assert_eq!(urls, vec!["dQw4w9WgXcQ", "https://youtu.be/9bZkp7q19f0"]);
                assert!(output.is_none());
            }
            _ => panic!("expected batch command"),
        }

        assert!(Cli::try_parse_from(["yt-transcript", "batch"]).is_err());
    }

    #[test]
    fn test_parse_transcript() {
        let cli = Cli::try_parse_from([
            "yt-transcript",
            "transcript",
            "https://youtu.be/dQw4w9WgXcQ",
            "-f",
            "srt",
            "--timeout",
            "30",
        ])
        .unwrap();

        match cli.command {
            Commands::Transcript { url, format, timeout, .. } => {
                assert_eq!(url, "https://youtu.be/dQw4w9WgXcQ");
                assert_eq!(format, Some(OutputFormat::Srt));
                assert_eq!(timeout, Some(30));
            }
            _ => panic!("expected transcript command"),
        }
    }
}
