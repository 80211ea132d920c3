use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{ProcessRunner, RunnerError, ToolInvocation, ToolOutput, VideoId};
use crate::config::ToolConfig;

/// Builds `yt-dlp` calls that fetch caption tracks only
#[derive(Debug, Clone)]
pub struct YtDlp {
    config: ToolConfig,
}

impl YtDlp {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    pub fn binary(&self) -> &str {
        &self.config.binary
    }

    /// Subtitle-only invocation writing `<id>.<lang>.srt` files into `scratch_dir`
    pub fn subtitle_invocation(&self, video_id: &VideoId, scratch_dir: &Path) -> ToolInvocation {
        let out_template = scratch_dir.join(format!("{}.%(ext)s", video_id));

        let mut args: Vec<String> = vec![
            // Authored and auto-generated tracks
            "--write-auto-subs".into(),
            "--write-subs".into(),
            "--sub-langs".into(),
            self.config.sub_langs.clone(),
            // Captions only, no media
            "--skip-download".into(),
            "--sub-format".into(),
            "vtt".into(),
            "--convert-subs".into(),
            "srt".into(),
            "--no-playlist".into(),
            "--output".into(),
            out_template.to_string_lossy().into_owned(),
        ];

        args.extend(self.config.extra_args.iter().cloned());
        args.push(video_id.watch_url());

        ToolInvocation {
            program: self.config.binary.clone(),
            args,
            working_dir: scratch_dir.to_path_buf(),
            timeout: self.config.timeout(),
        }
    }
}

/// Spawns real child processes with tokio
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, RunnerError> {
        tracing::debug!(
            program = %invocation.program,
            args = ?invocation.args,
            cwd = %invocation.working_dir.display(),
            "Spawning external tool"
        );

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the future on timeout must not leave the process behind
            .kill_on_drop(true);
        let child = command.output();

        let result = match invocation.timeout {
            Some(limit) => tokio::time::timeout(limit, child).await.map_err(|_| {
                RunnerError::TimedOut {
                    program: invocation.program.clone(),
                    timeout: limit,
                }
            })?,
            None => child.await,
        };

        let output = result.map_err(|err| match err.kind() {
            ErrorKind::NotFound => RunnerError::NotFound(invocation.program.clone()),
            _ => RunnerError::Io(err),
        })?;

        Ok(ToolOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::resolve;
    use std::path::PathBuf;
    use std::time::Duration;

    fn tool_config() -> ToolConfig {
        ToolConfig {
            extra_args: vec!["--cookies".into(), "cookies.txt".into()],
            ..ToolConfig::default()
        }
    }

    #[test]
    fn test_subtitle_invocation() {
        let id = resolve("https://youtu.be/dQw4w9WgXcQ").unwrap();
        let scratch = PathBuf::from("/tmp/yt-transcript-test");
        let invocation = YtDlp::new(tool_config()).subtitle_invocation(&id, &scratch);

        assert_eq!(invocation.program, "yt-dlp");
        assert_eq!(invocation.working_dir, scratch);
        assert_eq!(invocation.timeout, Some(Duration::from_secs(120)));

        let args = &invocation.args;
        for flag in ["--write-auto-subs", "--write-subs", "--skip-download"] {
            assert!(args.iter().any(|a| a == flag), "missing {flag}");
        }
        let langs = args.iter().position(|a| a == "--sub-langs").unwrap();
        assert_eq!(args[langs + 1], "en.*");
        let convert = args.iter().position(|a| a == "--convert-subs").unwrap();
        assert_eq!(args[convert + 1], "srt");
        let output = args.iter().position(|a| a == "--output").unwrap();
        assert_eq!(args[output + 1], "/tmp/yt-transcript-test/dQw4w9WgXcQ.%(ext)s");

        // Extra args go before the URL, which is always last
        assert_eq!(
            &args[args.len() - 3..],
            &[
                "--cookies".to_string(),
                "cookies.txt".to_string(),
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let scratch = tempfile::tempdir().unwrap();
        let invocation = ToolInvocation {
            program: "yt-transcript-definitely-missing-binary".into(),
            args: vec![],
            working_dir: scratch.path().to_path_buf(),
            timeout: None,
        };

        let err = TokioProcessRunner::new().run(&invocation).await.unwrap_err();
        assert!(matches!(err, RunnerError::NotFound(ref p) if p == "yt-transcript-definitely-missing-binary"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_data() {
        let scratch = tempfile::tempdir().unwrap();
        let invocation = ToolInvocation {
            program: "sh".into(),
            args: vec!["-c".into(), "echo oops >&2; exit 3".into()],
            working_dir: scratch.path().to_path_buf(),
            timeout: Some(Duration::from_secs(10)),
        };

        let output = tokio_test::assert_ok!(TokioProcessRunner::new().run(&invocation).await);
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.diagnostics(), "oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let scratch = tempfile::tempdir().unwrap();
        let invocation = ToolInvocation {
            program: "sleep".into(),
            args: vec!["5".into()],
            working_dir: scratch.path().to_path_buf(),
            timeout: Some(Duration::from_millis(100)),
        };

        let err = TokioProcessRunner::new().run(&invocation).await.unwrap_err();
        assert!(matches!(err, RunnerError::TimedOut { .. }));
    }
}
