/// Collapse every whitespace run to a single space and trim both ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-delimited tokens
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Format whole seconds as `HH:MM:SS` (hours grow past two digits as needed)
pub fn format_clock(total_seconds: u32) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Check if the current environment has required tools
pub async fn check_dependencies(tool: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(tool).await {
        missing.push(format!("{} - required to fetch subtitles", tool));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  hello \t  world\n"), "hello world");
        assert_eq!(normalize_whitespace("   "), "");
        assert_eq!(normalize_whitespace("one"), "one");
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("hello world\ngoodbye"), 3);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("  spaced   out  "), 2);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(75), "00:01:15");
        assert_eq!(format_clock(3661), "01:01:01");
        assert_eq!(format_clock(360_000), "100:00:00");
    }

    #[tokio::test]
    async fn test_missing_tool_reported() {
        let missing = check_dependencies("yt-transcript-no-such-tool").await;
        assert_eq!(missing.len(), 1);
        assert!(missing[0].starts_with("yt-transcript-no-such-tool"));
    }
}
