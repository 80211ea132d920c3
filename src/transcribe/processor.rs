use regex::Regex;
use std::sync::LazyLock;

use super::{CaptionSegment, CueTime};
use crate::utils::normalize_whitespace;

// Only HH:MM:SS of each side is kept; the fractional part is matched and dropped.
static TIMING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2})[,.]\d+\s*-->\s*(\d{2,}):(\d{2}):(\d{2})[,.]\d+")
        .expect("timing pattern is valid")
});

/// Streaming filter that drops a segment when its normalized text is empty or equal to the
/// normalized text of the last segment it let through.
#[derive(Debug, Default)]
pub struct Deduplicator {
    last: Option<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `text` should be kept
    pub fn admit(&mut self, text: &str) -> bool {
        let normalized = normalize_whitespace(text);
        if normalized.is_empty() || self.last.as_deref() == Some(normalized.as_str()) {
            return false;
        }
        self.last = Some(normalized);
        true
    }
}

/// Remove segments repeating the previous survivor. Order is preserved.
pub fn dedupe(segments: Vec<CaptionSegment>) -> Vec<CaptionSegment> {
    let mut dedup = Deduplicator::new();
    segments
        .into_iter()
        .filter(|segment| dedup.admit(&segment.text))
        .collect()
}

/// Cue being assembled
#[derive(Debug)]
struct PendingCue {
    index: u64,
    start: Option<CueTime>,
    end: Option<CueTime>,
    lines: Vec<String>,
}

impl PendingCue {
    fn new(index: u64) -> Self {
        Self {
            index,
            start: None,
            end: None,
            lines: Vec::new(),
        }
    }
}

#[derive(Debug)]
enum ParserState {
    ExpectIndex,
    ExpectTiming(PendingCue),
    CollectText(PendingCue),
}

/// Line-driven SRT state machine.
///
/// Blank lines are ignored while waiting for an index or a timing line and close the cue
/// while collecting text. A cue is emitted only if it survives the [`Deduplicator`], so the
/// output never holds two adjacent segments with the same normalized text.
#[derive(Debug)]
pub struct SrtParser {
    state: ParserState,
    dedup: Deduplicator,
    segments: Vec<CaptionSegment>,
}

impl Default for SrtParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SrtParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::ExpectIndex,
            dedup: Deduplicator::new(),
            segments: Vec::new(),
        }
    }

    /// Parse a whole caption file
    pub fn parse(text: &str) -> Vec<CaptionSegment> {
        let mut parser = Self::new();
        for line in text.trim_start_matches('\u{feff}').lines() {
            parser.feed_line(line);
        }
        parser.finish()
    }

    pub fn feed_line(&mut self, raw: &str) {
        let line = raw.trim();

        let state = std::mem::replace(&mut self.state, ParserState::ExpectIndex);
        self.state = match state {
            ParserState::ExpectIndex => match parse_index(line) {
                Some(index) => ParserState::ExpectTiming(PendingCue::new(index)),
                // blank or stray text between cues
                None => ParserState::ExpectIndex,
            },
            ParserState::ExpectTiming(mut cue) => {
                if line.is_empty() {
                    ParserState::ExpectTiming(cue)
                } else if let Some((start, end)) = parse_timing(line) {
                    cue.start = Some(start);
                    cue.end = Some(end);
                    ParserState::CollectText(cue)
                } else if line.contains("-->") {
                    tracing::debug!(index = cue.index, line, "Malformed timing line, keeping cue without times");
                    ParserState::CollectText(cue)
                } else if let Some(index) = parse_index(line) {
                    // index without timing or text; the new index takes over
                    ParserState::ExpectTiming(PendingCue::new(index))
                } else {
                    // no timing line: the cue is dropped and the stray line skipped
                    tracing::debug!(index = cue.index, line, "Cue has no timing line, dropping it");
                    ParserState::ExpectIndex
                }
            }
            ParserState::CollectText(mut cue) => {
                if line.is_empty() {
                    self.commit(cue);
                    ParserState::ExpectIndex
                } else if let Some(index) = parse_index(line) {
                    self.commit(cue);
                    ParserState::ExpectTiming(PendingCue::new(index))
                } else {
                    cue.lines.push(line.to_string());
                    ParserState::CollectText(cue)
                }
            }
        };
    }

    /// Flush the last cue. An index with no text after it is dropped.
    pub fn finish(mut self) -> Vec<CaptionSegment> {
        let state = std::mem::replace(&mut self.state, ParserState::ExpectIndex);
        if let ParserState::CollectText(cue) = state {
            self.commit(cue);
        }
        self.segments
    }

    fn commit(&mut self, cue: PendingCue) {
        let text = cue.lines.join(" ");
        if self.dedup.admit(&text) {
            self.segments.push(CaptionSegment {
                index: cue.index,
                start: cue.start,
                end: cue.end,
                text,
            });
        }
    }
}

fn parse_index(line: &str) -> Option<u64> {
    if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // overlong indices are still indices; the number is only diagnostic
    Some(line.parse().unwrap_or(u64::MAX))
}

fn parse_timing(line: &str) -> Option<(CueTime, CueTime)> {
    let caps = TIMING_LINE.captures(line)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let start = CueTime::from_hms(field(1)?, field(2)?, field(3)?);
    let end = CueTime::from_hms(field(4)?, field(5)?, field(6)?);
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(segments: &[CaptionSegment]) -> Vec<&str> {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    const HELLO_GOODBYE: &str = "1\n00:00:01,000 --> 00:00:03,000\nhello world\n\n2\n00:00:03,000 --> 00:00:05,000\nhello world\n\n3\n00:00:05,000 --> 00:00:07,000\ngoodbye\n";

    #[test]
    fn test_repeated_cue_collapses() {
        let segments = SrtParser::parse(HELLO_GOODBYE);

        assert_eq!(texts(&segments), vec!["hello world", "goodbye"]);
        assert_eq!(segments[0].index, 1);
        assert_eq!(segments[0].start, Some(CueTime::from_hms(0, 0, 1)));
        assert_eq!(segments[0].end, Some(CueTime::from_hms(0, 0, 3)));
        assert_eq!(segments[1].index, 3);
        assert_eq!(segments[1].start.unwrap().to_string(), "00:00:05");
    }

    #[test]
    fn test_distinct_cues_kept_in_order() {
        let srt = "1\n00:00:00,000 --> 00:00:01,500\nfirst\n\n2\n00:00:01,500 --> 00:00:02,000\nsecond\n\n3\n00:00:02,000 --> 00:00:04,000\nthird\n\n4\n00:00:04,000 --> 00:00:05,000\nfirst\n";
        let segments = SrtParser::parse(srt);

        // Only adjacent repeats are removed
        assert_eq!(texts(&segments), vec!["first", "second", "third", "first"]);
        let indices: Vec<u64> = segments.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_whitespace_only_difference_collapses_keeping_first_text() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nhello   there  world\n\n2\n00:00:02,000 --> 00:00:03,000\nhello there\nworld\n";
        let segments = SrtParser::parse(srt);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "hello   there  world");
    }

    #[test]
    fn test_multiline_cue_joined_with_spaces() {
        let srt = "1\n00:00:01,000 --> 00:00:04,000\n  first line  \nsecond line\nthird\n";
        let segments = SrtParser::parse(srt);

        assert_eq!(texts(&segments), vec!["first line second line third"]);
    }

    #[test]
    fn test_leading_and_trailing_blank_lines_and_crlf() {
        let srt = "\u{feff}\r\n\r\n1\r\n00:00:01,000 --> 00:00:02,000\r\nhi\r\n\r\n\r\n2\r\n00:00:02,000 --> 00:00:03,000\r\nthere\r\n\r\n\r\n";
        let segments = SrtParser::parse(srt);

        assert_eq!(texts(&segments), vec!["hi", "there"]);
    }

    #[test]
    fn test_blank_line_between_index_and_timing_is_skipped() {
        let srt = "1\n\n00:00:01,000 --> 00:00:02,000\nhi\n";
        let segments = SrtParser::parse(srt);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, Some(CueTime::from_hms(0, 0, 1)));
    }

    // A broken timing line does not drop the cue
    #[test]
    fn test_malformed_timing_line_keeps_cue_without_times() {
        let srt = "1\n00:00:01 --> later\nstill here\n\n2\n00:00:05,000 --> 00:00:06,000\nnext\n";
        let segments = SrtParser::parse(srt);

        assert_eq!(texts(&segments), vec!["still here", "next"]);
        assert_eq!(segments[0].start, None);
        assert_eq!(segments[0].end, None);
        assert_eq!(segments[1].start, Some(CueTime::from_hms(0, 0, 5)));
    }

    #[test]
    fn test_missing_timing_line_drops_cue() {
        let srt = "1\njust text\n\n2\n00:00:05,000 --> 00:00:06,000\nnext\n";
        let segments = SrtParser::parse(srt);

        assert_eq!(texts(&segments), vec!["next"]);
        assert_eq!(segments[0].index, 2);
    }

    #[test]
    fn test_header_after_number_is_not_text() {
        let srt = "5\nWEBVTT-ish header\nKind: captions\n\n6\n00:00:05,000 --> 00:00:06,000\nreal\n";
        let segments = SrtParser::parse(srt);

        assert_eq!(texts(&segments), vec!["real"]);
        assert_eq!(segments[0].index, 6);
    }

    #[test]
    fn test_timing_variants() {
        let srt = "7\n01:02:03.456 --> 101:00:00.000 position:10% align:start\nlate\n";
        let segments = SrtParser::parse(srt);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start.unwrap().as_secs(), 3723);
        assert_eq!(segments[0].end.unwrap().to_string(), "101:00:00");
    }

    #[test]
    fn test_incomplete_trailing_data_dropped() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nkept\n\n2\n00:00:02,000 --> 00:00:03,000\n\n3";
        let segments = SrtParser::parse(srt);

        assert_eq!(texts(&segments), vec!["kept"]);
    }

    #[test]
    fn test_numeric_line_starts_new_cue() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nthe year\n2024\n00:00:02,000 --> 00:00:03,000\nwas long\n";
        let segments = SrtParser::parse(srt);

        assert_eq!(texts(&segments), vec!["the year", "was long"]);
        assert_eq!(segments[1].index, 2024);
    }

    #[test]
    fn test_empty_and_garbage_input() {
        assert!(SrtParser::parse("").is_empty());
        assert!(SrtParser::parse("\n\n   \n").is_empty());
        assert!(SrtParser::parse("WEBVTT\nKind: captions\n").is_empty());
    }

    #[test]
    fn test_dedupe_pass_matches_inline_rule() {
        let segment = |index, text: &str| CaptionSegment {
            index,
            start: None,
            end: None,
            text: text.to_string(),
        };
        let segments = vec![
            segment(1, "a b"),
            segment(2, " a  b "),
            segment(3, ""),
            segment(4, "c"),
            segment(5, "c"),
            segment(6, "a b"),
        ];

        let kept = dedupe(segments);
        let indices: Vec<u64> = kept.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 4, 6]);
        assert_eq!(kept[0].text, "a b");
    }
}
