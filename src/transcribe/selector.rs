/// Language tags that mark an English track, e.g. `<id>.en.srt` or `<id>.en-GB.srt`
fn is_english(file_name: &str) -> bool {
    file_name.contains(".en.") || file_name.contains(".en-") || file_name.ends_with(".en.srt")
}

/// Pick the caption file to use for `video_id`.
///
/// Only files named after the identifier are considered, so leftovers from other runs
/// never win. Among those the first English track in sorted order is preferred, then the
/// first file overall. Sorting keeps the choice deterministic when several tracks exist.
pub fn select_candidate<S: AsRef<str>>(files: &[S], video_id: &str) -> Option<String> {
    if video_id.is_empty() {
        return None;
    }

    let mut candidates: Vec<&str> = files
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| name.starts_with(video_id))
        .collect();
    candidates.sort_unstable();

    candidates
        .iter()
        .find(|name| is_english(name))
        .or_else(|| candidates.first())
        .map(|name| name.to_string())
}
