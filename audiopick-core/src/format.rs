//! Text normalization and name building for cards, queries and attachments.

use chrono::{DateTime, TimeZone};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Matches `base[reading]`, optionally preceded by a single space.
#[allow(clippy::unwrap_used)]
static PLAIN_FURIGANA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?([^ >]+?)\[(.+?)\]").unwrap());

/// Timestamp format used in attachment filenames. Sorts chronologically.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Provenance tag used when the source URL has no path segment.
const UNKNOWN_SOURCE: &str = "unknown";

/// Collapse a plain-furigana field into its kana reading.
///
/// `&nbsp;` becomes a space, then every `base[reading]` (with an optional
/// leading space) is replaced by `reading`. Both steps repeat until the text
/// stops changing, so nested annotations collapse fully and the result is a
/// fixed point.
///
/// ```
/// use audiopick_core::format::normalize_reading;
///
/// assert_eq!(normalize_reading("掛け&nbsp;橋[きょう]"), "掛けきょう");
/// assert_eq!(normalize_reading("木[き]"), "き");
/// ```
#[must_use]
pub fn normalize_reading(text: &str) -> String {
    let mut current = text.to_owned();
    loop {
        // Every change shortens the text, so this terminates.
        let next = PLAIN_FURIGANA
            .replace_all(&current.replace("&nbsp;", " "), "$2")
            .into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Format a timestamp for use in an attachment filename.
#[must_use]
pub fn attachment_timestamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Build the filename an audio source is stored under in the card's media.
///
/// The result is `local_audio_<source>_<word>_<reading>_<timestamp><ext>`,
/// where `<source>` is the first path segment of `url` and `<ext>` is
/// everything from the last `.` in `url`.
///
/// ```
/// use audiopick_core::format::build_attachment_filename;
///
/// let name = build_attachment_filename(
///     "http://host/jisho/abc.mp3",
///     "木",
///     Some("き"),
///     "2024-01-01-00-00-00",
/// );
/// assert_eq!(name, "local_audio_jisho_木_き_2024-01-01-00-00-00.mp3");
/// ```
#[must_use]
pub fn build_attachment_filename(
    url: &str,
    word: &str,
    reading: Option<&str>,
    timestamp: &str,
) -> String {
    let source = source_tag(url);
    let suffix = url.rfind('.').map_or("", |i| &url[i..]);
    let reading = reading.unwrap_or_default();
    format!("local_audio_{source}_{word}_{reading}_{timestamp}{suffix}")
}

/// First path segment of a source URL, used to tag where the audio came from.
fn source_tag(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next().map(str::to_owned))
        })
        .filter(|segment| !segment.is_empty())
        .map_or_else(
            || UNKNOWN_SOURCE.to_string(),
            |segment| {
                urlencoding::decode(&segment)
                    .map_or(segment.clone(), std::borrow::Cow::into_owned)
            },
        )
}

/// Build the card search string restricting `field` to `value` within a note type.
#[must_use]
pub fn build_record_query(note_type: &str, field: &str, value: &str) -> String {
    format!("\"note:{note_type}\" \"{field}:{value}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    /// Strings assembled from the pieces furigana markup is made of.
    fn markup() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop::sample::select(vec![
                " ", "[", "]", ">", "&nbsp;", "&", "nbsp;", "&nbs", "p;", "き", "橋", "a",
            ]),
            0..16,
        )
        .prop_map(|pieces| pieces.concat())
    }

    #[test]
    fn test_normalize_nbsp_and_ruby() {
        assert_eq!(normalize_reading("掛け&nbsp;橋[きょう]"), "掛けきょう");
    }

    #[test]
    fn test_normalize_multiple_ruby_groups() {
        assert_eq!(normalize_reading("日本[にほん] 語[ご]"), "にほんご");
        assert_eq!(normalize_reading("食[た]べる"), "たべる");
    }

    #[test]
    fn test_normalize_nested_brackets() {
        assert_eq!(normalize_reading("a[b[c]]"), "c");
    }

    #[test]
    fn test_normalize_plain_text_unchanged() {
        assert_eq!(normalize_reading("きょう"), "きょう");
        assert_eq!(normalize_reading(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "掛け&nbsp;橋[きょう]",
            "日本[にほん] 語[ご]",
            "a[b] c[d]e",
            "&nbsp;&nbsp;",
            "[x]",
            "<b>強[つよ]</b>い",
            "plain",
            "a[b[c]]",
            "&nbs[&nbs]p;",
        ];
        for input in inputs {
            let once = normalize_reading(input);
            assert_eq!(normalize_reading(&once), once, "input: {input}");
        }
    }

    proptest! {
        #[test]
        fn proptest_normalize_is_idempotent(text in markup()) {
            let once = normalize_reading(&text);
            prop_assert_eq!(normalize_reading(&once), once.clone());
            prop_assert!(!once.contains("&nbsp;"));
        }

        #[test]
        fn proptest_normalize_keeps_plain_text(text in "[a-zきはし ]{0,24}") {
            prop_assert_eq!(normalize_reading(&text), text);
        }
    }

    #[test]
    fn test_filename_for_jisho_source() {
        let name = build_attachment_filename(
            "http://host/jisho/abc.mp3",
            "木",
            Some("き"),
            "2024-01-01-00-00-00",
        );
        assert_eq!(name, "local_audio_jisho_木_き_2024-01-01-00-00-00.mp3");
    }

    #[test]
    fn test_filename_nested_path_uses_top_segment() {
        let name = build_attachment_filename(
            "http://localhost:5050/nhk16/audio/0001.opus",
            "橋",
            Some("はし"),
            "2024-05-06-07-08-09",
        );
        assert_eq!(name, "local_audio_nhk16_橋_はし_2024-05-06-07-08-09.opus");
    }

    #[test]
    fn test_filename_without_reading() {
        let name = build_attachment_filename("http://host/forvo/x.ogg", "木", None, "t");
        assert_eq!(name, "local_audio_forvo_木__t.ogg");
    }

    #[test]
    fn test_filename_percent_encoded_segment_is_decoded() {
        let name =
            build_attachment_filename("http://host/%E6%9C%A8/x.mp3", "木", Some("き"), "t");
        assert_eq!(name, "local_audio_木_木_き_t.mp3");
    }

    #[test]
    fn test_filename_without_path() {
        let name = build_attachment_filename("not a url", "木", Some("き"), "t");
        assert_eq!(name, "local_audio_unknown_木_き_t");
    }

    #[test]
    fn test_timestamp_format() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(attachment_timestamp(&now), "2024-01-01-00-00-00");
    }

    #[test]
    fn test_record_query() {
        assert_eq!(
            build_record_query("JP Mining Note", "Word", "木"),
            "\"note:JP Mining Note\" \"Word:木\""
        );
    }
}
