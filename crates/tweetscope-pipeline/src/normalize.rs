//! Tweet text cleaning.
//!
//! The steps run in a fixed order and the order is observable: hashtags are
//! removed before digits, so `#3` disappears as a hashtag rather than
//! leaving a bare `#` for the punctuation pass.

use std::sync::LazyLock;

use regex::Regex;
use tweetscope_core::{CoreError, Record};

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"http\S+").expect("valid regex"));
static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").expect("valid regex"));
static HASHTAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w+").expect("valid regex"));
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Clean one tweet.
///
/// Strips URLs, @-mentions, #-hashtags and digits, lowercases, strips ASCII
/// punctuation, then trims and collapses whitespace. Never fails; text made
/// entirely of removable tokens comes back empty.
#[must_use]
pub fn clean(raw: &str) -> String {
    let text = URL_RE.replace_all(raw, "");
    let text = MENTION_RE.replace_all(&text, "");
    let text = HASHTAG_RE.replace_all(&text, "");
    let text = DIGITS_RE.replace_all(&text, "");
    let text = text.to_lowercase();
    let text: String = text.chars().filter(|c| !c.is_ascii_punctuation()).collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Set `clean_text` on every record.
///
/// # Errors
///
/// Returns [`CoreError::AlreadySet`] if any record was already normalized.
pub fn normalize_records(records: &mut [Record]) -> Result<(), CoreError> {
    for record in records.iter_mut() {
        let cleaned = clean(record.text());
        record.set_clean_text(cleaned)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_the_reference_tweet() {
        assert_eq!(
            clean("Check this out! http://x.co #DMV @user123 Call 911 now!!"),
            "check this out call now"
        );
    }

    #[test]
    fn clean_is_deterministic() {
        let raw = "RT @dmv: Lines at #Sacramento office 2hrs+ :( https://t.co/abc";
        assert_eq!(clean(raw), clean(raw));
    }

    #[test]
    fn empty_and_noise_only_inputs_return_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   "), "");
        assert_eq!(clean("@a #b https://c.d 42 !!!"), "");
    }

    #[test]
    fn hashtag_with_digits_is_removed_whole() {
        assert_eq!(clean("line #3 moving"), "line moving");
    }

    #[test]
    fn digits_inside_words_are_removed() {
        assert_eq!(clean("Route66 rocks"), "route rocks");
    }

    #[test]
    fn punctuation_inside_words_is_removed_without_a_gap() {
        assert_eq!(clean("don't can't"), "dont cant");
    }

    #[test]
    fn non_ascii_letters_survive_lowercasing() {
        assert_eq!(clean("ÉLAN Café"), "élan café");
    }

    #[test]
    fn normalize_records_sets_clean_text_once() {
        let mut records = vec![Record::new("Hi @bob!", 0, 0), Record::new("OK 123", 1, 1)];
        normalize_records(&mut records).unwrap();
        assert_eq!(records[0].clean_text(), Some("hi"));
        assert_eq!(records[1].clean_text(), Some("ok"));

        let err = normalize_records(&mut records).unwrap_err();
        assert_eq!(
            err,
            CoreError::AlreadySet {
                field: "clean_text"
            }
        );
    }
}
