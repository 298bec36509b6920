//! Text normalization helpers shared by every scraper.
//!
//! Provides:
//! - whitespace collapse, tag and entity stripping
//! - literal `\uXXXX` decoding for doubly-escaped JSON strings
//! - wrapper-quote and connector-word stripping
//! - ordered delimiter fallback splitting
//!
//! `TextRule` bundles the per-field steps and always applies them in the
//! same order: markup, whitespace, leading words and dashes, trailing chars.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ScrapeError, ScrapeResult};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("valid tag regex"));
static UNICODE_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").expect("valid escape regex"));
static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((.*?)\)").expect("valid parenthesis regex"));

const DASHES: &[char] = &['-', '–', '—'];

/// Collapse every whitespace run to one space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn strip_tags(text: &str) -> String {
    TAG.replace_all(text, "").into_owned()
}

pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Tags first, then entities, so an encoded `&lt;b&gt;` survives as text.
pub fn strip_markup(text: &str) -> String {
    decode_entities(&strip_tags(text))
}

/// Decode `\uXXXX` sequences that are still literal text after JSON decoding.
/// Sequences that are not valid scalar values (lone surrogates) are kept.
pub fn decode_unicode_escapes(text: &str) -> String {
    UNICODE_ESCAPE
        .replace_all(text, |caps: &regex::Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

pub fn strip_backslashes(text: &str) -> String {
    text.replace('\\', "")
}

/// Remove `wrapper` from both ends, but only if it is present on both ends.
pub fn strip_wrapping(text: &str, wrapper: char) -> &str {
    if text.chars().count() >= 2 && text.starts_with(wrapper) && text.ends_with(wrapper) {
        let inner = &text[wrapper.len_utf8()..];
        &inner[..inner.len() - wrapper.len_utf8()]
    } else {
        text
    }
}

/// Repeatedly strip any of `words` (matched as `"{word} "`) from the start.
pub fn strip_leading_words<'a>(mut text: &'a str, words: &[String]) -> &'a str {
    loop {
        let before = text.len();
        for word in words {
            if let Some(rest) = text.strip_prefix(word.as_str()) {
                if rest.starts_with(' ') {
                    text = rest.trim_start();
                }
            }
        }
        if text.len() == before {
            return text;
        }
    }
}

pub fn strip_leading_dashes(text: &str) -> &str {
    text.trim_start_matches(DASHES).trim_start()
}

/// Value of the first `( … )` group in `text`
pub fn parenthesized(text: &str) -> Option<String> {
    PARENTHESIZED
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Split `input` on the first delimiter of `delimiters` that yields two
/// non-empty parts. Delimiters are tried strictly in the given order.
pub fn split_pair(input: &str, delimiters: &[&str]) -> ScrapeResult<(String, String)> {
    for delimiter in delimiters {
        if let Some((left, right)) = input.split_once(delimiter) {
            if !left.is_empty() && !right.is_empty() {
                return Ok((left.to_string(), right.to_string()));
            }
        }
    }

    Err(ScrapeError::Unsplittable {
        input: input.to_string(),
        delimiters: delimiters.iter().map(|d| d.to_string()).collect(),
    })
}

/// Normalization steps for one extracted field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextRule {
    pub strip_markup: bool,
    pub collapse_whitespace: bool,
    pub leading_words: Vec<String>,
    pub strip_leading_dashes: bool,
    pub trim_end: Option<String>,
}

impl TextRule {
    /// Collapse whitespace only
    pub fn collapsed() -> Self {
        Self {
            collapse_whitespace: true,
            ..Self::default()
        }
    }

    pub fn apply(&self, raw: &str) -> String {
        let mut text = if self.strip_markup {
            strip_markup(raw)
        } else {
            raw.to_string()
        };

        text = if self.collapse_whitespace {
            collapse_whitespace(&text)
        } else {
            text.trim().to_string()
        };

        if !self.leading_words.is_empty() || self.strip_leading_dashes {
            let mut rest = text.as_str();
            loop {
                let before = rest.len();
                rest = strip_leading_words(rest, &self.leading_words);
                if self.strip_leading_dashes {
                    rest = strip_leading_dashes(rest);
                }
                if rest.len() == before {
                    break;
                }
            }
            text = rest.to_string();
        }

        if let Some(chars) = &self.trim_end {
            let set: Vec<char> = chars.chars().collect();
            text = text.trim_end_matches(set.as_slice()).to_string();
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Parasite \n\t  (Gisaengchung) "), "Parasite (Gisaengchung)");
    }

    #[test]
    fn test_strip_wrapping_requires_both_ends() {
        assert_eq!(strip_wrapping("\"hello\"", '"'), "hello");
        assert_eq!(strip_wrapping("\"hello", '"'), "\"hello");
        assert_eq!(strip_wrapping("hello\"", '"'), "hello\"");
        assert_eq!(strip_wrapping("\"", '"'), "\"");
    }

    #[test]
    fn test_backslashes_then_quotes() {
        let raw = "\"\\\"Awaken, My Love!\\\"\"";
        let cleaned = strip_backslashes(raw);
        assert_eq!(cleaned, "\"\"Awaken, My Love!\"\"");
        assert_eq!(strip_wrapping(&cleaned, '"'), "\"Awaken, My Love!\"");
    }

    #[test]
    fn test_decode_unicode_escapes() {
        assert_eq!(
            decode_unicode_escapes(r"Daniel Nigro \u0026 Justin Tranter"),
            "Daniel Nigro & Justin Tranter"
        );
        assert_eq!(decode_unicode_escapes(r"Beyonc\u00e9"), "Beyoncé");
        assert_eq!(decode_unicode_escapes(r"\ud83d"), r"\ud83d");
    }

    #[test]
    fn test_strip_markup_decodes_after_tags() {
        assert_eq!(strip_markup("<a href=\"/x\">Simon &amp; Garfunkel</a>"), "Simon & Garfunkel");
    }

    #[test]
    fn test_split_pair_tries_delimiters_in_order() {
        let delims = [", ", " ,", "’ "];
        assert_eq!(
            split_pair("The Beatles, Abbey Road", &delims).unwrap(),
            ("The Beatles".to_string(), "Abbey Road".to_string())
        );
        assert_eq!(
            split_pair("The Beatles ,Abbey Road", &delims).unwrap(),
            ("The Beatles".to_string(), "Abbey Road".to_string())
        );
        assert_eq!(
            split_pair("Grand Funk’ We’re An American Band", &delims).unwrap(),
            ("Grand Funk".to_string(), "We’re An American Band".to_string())
        );
    }

    #[test]
    fn test_split_pair_requires_two_non_empty_parts() {
        assert_eq!(
            split_pair(", Columbia 1967", &[", ", " "]).unwrap(),
            (",".to_string(), "Columbia 1967".to_string())
        );
        assert!(split_pair("Columbia", &[", ", " "]).is_err());
    }

    #[test]
    fn test_text_rule_strips_connector_words() {
        let rule = TextRule {
            collapse_whitespace: true,
            leading_words: vec!["de".to_string(), "pour".to_string()],
            strip_leading_dashes: true,
            trim_end: Some(". ".to_string()),
            ..TextRule::default()
        };
        assert_eq!(rule.apply("de Bong Joon Ho"), "Bong Joon Ho");
        assert_eq!(rule.apply("  pour   Anora. "), "Anora");
        assert_eq!(rule.apply("– de Jacques Audiard."), "Jacques Audiard");
        assert_eq!(rule.apply("Denis Villeneuve"), "Denis Villeneuve");
        assert_eq!(rule.apply("delphine"), "delphine");
    }

    #[test]
    fn test_text_rule_strips_markup_before_words() {
        let rule = TextRule {
            strip_markup: true,
            collapse_whitespace: true,
            leading_words: vec!["de".to_string()],
            ..TextRule::default()
        };
        assert_eq!(rule.apply("<em>de</em> Agnès&nbsp;Varda"), "Agnès Varda");
    }

    #[test]
    fn test_parenthesized() {
        assert_eq!(
            parenthesized("Kayleigh Rose Amstutz, songwriters (Chappell Roan)").as_deref(),
            Some("Chappell Roan")
        );
        assert_eq!(parenthesized("no group"), None);
    }
}
