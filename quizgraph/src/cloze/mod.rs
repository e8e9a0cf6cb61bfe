//! Locating a blank inside a sentence.
//!
//! A needle is either a plain substring of the sentence, or
//! `left[cloze]right`, where only `cloze` is blanked and the surrounding
//! context picks out which occurrence is meant:
//!
//! ```
//! use quizgraph::cloze::parse_cloze;
//!
//! let r = parse_cloze("千と千尋の神隠し", "[千]と").unwrap();
//! assert_eq!((r.left.as_str(), r.cloze.as_str(), r.right.as_str()), ("", "千", "と千尋の神隠し"));
//! ```

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::quiz::ClozeContext;

static BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("bracket regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClozeError {
    #[error("cloze `{0}` not found")]
    ClozeNotFound(String),
    #[error("cloze `{0}` is ambiguous without context")]
    AmbiguityRequiresContext(String),
    #[error("more than one bracketed cloze in `{0}`")]
    AmbiguousBracket(String),
    #[error("cloze context `{0}` not found")]
    ContextNotFound(String),
    #[error("cloze context `{0}` is not unique")]
    InsufficientContext(String),
}

/// A sentence split around exactly one blank. `left + cloze + right` is the
/// original sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClozeResolution {
    pub left: String,
    pub cloze: String,
    pub right: String,
}

impl ClozeResolution {
    /// `[left, Blank, right]`.
    pub fn contexts(&self) -> Vec<ClozeContext> {
        vec![
            ClozeContext::Text(self.left.clone()),
            ClozeContext::Blank,
            ClozeContext::Text(self.right.clone()),
        ]
    }

    /// `[[cloze]]`: one answer set, holding the blanked text.
    pub fn clozes(&self) -> Vec<Vec<String>> {
        vec![vec![self.cloze.clone()]]
    }

    /// The sentence with `answer` written into the blank.
    pub fn fill(&self, answer: &str) -> String {
        format!("{}{}{}", self.left, answer, self.right)
    }

    /// Character (not byte) range of the blank within the sentence.
    pub fn blank_chars(&self) -> Range<usize> {
        let start = self.left.chars().count();
        start..start + self.cloze.chars().count()
    }
}

/// Find the single blank `needle` designates in `haystack`.
///
/// Needles are matched literally, counting non-overlapping occurrences.
pub fn parse_cloze(haystack: &str, needle: &str) -> Result<ClozeResolution, ClozeError> {
    let bracket = BRACKET
        .captures(needle)
        .and_then(|caps| Some((caps.get(0)?, caps.get(1)?)));

    if let Some((whole, cloze)) = bracket {
        let left_context = &needle[..whole.start()];
        let right_context = &needle[whole.end()..];
        if BRACKET.is_match(right_context) {
            return Err(ClozeError::AmbiguousBracket(needle.to_string()));
        }

        let full = format!("{}{}{}", left_context, cloze.as_str(), right_context);
        let start = unique_occurrence(haystack, &full).map_err(|count| match count {
            0 => ClozeError::ContextNotFound(needle.to_string()),
            _ => ClozeError::InsufficientContext(needle.to_string()),
        })?;

        let blank_start = start + left_context.len();
        let blank_end = start + full.len() - right_context.len();
        return Ok(split_at(haystack, blank_start..blank_end));
    }

    if needle.is_empty() {
        return Err(ClozeError::ClozeNotFound(String::new()));
    }
    let start = unique_occurrence(haystack, needle).map_err(|count| match count {
        0 => ClozeError::ClozeNotFound(needle.to_string()),
        _ => ClozeError::AmbiguityRequiresContext(needle.to_string()),
    })?;
    Ok(split_at(haystack, start..start + needle.len()))
}

/// Byte offset of the only occurrence of `needle`, or how many there were.
fn unique_occurrence(haystack: &str, needle: &str) -> Result<usize, usize> {
    let mut hits = haystack.match_indices(needle).map(|(i, _)| i);
    match (hits.next(), hits.next()) {
        (Some(start), None) => Ok(start),
        (None, _) => Err(0),
        (Some(_), Some(_)) => Err(2 + hits.count()),
    }
}

fn split_at(haystack: &str, blank: Range<usize>) -> ClozeResolution {
    ClozeResolution {
        left: haystack[..blank.start].to_string(),
        cloze: haystack[blank.clone()].to_string(),
        right: haystack[blank.end..].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn plain_needle() {
        let r = parse_cloze("千と千尋の神隠し", "の").unwrap();
        assert_eq!(r.left, "千と千尋");
        assert_eq!(r.cloze, "の");
        assert_eq!(r.right, "神隠し");
        assert_eq!(r.clozes(), vec![vec!["の".to_string()]]);
    }

    #[test]
    fn bracket_blanks_only_the_cloze() {
        let r = parse_cloze("千と千尋の神隠し", "[千]と").unwrap();
        assert_eq!(r.left, "");
        assert_eq!(r.cloze, "千");
        assert_eq!(r.right, "と千尋の神隠し");

        let r = parse_cloze("千と千尋の神隠し", "と[千]尋").unwrap();
        assert_eq!(r.left, "千と");
        assert_eq!(r.cloze, "千");
        assert_eq!(r.right, "尋の神隠し");
    }

    #[rstest]
    #[case("千と千尋の神隠し", "の")]
    #[case("千と千尋の神隠し", "千と")]
    #[case("千と千尋の神隠し", "と[千]")]
    #[case("このおはなしに出て来る人びと", "出て来る")]
    #[case("a.b.c", "b.")]
    fn round_trip(#[case] haystack: &str, #[case] needle: &str) {
        let r = parse_cloze(haystack, needle).unwrap();
        assert_eq!(r.fill(&r.cloze), haystack);
        let pieces: Vec<String> = r
            .contexts()
            .into_iter()
            .map(|c| match c {
                ClozeContext::Text(s) => s,
                ClozeContext::Blank => r.cloze.clone(),
            })
            .collect();
        assert_eq!(pieces.concat(), haystack);
    }

    #[rstest]
    #[case("千と千尋の神隠し", "を", ClozeError::ClozeNotFound("を".into()))]
    #[case("千と千尋の神隠し", "千", ClozeError::AmbiguityRequiresContext("千".into()))]
    #[case("千と千尋の神隠し", "[千]と[千]", ClozeError::AmbiguousBracket("[千]と[千]".into()))]
    #[case("千と千尋の神隠し", "[千]を", ClozeError::ContextNotFound("[千]を".into()))]
    #[case("千と千尋と千と", "[千]と", ClozeError::InsufficientContext("[千]と".into()))]
    #[case("千と千尋の神隠し", "", ClozeError::ClozeNotFound("".into()))]
    fn errors(#[case] haystack: &str, #[case] needle: &str, #[case] expected: ClozeError) {
        assert_eq!(parse_cloze(haystack, needle), Err(expected));
    }

    #[test]
    fn needles_are_literal() {
        assert!(parse_cloze("abc", "a.c").is_err());
        assert_eq!(parse_cloze("a.c", "a.c").unwrap().left, "");
    }

    #[test]
    fn blank_chars_count_characters() {
        let r = parse_cloze("千と千尋の神隠し", "神隠し").unwrap();
        assert_eq!(r.blank_chars(), 5..8);
    }
}
