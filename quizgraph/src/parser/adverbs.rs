use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

/// Where the `@marker` region of a line begins: an `@` glued to a non-space
/// character, at the start of the line or after whitespace.
static ADVERB_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)@\S").expect("adverb regex is valid"));

static MARKER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@\S+").expect("marker regex is valid"));

/// One tokenized annotation line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtLine {
    /// The leading ` @ `-separated values, trimmed.
    pub values: Vec<String>,
    /// `@name text` side-annotations keyed by `name` (no `@`).
    pub adverbs: IndexMap<String, String>,
}

impl AtLine {
    pub fn adverb(&self, name: &str) -> Option<&str> {
        self.adverbs.get(name).map(String::as_str)
    }

    /// The first value and the remaining ones.
    pub fn split_first(&self) -> (&str, &[String]) {
        match self.values.split_first() {
            Some((first, rest)) => (first.as_str(), rest),
            None => ("", &[]),
        }
    }
}

/// Split `line[offset..]` into at-separated values and adverbs.
///
/// `offset` is a byte offset, normally the length of a line prefix a
/// pattern has already consumed (`# @ `, `- @fill `, ...). Offsets that do
/// not fall on a character boundary are treated as zero.
pub fn separate_at_values(line: &str, offset: usize) -> AtLine {
    let s = line.get(offset..).unwrap_or(line);
    let adverb_index = ADVERB_START.find(s).map(|m| m.start()).unwrap_or(s.len());

    let values = s[..adverb_index]
        .split('@')
        .map(|v| v.trim().to_string())
        .collect();

    let mut adverbs = IndexMap::new();
    for token in s[adverb_index..].trim().split('@').filter(|t| !t.is_empty()) {
        let token = format!("@{}", token);
        if let Some(name) = MARKER_NAME.find(&token) {
            let text = token[name.end()..].trim().to_string();
            adverbs.insert(name.as_str()[1..].to_string(), text);
        }
    }

    AtLine { values, adverbs }
}
