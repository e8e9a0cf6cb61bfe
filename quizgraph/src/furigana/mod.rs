//! Phonetic ruby ("furigana") annotations.
//!
//! The annotation syntax marks a run of base text with its reading as
//! `{base}^{reading}`; everything else is plain text:
//!
//! ```text
//! {千}^{せん}と{千}^{ち}{尋}^{ひろ}の{神}^{かみ}{隠}^{かく}し
//! ```

use serde::Serialize;
use thiserror::Error;

/// One phonetic unit: plain text, or base text with its reading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Furigana {
    Plain(String),
    Ruby { ruby: String, rt: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FuriganaError {
    #[error("unclosed `{{` at character {0}")]
    UnclosedBrace(usize),
    #[error("stray `}}` at character {0}")]
    StrayBrace(usize),
    #[error("`{{{0}}}` has no `^{{reading}}`")]
    MissingReading(String),
    #[error("empty ruby group at character {0}")]
    EmptyRuby(usize),
}

/// Parse a furigana annotation. Consecutive plain characters are merged
/// into one [`Furigana::Plain`].
pub fn parse_furigana(text: &str) -> Result<Vec<Furigana>, FuriganaError> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut plain = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' => {
                let (ruby, after_base) = read_braced(&chars, i)?;
                if chars.get(after_base) != Some(&'^') || chars.get(after_base + 1) != Some(&'{') {
                    return Err(FuriganaError::MissingReading(ruby));
                }
                let (rt, next) = read_braced(&chars, after_base + 1)?;
                if ruby.is_empty() || rt.is_empty() {
                    return Err(FuriganaError::EmptyRuby(i));
                }
                if !plain.is_empty() {
                    out.push(Furigana::Plain(std::mem::take(&mut plain)));
                }
                out.push(Furigana::Ruby { ruby, rt });
                i = next;
            }
            '}' => return Err(FuriganaError::StrayBrace(i)),
            c => {
                plain.push(c);
                i += 1;
            }
        }
    }

    if !plain.is_empty() {
        out.push(Furigana::Plain(plain));
    }
    Ok(out)
}

/// Read `{...}` starting at `open`; returns the contents and the index just
/// past the closing brace.
fn read_braced(chars: &[char], open: usize) -> Result<(String, usize), FuriganaError> {
    let close = chars[open + 1..]
        .iter()
        .position(|&c| c == '}')
        .map(|p| open + 1 + p)
        .ok_or(FuriganaError::UnclosedBrace(open))?;
    let inner: String = chars[open + 1..close].iter().collect();
    if inner.contains('{') {
        return Err(FuriganaError::UnclosedBrace(open));
    }
    Ok((inner, close + 1))
}

/// The base text, as it appears in the sentence.
pub fn furigana_text(furigana: &[Furigana]) -> String {
    furigana
        .iter()
        .map(|f| match f {
            Furigana::Plain(s) => s.as_str(),
            Furigana::Ruby { ruby, .. } => ruby.as_str(),
        })
        .collect()
}

/// The full reading: plain text as-is, ruby groups replaced by their reading.
pub fn furigana_reading(furigana: &[Furigana]) -> String {
    furigana
        .iter()
        .map(|f| match f {
            Furigana::Plain(s) => s.as_str(),
            Furigana::Ruby { rt, .. } => rt.as_str(),
        })
        .collect()
}

/// One reading entry per base character.
///
/// A plain character reads as itself. A ruby group carries its whole
/// reading on its first base character and empty strings on the rest, so
/// index `i` of the result always lines up with character `i` of
/// [`furigana_text`].
pub fn linearize(furigana: &[Furigana]) -> Vec<String> {
    let mut lookup = Vec::new();
    for f in furigana {
        match f {
            Furigana::Plain(s) => lookup.extend(s.chars().map(String::from)),
            Furigana::Ruby { ruby, rt } => {
                lookup.push(rt.clone());
                lookup.extend(ruby.chars().skip(1).map(|_| String::new()));
            }
        }
    }
    lookup
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ruby(base: &str, rt: &str) -> Furigana {
        Furigana::Ruby {
            ruby: base.into(),
            rt: rt.into(),
        }
    }

    #[test]
    fn parses_mixed_text() {
        let parsed = parse_furigana("{千}^{せん}と{千}^{ち}{尋}^{ひろ}の{神}^{かみ}{隠}^{かく}し").unwrap();
        assert_eq!(
            parsed,
            vec![
                ruby("千", "せん"),
                Furigana::Plain("と".into()),
                ruby("千", "ち"),
                ruby("尋", "ひろ"),
                Furigana::Plain("の".into()),
                ruby("神", "かみ"),
                ruby("隠", "かく"),
                Furigana::Plain("し".into()),
            ]
        );
        assert_eq!(furigana_text(&parsed), "千と千尋の神隠し");
        assert_eq!(furigana_reading(&parsed), "せんとちひろのかみかくし");
    }

    #[test]
    fn plain_runs_merge() {
        let parsed = parse_furigana("のお{父}^{ちち}さん").unwrap();
        assert_eq!(
            parsed,
            vec![
                Furigana::Plain("のお".into()),
                ruby("父", "ちち"),
                Furigana::Plain("さん".into()),
            ]
        );
    }

    #[test]
    fn linearize_aligns_with_base_characters() {
        let parsed = parse_furigana("{今日}^{きょう}は").unwrap();
        let lookup = linearize(&parsed);
        assert_eq!(lookup, vec!["きょう", "", "は"]);
        assert_eq!(lookup.len(), furigana_text(&parsed).chars().count());
    }

    #[test]
    fn rejects_malformed_groups() {
        assert_eq!(parse_furigana("{千"), Err(FuriganaError::UnclosedBrace(0)));
        assert_eq!(
            parse_furigana("{千}と"),
            Err(FuriganaError::MissingReading("千".into()))
        );
        assert_eq!(parse_furigana("a}b"), Err(FuriganaError::StrayBrace(1)));
        assert_eq!(parse_furigana("{}^{せん}"), Err(FuriganaError::EmptyRuby(0)));
    }

    #[test]
    fn serializes_like_plain_json() {
        let parsed = parse_furigana("{千}^{せん}と").unwrap();
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            r#"[{"ruby":"千","rt":"せん"},"と"]"#
        );
    }
}
