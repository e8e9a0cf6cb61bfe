use std::sync::LazyLock;

use regex::Regex;

/// The kind of an annotation line within a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletKind {
    /// `- @translation @en ... @fr ...`
    Translation,
    /// `- @furigana {千}^{せん}と...`
    Furigana,
    /// `- @fill と`: a blank in the header sentence.
    Fill,
    /// `- @ 千 @ せん @pos ...`: vocabulary within the header sentence.
    Flash,
    /// Any other `- @...` line; kept in the bullet run, otherwise ignored.
    Unknown,
}

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#+\s+@\s+").expect("header regex is valid"));

static PATTERNS: LazyLock<[(BulletKind, Regex); 5]> = LazyLock::new(|| {
    let re = |pattern: &str| Regex::new(pattern).expect("bullet regex is valid");
    [
        (BulletKind::Translation, re(r"^-\s+@translation\s+")),
        (BulletKind::Furigana, re(r"^-\s+@furigana\s+")),
        (BulletKind::Fill, re(r"^-\s+@fill\s+")),
        (BulletKind::Flash, re(r"^-\s+@\s+")),
        (BulletKind::Unknown, re(r"^\s*-\s+@")),
    ]
});

/// Length of the `# @ ` prefix if `line` is an annotated header.
pub fn header_prefix(line: &str) -> Option<usize> {
    HEADER.find(line).map(|m| m.end())
}

/// Classify a bullet line, returning its kind and the length of the prefix
/// that identified it.
pub fn classify(line: &str) -> Option<(BulletKind, usize)> {
    PATTERNS
        .iter()
        .find_map(|(kind, re)| re.find(line).map(|m| (*kind, m.end())))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("# @ 私 @ わたし", Some(4))]
    #[case("## @ 千と千尋の神隠し", Some(5))]
    #[case("## blabla", None)]
    #[case("#@ 私", None)]
    #[case("# @私", None)]
    fn headers(#[case] line: &str, #[case] expected: Option<usize>) {
        assert_eq!(header_prefix(line), expected);
    }

    #[rstest]
    #[case("- @translation @en I", Some(BulletKind::Translation))]
    #[case("- @furigana {千}^{せん}", Some(BulletKind::Furigana))]
    #[case("- @fill と    @pos particle-case", Some(BulletKind::Fill))]
    #[case("- @ 千 @ せん", Some(BulletKind::Flash))]
    #[case("- @pos noun", Some(BulletKind::Unknown))]
    #[case("  - @ nested", Some(BulletKind::Unknown))]
    #[case("- @translation", Some(BulletKind::Unknown))]
    #[case("- plain bullet", None)]
    #[case("", None)]
    #[case("Some prose.", None)]
    fn bullets(#[case] line: &str, #[case] expected: Option<BulletKind>) {
        assert_eq!(classify(line).map(|(kind, _)| kind), expected);
    }

    #[test]
    fn prefix_length_covers_marker_and_spaces() {
        let line = "- @fill   と";
        let (_, prefix) = classify(line).unwrap();
        assert_eq!(&line[prefix..], "と");
    }
}
