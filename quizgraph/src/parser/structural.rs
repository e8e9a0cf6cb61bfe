use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser as CmarkParser, Tag};
use regex::Regex;

static HEADER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#+\s+.+$").expect("header regex is valid"));

/// One source line, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
}

/// A header line plus every line up to the next header.
/// Blocks are the unit of compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub lines: Vec<Line>,
}

impl Block {
    /// Build a block from bare lines, with spans laid out as if the lines
    /// were joined by `\n`.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut offset = 0;
        let lines = lines
            .into_iter()
            .map(|text| {
                let text = text.into();
                let span = offset..offset + text.len();
                offset = span.end + 1;
                Line { text, span }
            })
            .collect();
        Block { lines }
    }

    pub fn header(&self) -> Option<&Line> {
        self.lines.first()
    }

    /// Lines after the header.
    pub fn body(&self) -> &[Line] {
        self.lines.get(1..).unwrap_or(&[])
    }
}

/// Partition `source` into header-delimited blocks.
///
/// A header is a line matching `#+ <text>` that CommonMark also reads as an
/// ATX heading, so `#` lines inside fenced code never start a block. Lines
/// before the first header belong to no block.
pub fn split_blocks(source: &str) -> Vec<Block> {
    let heading_lines = heading_line_starts(source);
    let mut blocks: Vec<Block> = Vec::new();
    let mut offset = 0;

    for raw in source.split('\n') {
        let start = offset;
        offset += raw.len() + 1;

        let text = raw.strip_suffix('\r').unwrap_or(raw);
        let line = Line {
            text: text.to_string(),
            span: start..start + text.len(),
        };

        if heading_lines.contains(&start) && HEADER_LINE.is_match(text) {
            blocks.push(Block { lines: vec![line] });
        } else if let Some(block) = blocks.last_mut() {
            block.lines.push(line);
        }
    }

    blocks
}

/// Byte offsets of the lines on which CommonMark sees a heading start.
fn heading_line_starts(source: &str) -> HashSet<usize> {
    CmarkParser::new_ext(source, Options::empty())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::Heading { .. }) => Some(line_start(source, range.start)),
            _ => None,
        })
        .collect()
}

fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map(|p| p + 1).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn texts(block: &Block) -> Vec<&str> {
        block.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn splits_on_headers() {
        let src = "preamble\n# @ 私 @ わたし\n- @translation @en I\n## @ 千尋 @ ちひろ\n- @fill 千\n";
        let blocks = split_blocks(src);
        assert_eq!(blocks.len(), 2);
        assert_eq!(texts(&blocks[0]), vec!["# @ 私 @ わたし", "- @translation @en I"]);
        assert_eq!(texts(&blocks[1]), vec!["## @ 千尋 @ ちひろ", "- @fill 千", ""]);
    }

    #[test]
    fn spans_index_into_source() {
        let src = "# a\r\n- b\n# c";
        let blocks = split_blocks(src);
        assert_eq!(blocks.len(), 2);
        for line in blocks.iter().flat_map(|b| &b.lines) {
            assert_eq!(&src[line.span.clone()], line.text);
        }
        assert_eq!(blocks[0].lines[0].text, "# a");
    }

    #[test]
    fn fenced_hash_lines_are_not_headers() {
        let src = "# @ 本 @ ほん\n```\n# not a header\n```\n";
        let blocks = split_blocks(src);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines.len(), 5);
    }

    #[test]
    fn hash_without_space_is_text() {
        let blocks = split_blocks("#tag\n# real");
        assert_eq!(blocks.len(), 1);
        assert_eq!(texts(&blocks[0]), vec!["# real"]);
    }

    #[test]
    fn from_lines_lays_out_spans() {
        let block = Block::from_lines(["# @ 私", "- @fill 私"]);
        assert_eq!(block.lines[0].span, 0.."# @ 私".len());
        assert_eq!(block.lines[1].span.start, "# @ 私".len() + 1);
        assert_eq!(block.body().len(), 1);
    }
}
