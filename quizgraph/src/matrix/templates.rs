//! The fixed dependency policies.
//!
//! Slots of the sentence group, in order:
//!
//! | index | node                                   |
//! |-------|----------------------------------------|
//! | 0–2   | header passive, see-prompt, see-response |
//! | 3–5   | vocabulary passive, see-prompt, see-response |
//! | 6–8   | vocabulary cloze: see-nothing, see-prompt, see-response |
//! | 9     | match quiz (match group only)           |
//!
//! A set cell `[child][parent]` means a review of `parent` also counts as a
//! passive review of `child`.

use std::sync::LazyLock;

use crate::matrix::{Matrix, MatrixError, hstack, string_to_matrix, vstack};

pub const SENTENCE_SLOTS: usize = 9;
pub const MATCH_SLOTS: usize = 10;

pub static SENTENCE_MATRIX: LazyLock<Matrix> =
    LazyLock::new(|| sentence_matrix().expect("sentence dependency template is well-formed"));

pub static MATCH_MATRIX: LazyLock<Matrix> =
    LazyLock::new(|| match_matrix().expect("match dependency template is well-formed"));

/// Header, vocabulary and vocabulary-cloze trios, as a 3×3 grid of 3×3
/// blocks (rows are children, columns parents).
fn sentence_matrix() -> Result<Matrix, MatrixError> {
    let northwest = "011 101 000";
    let north = "000 000 000";
    let northeast = "111 111 000";
    let west = "111 111 001";
    let middle = "011 101 000";
    let east = "111 111 001";
    let southwest = "111 111 001";
    let south = "000 111 001";
    let southeast = "011 101 000";

    let band = |cells: [&str; 3]| -> Result<Matrix, MatrixError> {
        let parts = cells
            .iter()
            .map(|s| string_to_matrix(s))
            .collect::<Result<Vec<_>, _>>()?;
        hstack(&parts)
    };
    let matrix = vstack(&[
        band([northwest, north, northeast])?,
        band([west, middle, east])?,
        band([southwest, south, southeast])?,
    ])?;
    matrix.ensure_square(SENTENCE_SLOTS)?;
    Ok(matrix)
}

/// The sentence group plus a match quiz in the last slot. Reviewing the
/// match credits the passive/see-prompt members of every trio; reviewing the
/// header or a vocabulary cloze credits the match.
fn match_matrix() -> Result<Matrix, MatrixError> {
    let column = "110110110";
    let last_row = "1110001110";

    let mut rows: Vec<String> = column
        .chars()
        .map(|bit| format!("{}{}", "0".repeat(SENTENCE_SLOTS), bit))
        .collect();
    rows.push(last_row.to_string());

    let matrix = string_to_matrix(&rows.join(" "))?;
    matrix.ensure_square(MATCH_SLOTS)?;
    Ok(matrix)
}
