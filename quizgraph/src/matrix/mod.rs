//! Boolean adjacency matrices and the review-equivalence linker.

pub mod link;
pub mod templates;

use thiserror::Error;

pub use link::link;
pub use templates::{MATCH_MATRIX, MATCH_SLOTS, SENTENCE_MATRIX, SENTENCE_SLOTS};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("empty matrix")]
    Empty,
    #[error("ragged matrix: row {row} has {actual} columns, expected {expected}")]
    Ragged { row: usize, expected: usize, actual: usize },
    #[error("invalid matrix digit `{0}`")]
    BadDigit(char),
    #[error("cannot hstack uneven heights")]
    UnevenHeights,
    #[error("cannot vstack uneven widths")]
    UnevenWidths,
    #[error("expected a {expected}x{expected} matrix, got {height}x{width}")]
    WrongDimension {
        expected: usize,
        height: usize,
        width: usize,
    },
}

/// A rectangular boolean matrix, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: Vec<Vec<bool>>,
}

impl Matrix {
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self, MatrixError> {
        let width = rows.first().ok_or(MatrixError::Empty)?.len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(MatrixError::Ragged {
                row,
                expected: width,
                actual: r.len(),
            });
        }
        Ok(Matrix { rows })
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.rows[row][col]
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    /// Number of set cells.
    pub fn count_ones(&self) -> usize {
        self.rows.iter().flatten().filter(|&&b| b).count()
    }

    /// Ok if the matrix is `dim`×`dim`.
    pub fn ensure_square(&self, dim: usize) -> Result<(), MatrixError> {
        if self.height() == dim && self.width() == dim {
            Ok(())
        } else {
            Err(MatrixError::WrongDimension {
                expected: dim,
                height: self.height(),
                width: self.width(),
            })
        }
    }
}

/// Parse rows of `0`/`1` digits separated by whitespace: `"011 101 000"`.
pub fn string_to_matrix(s: &str) -> Result<Matrix, MatrixError> {
    let rows = s
        .split_whitespace()
        .map(|row| {
            row.chars()
                .map(|c| match c {
                    '0' => Ok(false),
                    '1' => Ok(true),
                    other => Err(MatrixError::BadDigit(other)),
                })
                .collect::<Result<Vec<bool>, MatrixError>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Matrix::from_rows(rows)
}

/// Place matrices of equal height side by side.
pub fn hstack(parts: &[Matrix]) -> Result<Matrix, MatrixError> {
    let height = parts.first().ok_or(MatrixError::Empty)?.height();
    if parts.iter().any(|m| m.height() != height) {
        return Err(MatrixError::UnevenHeights);
    }
    let rows = (0..height)
        .map(|r| parts.iter().flat_map(|m| m.rows[r].iter().copied()).collect())
        .collect();
    Matrix::from_rows(rows)
}

/// Place matrices of equal width on top of each other.
pub fn vstack(parts: &[Matrix]) -> Result<Matrix, MatrixError> {
    let width = parts.first().ok_or(MatrixError::Empty)?.width();
    if parts.iter().any(|m| m.width() != width) {
        return Err(MatrixError::UnevenWidths);
    }
    let rows = parts.iter().flat_map(|m| m.rows.iter().cloned()).collect();
    Matrix::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows() {
        let m = string_to_matrix("011 101 000").unwrap();
        assert_eq!(m.height(), 3);
        assert_eq!(m.width(), 3);
        assert!(!m.get(0, 0));
        assert!(m.get(0, 1));
        assert!(m.get(1, 0));
        assert_eq!(m.count_ones(), 4);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(string_to_matrix(""), Err(MatrixError::Empty));
        assert_eq!(string_to_matrix("01 2"), Err(MatrixError::BadDigit('2')));
        assert_eq!(
            string_to_matrix("01 011"),
            Err(MatrixError::Ragged {
                row: 1,
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn stacking() {
        let a = string_to_matrix("10 01").unwrap();
        let b = string_to_matrix("1 1").unwrap();
        let wide = hstack(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(wide, string_to_matrix("101 011").unwrap());

        let tall = vstack(&[a.clone(), string_to_matrix("11").unwrap()]).unwrap();
        assert_eq!(tall, string_to_matrix("10 01 11").unwrap());

        assert_eq!(vstack(&[a.clone(), b]), Err(MatrixError::UnevenWidths));
        assert_eq!(
            hstack(&[a, string_to_matrix("1").unwrap()]),
            Err(MatrixError::UnevenHeights)
        );
    }

    #[test]
    fn ensure_square() {
        let m = string_to_matrix("10 01").unwrap();
        assert!(m.ensure_square(2).is_ok());
        assert_eq!(
            m.ensure_square(3),
            Err(MatrixError::WrongDimension {
                expected: 3,
                height: 2,
                width: 2
            })
        );
    }
}
