use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

use crate::cloze::ClozeError;
use crate::parser::structural::Line;

/// Every way a block can fail to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileErrorKind {
    #[error("header has no prompt")]
    MissingPrompt,
    #[error("cloze `{0}` not found in sentence")]
    ClozeNotFound(String),
    #[error("cloze `{0}` occurs more than once; disambiguate with `left[cloze]right`")]
    AmbiguityRequiresContext(String),
    #[error("only one bracketed cloze is supported: `{0}`")]
    AmbiguousBracket(String),
    #[error("cloze with context `{0}` not found in sentence")]
    ContextNotFound(String),
    #[error("cloze context `{0}` matches more than once")]
    InsufficientContext(String),
    #[error("dependency matrix has {expected} slots but the group has {actual}")]
    BadMatrixSize { expected: usize, actual: usize },
    #[error("malformed bullet: {0}")]
    MalformedBullet(String),
}

impl From<ClozeError> for CompileErrorKind {
    fn from(err: ClozeError) -> Self {
        match err {
            ClozeError::ClozeNotFound(s) => CompileErrorKind::ClozeNotFound(s),
            ClozeError::AmbiguityRequiresContext(s) => CompileErrorKind::AmbiguityRequiresContext(s),
            ClozeError::AmbiguousBracket(s) => CompileErrorKind::AmbiguousBracket(s),
            ClozeError::ContextNotFound(s) => CompileErrorKind::ContextNotFound(s),
            ClozeError::InsufficientContext(s) => CompileErrorKind::InsufficientContext(s),
        }
    }
}

/// A compile error tagged with the source line that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (in `{line}`)")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    /// The offending line, verbatim.
    pub line: String,
    /// Byte span of that line in the source.
    pub span: Range<usize>,
    /// The source file ID (for codespan-reporting).
    pub file_id: usize,
}

impl CompileError {
    pub fn new(kind: impl Into<CompileErrorKind>, line: &Line, file_id: usize) -> Self {
        CompileError {
            kind: kind.into(),
            line: line.text.clone(),
            span: line.span.clone(),
            file_id,
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(self.kind.to_string())
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
    }
}
