pub mod cloze;
pub mod compiler;
pub mod error;
pub mod furigana;
pub mod graph;
pub mod matrix;
pub mod parser;
pub mod quiz;

pub use compiler::{Compiler, compile_block, text_to_graph};
pub use error::{CompileError, CompileErrorKind};
pub use graph::QuizGraph;
pub use quiz::{Card, Cloze, ClozeContext, ClozeSubkind, Match, MatchPair, Quiz, QuizId, QuizKind};
