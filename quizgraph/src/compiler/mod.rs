//! Compiling annotated text into a quiz graph.
//!
//! Text is split into header-delimited blocks which are folded, in order,
//! into one graph: later blocks may merge into nodes created by earlier
//! ones, so order matters.

mod block;

use log::debug;

use crate::error::CompileError;
use crate::graph::QuizGraph;
use crate::parser::structural::{Block, split_blocks};

/// Compiler entry point for one source text.
pub struct Compiler {
    source: String,
    file_id: usize,
}

impl Compiler {
    pub fn new(source: impl Into<String>, file_id: usize) -> Self {
        Compiler {
            source: source.into(),
            file_id,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn blocks(&self) -> Vec<Block> {
        split_blocks(&self.source)
    }

    /// Compile one block of this source into `graph`. On error nothing from
    /// the block is added.
    pub fn compile_block(&self, graph: &mut QuizGraph, block: &Block) -> Result<(), CompileError> {
        block::compile(graph, block, self.file_id)
    }

    /// Compile every block into `graph`, stopping at the first failure.
    /// Blocks before the failing one stay merged.
    pub fn compile_into(&self, graph: &mut QuizGraph) -> Result<(), CompileError> {
        let blocks = self.blocks();
        debug!("compiling {} block(s) from file {}", blocks.len(), self.file_id);
        for block in &blocks {
            self.compile_block(graph, block)?;
        }
        Ok(())
    }

    pub fn compile(&self) -> Result<QuizGraph, CompileError> {
        let mut graph = QuizGraph::new();
        self.compile_into(&mut graph)?;
        Ok(graph)
    }
}

/// Compile a single block into `graph`.
pub fn compile_block(graph: &mut QuizGraph, block: &Block) -> Result<(), CompileError> {
    block::compile(graph, block, 0)
}

/// Compile a whole text into a fresh graph.
pub fn text_to_graph(text: &str) -> Result<QuizGraph, CompileError> {
    Compiler::new(text, 0).compile()
}
