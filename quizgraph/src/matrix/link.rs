use log::trace;

use crate::error::CompileErrorKind;
use crate::graph::QuizGraph;
use crate::matrix::Matrix;
use crate::quiz::Quiz;

/// Add an edge `parent → child` for every set cell `matrix[child][parent]`
/// whose two slots are both filled. Empty slots are skipped.
pub fn link(
    graph: &mut QuizGraph,
    matrix: &Matrix,
    group: &[Option<&Quiz>],
) -> Result<(), CompileErrorKind> {
    if matrix.height() != group.len() || matrix.width() != group.len() {
        return Err(CompileErrorKind::BadMatrixSize {
            expected: matrix.height(),
            actual: group.len(),
        });
    }

    for (parent_idx, parent) in group.iter().enumerate() {
        for (child_idx, child) in group.iter().enumerate() {
            if !matrix.get(child_idx, parent_idx) {
                continue;
            }
            if let (Some(parent), Some(child)) = (parent, child) {
                trace!("link slot {} -> slot {}", parent_idx, child_idx);
                graph.add_edge(parent, child);
            }
        }
    }
    Ok(())
}
