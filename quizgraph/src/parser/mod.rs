pub mod adverbs;
pub mod bullets;
pub mod structural;

pub use adverbs::{AtLine, separate_at_values};
pub use bullets::{BulletKind, classify, header_prefix};
pub use structural::{Block, Line, split_blocks};
