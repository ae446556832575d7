//! The parsed diff tree: [`Diff`] → [`DiffChunk`] → [`Chunk`].

pub mod file;
pub mod full;
pub mod hunk;

pub use file::{DiffChunk, IndexLine};
pub use full::Diff;
pub use hunk::{Chunk, HunkRange};
