//! The path addressing language.

mod access;
mod cache;
mod chunk;

pub use access::{exists, set, unset, value, values, SetOutcome};
pub use cache::{cache_size, cached_parse, clear_cache, PathCache};
pub use chunk::{normalized_name, parse, Chunk, Index};
