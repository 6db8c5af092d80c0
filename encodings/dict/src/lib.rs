//! Dictionary encoding: each row stores a code into a table of distinct values.

pub use array::*;
pub use builders::*;

mod array;
mod builders;
