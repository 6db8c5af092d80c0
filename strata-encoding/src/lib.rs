//! Encoding trees for nested columns.
//!
//! A column is described by an immutable tree of [`ArrayEncoding`] nodes whose leaves are
//! [`Flat`] buffers of bit-packed values. The [`Decoder`] reconstructs any range of rows of such
//! a tree while fetching only the buffer bytes those rows need, and the [`ArrayEncoder`] builds
//! the tree and its buffers from logical [`strata_array::Value`]s following an [`EncodingPlan`].
//!
//! [`ColumnReader`] and [`ColumnWriter`] extend this to nested columns, whose list items and
//! struct fields are stored as child columns, and [`PagedColumn`] to columns split into pages.
//! Columns may be wrapped in a [`ZoneIndex`] so that reads can skip zones of rows that cannot
//! match a [`ZonePredicate`].

pub use buffer::*;
pub use column::*;
pub use compression::*;
pub use decoder::*;
pub use encoder::*;
pub use node::*;
pub use offsets::*;
pub use options::*;
pub use paged::*;
pub use store::*;
pub use zoned::*;

mod buffer;
mod column;
mod compression;
mod decoder;
mod encoder;
mod node;
mod offsets;
mod options;
mod paged;
mod store;
mod zoned;
#[cfg(test)]
mod tests;
