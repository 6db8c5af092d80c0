//! In-memory arrays produced by decoding an encoding tree.
//!
//! Every decoded span of rows is an [`Array`]. Leaves are [`PrimitiveArray`] (fixed-width,
//! bit-packed) and [`BinaryArray`] (variable-width); [`ListArray`], [`FixedSizeListArray`] and
//! [`StructArray`] nest them. Nullability is carried by a [`Validity`] on each array.

pub use array::*;
pub use binary::*;
pub use list::*;
pub use primitive::*;
pub use validity::*;
pub use value::*;

mod array;
mod binary;
pub mod bitpacking;
mod list;
mod primitive;
mod validity;
mod value;
