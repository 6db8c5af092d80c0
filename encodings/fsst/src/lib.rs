//! FSST compression of binary values.
//!
//! Strings are compressed one value at a time against a static table of up to 255 symbols of
//! at most 8 bytes each, so any single value can be decompressed without its neighbours.

pub use array::*;
pub use compress::*;

mod array;
mod compress;
#[cfg(test)]
mod tests;
