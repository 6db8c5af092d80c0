//! The encoding tree: an immutable description of how a column's values are laid out across
//! buffers.
//!
//! Nodes are shared through [`EncodingRef`] so that a subtree, such as a dictionary written once
//! per column, can be referenced by the trees of many pages.

use std::sync::Arc;

use bytes::Bytes;
use strata_error::{StrataResult, strata_bail};

use crate::buffer::BufferRef;

mod proto;

pub type EncodingRef = Arc<ArrayEncoding>;

/// Fixed-width values packed LSB-first at `bits_per_value` bits each.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flat {
    pub bits_per_value: u64,
    pub buffer: BufferRef,
    /// Compression scheme applied to the whole buffer, if any.
    pub compression: Option<String>,
}

impl Flat {
    pub fn new(bits_per_value: u64, buffer: BufferRef) -> Self {
        Self {
            bits_per_value,
            buffer,
            compression: None,
        }
    }

    pub fn with_compression(mut self, scheme: impl Into<String>) -> Self {
        self.compression = Some(scheme.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Nullable {
    /// No value is null.
    NoNull { values: EncodingRef },
    /// Row `i` is null iff bit `i` of the 1-bit `validity` child is unset.
    SomeNull {
        validity: EncodingRef,
        values: EncodingRef,
    },
    /// Every value is null; nothing is stored.
    AllNull,
}

/// Lists of exactly `dimension` items, stored inline in the `items` child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedSizeList {
    pub dimension: u32,
    pub items: EncodingRef,
}

/// Variable-length lists whose items are a separate column. See [`crate::OffsetCodec`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct List {
    pub offsets: EncodingRef,
    pub null_offset_adjustment: u64,
    pub num_items: u64,
}

/// Variable-width byte values, addressed by offsets in `indices` into the `bytes` heap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binary {
    pub indices: EncodingRef,
    pub bytes: EncodingRef,
    pub null_adjustment: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dictionary {
    pub indices: EncodingRef,
    pub items: EncodingRef,
    pub num_dictionary_items: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fsst {
    pub binary: EncodingRef,
    pub symbol_table: Bytes,
}

/// A node of the encoding tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayEncoding {
    Flat(Flat),
    Nullable(Nullable),
    FixedSizeList(FixedSizeList),
    List(List),
    /// Struct fields are separate columns; the node itself stores nothing.
    Struct,
    Binary(Binary),
    Dictionary(Dictionary),
    Fsst(Fsst),
}

impl ArrayEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            ArrayEncoding::Flat(_) => "flat",
            ArrayEncoding::Nullable(_) => "nullable",
            ArrayEncoding::FixedSizeList(_) => "fixed_size_list",
            ArrayEncoding::List(_) => "list",
            ArrayEncoding::Struct => "struct",
            ArrayEncoding::Binary(_) => "binary",
            ArrayEncoding::Dictionary(_) => "dictionary",
            ArrayEncoding::Fsst(_) => "fsst",
        }
    }

    pub fn children(&self) -> Vec<&EncodingRef> {
        match self {
            ArrayEncoding::Flat(_) | ArrayEncoding::Struct => vec![],
            ArrayEncoding::Nullable(Nullable::AllNull) => vec![],
            ArrayEncoding::Nullable(Nullable::NoNull { values }) => vec![values],
            ArrayEncoding::Nullable(Nullable::SomeNull { validity, values }) => {
                vec![validity, values]
            }
            ArrayEncoding::FixedSizeList(fsl) => vec![&fsl.items],
            ArrayEncoding::List(list) => vec![&list.offsets],
            ArrayEncoding::Binary(binary) => vec![&binary.indices, &binary.bytes],
            ArrayEncoding::Dictionary(dict) => vec![&dict.indices, &dict.items],
            ArrayEncoding::Fsst(fsst) => vec![&fsst.binary],
        }
    }

    /// The node beneath any [`Nullable::NoNull`] or [`Nullable::SomeNull`] wrapper.
    pub fn values(&self) -> &ArrayEncoding {
        match self {
            ArrayEncoding::Nullable(Nullable::NoNull { values })
            | ArrayEncoding::Nullable(Nullable::SomeNull { values, .. }) => values.values(),
            other => other,
        }
    }

    /// Every [`Flat`] leaf of the tree, in depth-first order.
    pub fn leaves(&self) -> Vec<&Flat> {
        match self {
            ArrayEncoding::Flat(flat) => vec![flat],
            other => other
                .children()
                .into_iter()
                .flat_map(|c| c.leaves())
                .collect(),
        }
    }

    /// Check the structural invariants of the tree.
    pub fn validate(&self) -> StrataResult<()> {
        match self {
            ArrayEncoding::Flat(flat) => {
                if flat.bits_per_value == 0 {
                    strata_bail!(CorruptData: "Flat encoding with zero bits per value")
                }
                if flat.bits_per_value > 64 && flat.bits_per_value % 8 != 0 {
                    strata_bail!(
                        CorruptData: "Flat values wider than 64 bits must be byte aligned, got {}",
                        flat.bits_per_value
                    )
                }
            }
            ArrayEncoding::FixedSizeList(fsl) if fsl.dimension == 0 => {
                strata_bail!(CorruptData: "Fixed size list with zero dimension")
            }
            ArrayEncoding::List(list) if list.null_offset_adjustment <= list.num_items => {
                strata_bail!(
                    CorruptData: "List null offset adjustment {} must exceed its {} items",
                    list.null_offset_adjustment,
                    list.num_items
                )
            }
            ArrayEncoding::Binary(binary) if binary.null_adjustment == 0 => {
                strata_bail!(CorruptData: "Binary null adjustment must be positive")
            }
            _ => {}
        }
        self.children().into_iter().try_for_each(|c| c.validate())
    }
}

/// Coarse row-range pruning around a column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneIndex {
    pub rows_per_zone: u32,
    pub zone_map_buffer: BufferRef,
    pub inner: Arc<ColumnEncoding>,
}

/// The root of a column's encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnEncoding {
    Values(EncodingRef),
    ZoneIndex(ZoneIndex),
}

impl ColumnEncoding {
    /// The array encoding beneath every zone index.
    pub fn values(&self) -> &EncodingRef {
        match self {
            ColumnEncoding::Values(values) => values,
            ColumnEncoding::ZoneIndex(zoned) => zoned.inner.values(),
        }
    }

    pub fn validate(&self) -> StrataResult<()> {
        match self {
            ColumnEncoding::Values(values) => values.validate(),
            ColumnEncoding::ZoneIndex(zoned) => {
                if zoned.rows_per_zone == 0 {
                    strata_bail!(CorruptData: "Zone index with zero rows per zone")
                }
                zoned.inner.validate()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use crate::buffer::BufferRef;
    use crate::node::{ArrayEncoding, Flat, List, Nullable};

    fn flat(bits: u64, index: u32) -> Arc<ArrayEncoding> {
        Arc::new(ArrayEncoding::Flat(Flat::new(bits, BufferRef::page(index))))
    }

    #[test]
    fn leaves_depth_first() {
        let node = ArrayEncoding::Nullable(Nullable::SomeNull {
            validity: flat(1, 0),
            values: flat(32, 1),
        });
        let indices = node.leaves().iter().map(|f| f.buffer.index).collect::<Vec<_>>();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(node.values(), flat(32, 1).as_ref());
    }

    #[rstest]
    #[case(0)]
    #[case(65)]
    fn invalid_flat_width(#[case] bits: u64) {
        assert!(flat(bits, 0).validate().unwrap_err().is_corrupt_data());
    }

    #[test]
    fn adjustment_must_exceed_items() {
        let list = ArrayEncoding::List(List {
            offsets: flat(8, 0),
            null_offset_adjustment: 5,
            num_items: 5,
        });
        assert!(list.validate().unwrap_err().is_corrupt_data());
    }
}
