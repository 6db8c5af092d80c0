//! Recursive decoding of an encoding tree for a range of rows.
//!
//! Every decode produces a `'static` future: the only suspension points are buffer requests
//! made against the [`BufferStore`], and sibling subtrees are requested before any of them is
//! awaited so that their fetches overlap.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::{BoxFuture, OptionFuture, Shared};
use futures::{FutureExt, future};
use parking_lot::RwLock;
use strata_array::Array;
use strata_error::{SharedStrataResult, StrataResult, strata_bail, strata_err};

use crate::buffer::BufferRef;
use crate::compression::CompressionRegistry;
use crate::node::{ArrayEncoding, EncodingRef};
use crate::offsets::OffsetCodec;
use crate::options::DecodeOptions;
use crate::store::BufferStore;
use crate::zoned::SharedZoneMap;

mod dict;
mod flat;
mod list;
mod nullable;
mod strings;

/// Static future resolving to a decoded span of rows.
pub type ArrayFuture = BoxFuture<'static, StrataResult<Array>>;

pub(crate) type SharedArray = Shared<BoxFuture<'static, SharedStrataResult<Array>>>;
pub(crate) type SharedBuffer = Shared<BoxFuture<'static, SharedStrataResult<Bytes>>>;

/// Everything a decode needs besides the tree: where buffers come from, how to decompress them,
/// and the state shared between concurrent decodes of the same column.
pub struct DecodeContext {
    store: Arc<dyn BufferStore>,
    compression: Arc<CompressionRegistry>,
    options: DecodeOptions,

    /// Materialized dictionary items keyed by the address of their node. The node is kept alive
    /// next to the future so that the address cannot be reused by another node.
    dictionaries: RwLock<HashMap<usize, (EncodingRef, SharedArray)>>,
    /// Whole decompressed buffers.
    decompressed: RwLock<HashMap<BufferRef, SharedBuffer>>,
    pub(crate) zone_maps: RwLock<HashMap<BufferRef, SharedZoneMap>>,
}

impl DecodeContext {
    pub fn new(store: Arc<dyn BufferStore>) -> Self {
        Self {
            store,
            compression: Arc::new(CompressionRegistry::default()),
            options: DecodeOptions::default(),
            dictionaries: Default::default(),
            decompressed: Default::default(),
            zone_maps: Default::default(),
        }
    }

    pub fn with_compression(mut self, compression: Arc<CompressionRegistry>) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<dyn BufferStore> {
        &self.store
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Number of distinct dictionaries materialized so far.
    pub fn cached_dictionaries(&self) -> usize {
        self.dictionaries.read().len()
    }
}

/// Decodes row ranges of encoding trees. Cloning is cheap and clones share their caches.
#[derive(Clone)]
pub struct Decoder {
    ctx: Arc<DecodeContext>,
}

impl Decoder {
    pub fn new(ctx: DecodeContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn context(&self) -> &DecodeContext {
        &self.ctx
    }

    /// Decode rows `rows` of a node holding `num_rows` rows.
    pub fn decode(&self, node: &EncodingRef, rows: Range<u64>, num_rows: u64) -> ArrayFuture {
        if let Err(e) = check_rows(&rows, num_rows) {
            return future::ready(Err(e)).boxed();
        }
        self.decode_rows(node, rows)
    }

    /// The absolute span of items of a list node, or of heap bytes of a binary node, addressed
    /// by `rows`.
    ///
    /// Only the offsets of rows `rows.start - 1` and `rows.end - 1` are read, so the cost does not
    /// depend on the number of rows in the range.
    pub fn list_item_range(
        &self,
        node: &EncodingRef,
        rows: Range<u64>,
        num_rows: u64,
    ) -> BoxFuture<'static, StrataResult<Range<u64>>> {
        self.try_list_item_range(node, rows, num_rows)
            .unwrap_or_else(|e| future::ready(Err(e)).boxed())
    }

    fn try_list_item_range(
        &self,
        node: &EncodingRef,
        rows: Range<u64>,
        num_rows: u64,
    ) -> StrataResult<BoxFuture<'static, StrataResult<Range<u64>>>> {
        check_rows(&rows, num_rows)?;
        let (offsets, adjustment) = match node.values() {
            ArrayEncoding::List(list) => (&list.offsets, list.null_offset_adjustment),
            ArrayEncoding::Binary(binary) => (&binary.indices, binary.null_adjustment),
            other => strata_bail!(
                InvalidArgument: "Cannot compute an item range of a {} node",
                other.name()
            ),
        };
        let codec = OffsetCodec::try_new(adjustment)?;

        let before = (rows.start > 0 && rows.start < rows.end)
            .then(|| self.decode_rows(offsets, rows.start - 1..rows.start));
        let last = (rows.end > rows.start).then(|| self.decode_rows(offsets, rows.end - 1..rows.end));

        Ok(async move {
            let (before, last) =
                future::join(OptionFuture::from(before), OptionFuture::from(last)).await;
            let before = before.transpose()?.map(|a| single_offset(&a)).transpose()?;
            let last = last.transpose()?.map(|a| single_offset(&a)).transpose()?;
            codec.span(before, last)
        }
        .boxed())
    }

    /// Decode without checking `rows` against the extent of the node, which the caller has done.
    pub(crate) fn decode_rows(&self, node: &EncodingRef, rows: Range<u64>) -> ArrayFuture {
        log::trace!("Decoding {} rows {:?}", node.name(), rows);
        let fut = match node.as_ref() {
            ArrayEncoding::Flat(flat) => self.decode_flat(flat, rows),
            ArrayEncoding::Nullable(nullable) => self.decode_nullable(nullable, rows),
            ArrayEncoding::FixedSizeList(fsl) => self.decode_fixed_size_list(fsl, rows),
            ArrayEncoding::List(list) => self.decode_list(list, rows),
            ArrayEncoding::Struct => decode_struct(rows),
            ArrayEncoding::Binary(binary) => self.decode_binary(binary, rows),
            ArrayEncoding::Dictionary(dict) => self.decode_dictionary(dict, rows, None),
            ArrayEncoding::Fsst(fsst) => self.decode_fsst(fsst, rows),
        };
        fut.unwrap_or_else(|e| future::ready(Err(e)).boxed())
    }
}

fn decode_struct(rows: Range<u64>) -> StrataResult<ArrayFuture> {
    let len = row_count(&rows)?;
    Ok(future::ready(strata_array::StructArray::try_new(len, vec![]).map(Array::from)).boxed())
}

pub(crate) fn check_rows(rows: &Range<u64>, num_rows: u64) -> StrataResult<()> {
    if rows.start > rows.end || rows.end > num_rows {
        strata_bail!(RangeError: "Rows {:?} are outside of 0..{}", rows, num_rows)
    }
    Ok(())
}

pub(crate) fn row_count(rows: &Range<u64>) -> StrataResult<usize> {
    usize::try_from(rows.end - rows.start)
        .map_err(|_| strata_err!(RangeError: "Row range {:?} overflows usize", rows))
}

/// Offsets and indices are stored as non-null integers.
pub(crate) fn offset_values(array: &Array) -> StrataResult<Vec<u64>> {
    match array {
        Array::Primitive(p) => {
            if p.validity().null_count(p.len())? > 0 {
                strata_bail!(CorruptData: "Offsets must not contain nulls")
            }
            p.u64_values()
        }
        Array::Null(n) if n.is_empty() => Ok(vec![]),
        _ => strata_bail!(CorruptData: "Offsets must decode to integers"),
    }
}

fn single_offset(array: &Array) -> StrataResult<u64> {
    match offset_values(array)?.as_slice() {
        [offset] => Ok(*offset),
        other => strata_bail!(CorruptData: "Expected a single offset, got {}", other.len()),
    }
}
