use std::ops::Range;

use futures::future::BoxFuture;
use futures::{FutureExt, future};
use strata_array::{Array, ListArray};
use strata_error::{StrataResult, strata_bail};

use crate::decoder::{ArrayFuture, Decoder, offset_values};
use crate::node::{EncodingRef, List};
use crate::offsets::OffsetCodec;

/// The raw offset of the row before a range, if any, and the raw offsets of the range.
pub(super) type RawOffsets = (Option<u64>, Vec<u64>);

impl Decoder {
    pub(super) fn decode_list(&self, list: &List, rows: Range<u64>) -> StrataResult<ArrayFuture> {
        let codec = OffsetCodec::try_new(list.null_offset_adjustment)?;
        let num_items = list.num_items;
        let offsets = self.read_offsets(&list.offsets, rows);
        Ok(async move {
            let (before, raw) = offsets.await?;
            let decoded = codec.decode(before, &raw)?;
            if decoded.items.end > num_items {
                strata_bail!(
                    CorruptData: "List rows address items {:?} of {}",
                    decoded.items,
                    num_items
                )
            }
            Ok(Array::from(ListArray::try_new(
                decoded.offsets,
                decoded.validity,
                decoded.items,
            )?))
        }
        .boxed())
    }

    /// Read the offsets of `rows` together with the offset of the row before them. The preceding
    /// offset is only read when the range does not start at row zero.
    pub(super) fn read_offsets(
        &self,
        offsets: &EncodingRef,
        rows: Range<u64>,
    ) -> BoxFuture<'static, StrataResult<RawOffsets>> {
        if rows.is_empty() {
            return future::ready(Ok((None, vec![]))).boxed();
        }
        let preceding = rows.start > 0;
        let read = if preceding {
            rows.start - 1..rows.end
        } else {
            rows
        };
        let fut = self.decode_rows(offsets, read);
        async move {
            let raw = offset_values(&fut.await?)?;
            Ok(match raw.split_first() {
                Some((&before, rest)) if preceding => (Some(before), rest.to_vec()),
                _ => (None, raw),
            })
        }
        .boxed()
    }
}
