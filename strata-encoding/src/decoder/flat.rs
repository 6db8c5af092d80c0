use std::ops::Range;
use std::sync::Arc;

use bytes::Bytes;
use futures::{FutureExt, TryFutureExt, future};
use strata_array::bitpacking::byte_span;
use strata_array::{Array, PrimitiveArray};
use strata_error::{StrataResult, strata_bail, strata_err};

use crate::compression::CompressionScheme;
use crate::decoder::{ArrayFuture, Decoder, SharedBuffer, row_count};
use crate::node::Flat;

impl Decoder {
    pub(super) fn decode_flat(&self, flat: &Flat, rows: Range<u64>) -> StrataResult<ArrayFuture> {
        let bits = flat.bits_per_value;
        let len = row_count(&rows)?;
        let scheme = flat
            .compression
            .as_deref()
            .map(|name| self.ctx.compression.get(name))
            .transpose()?
            .flatten();

        if len == 0 {
            let empty = PrimitiveArray::try_new(bits, 0, 0, Bytes::new()).map(Array::from);
            return Ok(future::ready(empty).boxed());
        }

        let (span, bit_offset) = byte_span(&rows, bits)?;
        match scheme {
            None => {
                let fetch = self.ctx.store.request(flat.buffer, Some(span));
                Ok(async move {
                    let data = fetch.await?;
                    Ok(Array::from(PrimitiveArray::try_new(bits, bit_offset, len, data)?))
                }
                .boxed())
            }
            Some(scheme) => {
                let whole = self.decompressed(flat, scheme);
                Ok(async move {
                    let data = whole.await?;
                    if span.end > data.len() as u64 {
                        strata_bail!(
                            CorruptData: "Decompressed buffer holds {} bytes, rows need {:?}",
                            data.len(),
                            span
                        )
                    }
                    let start = usize::try_from(span.start)
                        .map_err(|_| strata_err!("Byte offset overflows usize"))?;
                    let end = usize::try_from(span.end)
                        .map_err(|_| strata_err!("Byte offset overflows usize"))?;
                    let data = data.slice(start..end);
                    Ok(Array::from(PrimitiveArray::try_new(bits, bit_offset, len, data)?))
                }
                .boxed())
            }
        }
    }

    /// A compressed buffer has no random access: it is fetched and decompressed in full, once
    /// per context.
    fn decompressed(&self, flat: &Flat, scheme: Arc<dyn CompressionScheme>) -> SharedBuffer {
        let buffer = flat.buffer;
        let bits = flat.bits_per_value;
        self.ctx
            .decompressed
            .write()
            .entry(buffer)
            .or_insert_with(|| {
                log::trace!("Decompressing buffer {} with {}", buffer, scheme.name());
                let fetch = self.ctx.store.request(buffer, None);
                async move {
                    let compressed = fetch.await?;
                    scheme.decompress(&compressed, bits)
                }
                .map_err(Arc::new)
                .boxed()
                .shared()
            })
            .clone()
    }
}
