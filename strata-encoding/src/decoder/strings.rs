use std::ops::Range;

use bytes::Bytes;
use futures::FutureExt;
use strata_array::{Array, BinaryArray};
use strata_error::{StrataResult, strata_bail};
use strata_fsst::FsstArray;

use crate::decoder::{ArrayFuture, Decoder};
use crate::node::{Binary, Fsst};
use crate::offsets::OffsetCodec;

impl Decoder {
    pub(super) fn decode_binary(&self, binary: &Binary, rows: Range<u64>) -> StrataResult<ArrayFuture> {
        let codec = OffsetCodec::try_new(binary.null_adjustment)?;
        let offsets = self.read_offsets(&binary.indices, rows);
        let decoder = self.clone();
        let bytes = binary.bytes.clone();
        Ok(async move {
            let (before, raw) = offsets.await?;
            let decoded = codec.decode(before, &raw)?;
            let heap = heap_bytes(decoder.decode_rows(&bytes, decoded.items.clone()).await?)?;
            Ok(Array::from(BinaryArray::try_new(
                decoded.offsets,
                heap,
                decoded.validity,
            )?))
        }
        .boxed())
    }

    pub(super) fn decode_fsst(&self, fsst: &Fsst, rows: Range<u64>) -> StrataResult<ArrayFuture> {
        let codes = self.decode_rows(&fsst.binary, rows);
        let symbol_table = fsst.symbol_table.clone();
        Ok(async move {
            let Array::Binary(codes) = codes.await? else {
                strata_bail!(CorruptData: "FSST codes must decode to binary values")
            };
            let fsst = FsstArray::from_symbol_table(&symbol_table, codes)?;
            Ok(Array::from(fsst.decompress()?))
        }
        .boxed())
    }
}

/// The bytes of a heap stored as one byte per row.
fn heap_bytes(heap: Array) -> StrataResult<Bytes> {
    let Array::Primitive(heap) = heap else {
        strata_bail!(CorruptData: "Binary heap must decode to bytes")
    };
    if heap.bits_per_value() != 8 || heap.bit_offset() != 0 {
        strata_bail!(
            CorruptData: "Binary heap must be stored at 8 bits per value, got {}",
            heap.bits_per_value()
        )
    }
    Ok(heap.data().slice(0..heap.len()))
}
