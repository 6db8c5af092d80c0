use std::ops::Range;

use futures::future::try_join;
use futures::{FutureExt, future};
use strata_array::{Array, FixedSizeListArray, NullArray, Validity};
use strata_error::{StrataResult, strata_bail};

use crate::decoder::{ArrayFuture, Decoder, row_count};
use crate::node::{ArrayEncoding, FixedSizeList, Nullable};

impl Decoder {
    pub(super) fn decode_nullable(
        &self,
        nullable: &Nullable,
        rows: Range<u64>,
    ) -> StrataResult<ArrayFuture> {
        Ok(match nullable {
            Nullable::NoNull { values } => self.decode_rows(values, rows),
            Nullable::AllNull => {
                let len = row_count(&rows)?;
                future::ready(Ok(Array::from(NullArray::new(len)))).boxed()
            }
            Nullable::SomeNull { validity, values } => {
                let validity = self.decode_rows(validity, rows.clone());
                if let ArrayEncoding::Dictionary(dict) = values.as_ref() {
                    return self.decode_dictionary(dict, rows, Some(validity));
                }
                let values = self.decode_rows(values, rows);
                async move {
                    let (validity, values) = try_join(validity, values).await?;
                    values.with_validity(validity_from_bits(&validity)?)
                }
                .boxed()
            }
        })
    }

    pub(super) fn decode_fixed_size_list(
        &self,
        fsl: &FixedSizeList,
        rows: Range<u64>,
    ) -> StrataResult<ArrayFuture> {
        let dimension = fsl.dimension;
        let dim = u64::from(dimension);
        if dim == 0 {
            strata_bail!(CorruptData: "Fixed size list with zero dimension")
        }
        let items = match (rows.start.checked_mul(dim), rows.end.checked_mul(dim)) {
            (Some(start), Some(end)) => start..end,
            _ => strata_bail!(RangeError: "Rows {:?} of dimension {} overflow u64", rows, dim),
        };
        let items = self.decode_rows(&fsl.items, items);
        Ok(async move {
            let items = items.await?;
            Ok(Array::from(FixedSizeListArray::try_new(dimension, items)?))
        }
        .boxed())
    }
}

/// Row `i` is valid iff bit `i` of the validity child is set.
pub(super) fn validity_from_bits(bits: &Array) -> StrataResult<Validity> {
    let Array::Primitive(bits) = bits else {
        strata_bail!(CorruptData: "Validity must decode to a bitmap")
    };
    if bits.bits_per_value() != 1 {
        strata_bail!(
            CorruptData: "Validity must be stored at 1 bit per value, got {}",
            bits.bits_per_value()
        )
    }
    Ok(bits.u64_values()?.into_iter().map(|b| b == 1).collect())
}
