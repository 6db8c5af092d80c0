use std::collections::hash_map::Entry;
use std::ops::Range;
use std::sync::Arc;

use futures::future::try_join3;
use futures::{FutureExt, TryFutureExt, future};
use strata_array::Array;
use strata_dict::DictArray;
use strata_error::{StrataError, StrataResult, strata_bail};

use crate::decoder::nullable::validity_from_bits;
use crate::decoder::{ArrayFuture, Decoder, SharedArray};
use crate::node::{Dictionary, EncodingRef};

impl Decoder {
    /// Decode the rows of a dictionary. When `validity` is given, the indices of null rows are
    /// masked before they are checked against the dictionary, so they may hold any value.
    pub(super) fn decode_dictionary(
        &self,
        dict: &Dictionary,
        rows: Range<u64>,
        validity: Option<ArrayFuture>,
    ) -> StrataResult<ArrayFuture> {
        let codes = self.decode_rows(&dict.indices, rows);
        let items = self
            .dictionary_items(&dict.items, dict.num_dictionary_items)
            .map_err(StrataError::from);
        let validity = validity.map(|v| v.map_ok(Some).boxed());
        let validity = validity.unwrap_or_else(|| future::ready(Ok(None)).boxed());
        Ok(async move {
            let (validity, codes, items) = try_join3(validity, codes, items).await?;
            let Array::Primitive(codes) = codes else {
                strata_bail!(CorruptData: "Dictionary indices must decode to integers")
            };
            let codes = match validity {
                Some(validity) => {
                    let validity = codes.validity().clone().and(validity_from_bits(&validity)?);
                    codes.with_validity(validity)?
                }
                None => codes,
            };
            DictArray::try_new(codes, items)?.canonicalize()
        }
        .boxed())
    }

    /// The items of a dictionary, materialized once per context no matter how many pages or
    /// concurrent decodes reference them.
    fn dictionary_items(&self, items: &EncodingRef, num_items: u32) -> SharedArray {
        let key = Arc::as_ptr(items).addr();
        match self.ctx.dictionaries.write().entry(key) {
            Entry::Occupied(e) => e.get().1.clone(),
            Entry::Vacant(e) => {
                log::debug!("Materializing dictionary of {} items", num_items);
                let fut = self.decode_rows(items, 0..u64::from(num_items));
                let shared = async move {
                    let items = fut.await?;
                    if items.len() as u64 != u64::from(num_items) {
                        strata_bail!(
                            CorruptData: "Dictionary declares {} items, decoded {}",
                            num_items,
                            items.len()
                        )
                    }
                    Ok(items)
                }
                .map_err(Arc::new)
                .boxed()
                .shared();
                e.insert((items.clone(), shared.clone()));
                shared
            }
        }
    }
}
