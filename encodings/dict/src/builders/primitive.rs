use std::collections::HashMap;
use std::collections::hash_map::Entry;

use rustc_hash::FxBuildHasher;
use strata_array::{Array, PrimitiveArray};
use strata_error::{StrataResult, strata_bail};

use crate::builders::DictEncoder;

/// Dictionary encode primitive values of up to 64 bits.
pub struct PrimitiveDictBuilder {
    lookup: HashMap<u64, u64, FxBuildHasher>,
    values: Vec<u64>,
    bits_per_value: u64,
}

impl PrimitiveDictBuilder {
    pub fn new(bits_per_value: u64) -> Self {
        Self {
            lookup: HashMap::with_hasher(FxBuildHasher),
            values: Vec::new(),
            bits_per_value,
        }
    }

    #[inline]
    fn encode_value(&mut self, v: u64) -> u64 {
        match self.lookup.entry(v) {
            Entry::Occupied(o) => *o.get(),
            Entry::Vacant(vac) => {
                let next_code = self.values.len() as u64;
                vac.insert(next_code);
                self.values.push(v);
                next_code
            }
        }
    }
}

impl DictEncoder for PrimitiveDictBuilder {
    fn encode(&mut self, array: &Array) -> StrataResult<Vec<u64>> {
        let Array::Primitive(primitive) = array else {
            strata_bail!("Can only encode primitive arrays")
        };
        if primitive.bits_per_value() != self.bits_per_value {
            strata_bail!(
                "Can only encode arrays of {} bits, got {}",
                self.bits_per_value,
                primitive.bits_per_value()
            )
        }
        let validity = primitive.validity();
        Ok(primitive
            .u64_values()?
            .into_iter()
            .enumerate()
            .map(|(idx, v)| {
                if validity.is_valid(idx) {
                    self.encode_value(v)
                } else {
                    0
                }
            })
            .collect())
    }

    fn values(&mut self) -> StrataResult<Array> {
        Ok(PrimitiveArray::from_u64s(&self.values, self.bits_per_value)?.into())
    }
}
