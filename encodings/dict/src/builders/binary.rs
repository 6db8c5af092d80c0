use std::collections::HashMap;

use bytes::Bytes;
use rustc_hash::FxBuildHasher;
use strata_array::{Array, BinaryArray, PrimitiveArray};
use strata_error::{StrataResult, strata_bail, strata_err};

use crate::builders::DictEncoder;

/// Dictionary encode byte strings, either variable-width binary values or fixed-width values
/// wider than 64 bits.
pub struct BytesDictBuilder {
    lookup: HashMap<Bytes, u64, FxBuildHasher>,
    values: Vec<Bytes>,
    fixed_width: Option<u64>,
}

impl BytesDictBuilder {
    pub fn variable_width() -> Self {
        Self {
            lookup: HashMap::with_hasher(FxBuildHasher),
            values: Vec::new(),
            fixed_width: None,
        }
    }

    pub fn fixed_width(bits_per_value: u64) -> Self {
        Self {
            fixed_width: Some(bits_per_value),
            ..Self::variable_width()
        }
    }

    #[inline]
    fn encode_value(&mut self, val: &[u8]) -> u64 {
        if let Some(code) = self.lookup.get(val) {
            return *code;
        }
        let next_code = self.values.len() as u64;
        let val = Bytes::copy_from_slice(val);
        self.lookup.insert(val.clone(), next_code);
        self.values.push(val);
        next_code
    }
}

impl DictEncoder for BytesDictBuilder {
    fn encode(&mut self, array: &Array) -> StrataResult<Vec<u64>> {
        match (array, self.fixed_width) {
            (Array::Binary(binary), None) => binary
                .iter()
                .map(|value| Ok(value?.map(|v| self.encode_value(v)).unwrap_or(0)))
                .collect(),
            (Array::Primitive(primitive), Some(bits)) if primitive.bits_per_value() == bits => {
                (0..primitive.len())
                    .map(|idx| {
                        if primitive.validity().is_valid(idx) {
                            Ok(self.encode_value(primitive.value_bytes(idx)?))
                        } else {
                            Ok(0)
                        }
                    })
                    .collect()
            }
            _ => strata_bail!("Array does not match the dictionary builder's value width"),
        }
    }

    fn values(&mut self) -> StrataResult<Array> {
        match self.fixed_width {
            None => Ok(BinaryArray::from_iter_opt(self.values.iter().map(|v| Some(v.as_ref()))).into()),
            Some(bits) => {
                let width = usize::try_from(bits / 8)
                    .map_err(|_| strata_err!("Value width overflows usize"))?;
                Ok(PrimitiveArray::from_fixed_width(self.values.iter().map(|v| v.as_ref()), width)?.into())
            }
        }
    }
}
