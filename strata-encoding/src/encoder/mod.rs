//! Building encoding trees and their buffers from logical values.
//!
//! The encoder mirrors the decoder: each [`EncodingPlan`] variant produces the node of the same
//! name, bottom-up, with buffers placed through a caller supplied [`BufferAllocator`]. List items
//! and struct fields are separate columns, so encoding a list or struct hands back the child
//! values for the caller to encode in turn.

use std::sync::Arc;

use bytes::Bytes;
pub use plan::*;
use strata_array::bitpacking::pack;
use strata_array::{Array, BinaryArray, PrimitiveArray, Validity, Value};
use strata_dict::dict_encode;
use strata_error::{StrataResult, strata_bail, strata_err};
use strata_fsst::{fsst_compress, fsst_train_compressor};

use crate::buffer::BufferLocation;
use crate::compression::CompressionRegistry;
use crate::node::{
    ArrayEncoding, Binary, Dictionary, EncodingRef, FixedSizeList, Flat, Fsst, List, Nullable,
};
use crate::offsets::OffsetCodec;
use crate::store::BufferAllocator;

mod plan;

/// Values of the child columns of an encoded array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NestedValues {
    Leaf,
    /// The items of every list, concatenated in row order.
    ListItems(Vec<Value>),
    /// One vector of values per struct field.
    StructFields(Vec<Vec<Value>>),
}

#[derive(Clone, Debug)]
pub struct EncodedArray {
    pub node: EncodingRef,
    pub num_rows: u64,
    pub nested: NestedValues,
}

/// Encodes logical values following an [`EncodingPlan`].
#[derive(Clone, Debug, Default)]
pub struct ArrayEncoder {
    compression: Arc<CompressionRegistry>,
}

impl ArrayEncoder {
    pub fn new(compression: Arc<CompressionRegistry>) -> Self {
        Self { compression }
    }

    pub fn encode(
        &self,
        values: &[Value],
        plan: &EncodingPlan,
        allocator: &mut dyn BufferAllocator,
    ) -> StrataResult<EncodedArray> {
        let (node, nested) = match plan {
            EncodingPlan::List {
                offsets,
                null_offset_adjustment,
                ..
            } => {
                let (node, items) =
                    self.encode_list(values, offsets, *null_offset_adjustment, allocator)?;
                (node, NestedValues::ListItems(items))
            }
            EncodingPlan::Struct { fields } => (
                Arc::new(ArrayEncoding::Struct),
                NestedValues::StructFields(split_struct(values, fields.len())?),
            ),
            _ => (
                self.encode_nullable(values, plan, allocator)?,
                NestedValues::Leaf,
            ),
        };
        log::debug!(
            "Encoded {} rows as {} node",
            values.len(),
            node.name()
        );
        Ok(EncodedArray {
            node,
            num_rows: values.len() as u64,
            nested,
        })
    }

    fn encode_list(
        &self,
        values: &[Value],
        offsets: &EncodingPlan,
        adjustment: Option<u64>,
        allocator: &mut dyn BufferAllocator,
    ) -> StrataResult<(EncodingRef, Vec<Value>)> {
        let mut items = Vec::new();
        let mut lengths = Vec::with_capacity(values.len());
        for value in values {
            match value {
                Value::Null => lengths.push(None),
                Value::List(list) => {
                    lengths.push(Some(list.len() as u64));
                    items.extend(list.iter().cloned());
                }
                other => strata_bail!(EncodingPolicy: "Expected a list, got {}", other),
            }
        }
        let num_items = items.len() as u64;
        let codec = offset_codec(adjustment, num_items)?;
        let offsets = self.encode_integers(&codec.encode(lengths)?, offsets, allocator)?;
        let node = ArrayEncoding::List(List {
            offsets,
            null_offset_adjustment: codec.adjustment(),
            num_items,
        });
        Ok((Arc::new(node), items))
    }

    /// Encode values, wrapping them in a [`Nullable`] node unless the encoding stores its own
    /// nulls.
    fn encode_nullable(
        &self,
        values: &[Value],
        plan: &EncodingPlan,
        allocator: &mut dyn BufferAllocator,
    ) -> StrataResult<EncodingRef> {
        if matches!(plan, EncodingPlan::Binary { .. } | EncodingPlan::Fsst { .. }) {
            return self.encode_values(values, plan, allocator);
        }
        let null_count = values.iter().filter(|v| v.is_null()).count();
        if !values.is_empty() && null_count == values.len() {
            return Ok(Arc::new(ArrayEncoding::Nullable(Nullable::AllNull)));
        }
        let inner = self.encode_values(values, plan, allocator)?;
        if null_count == 0 {
            return Ok(Arc::new(ArrayEncoding::Nullable(Nullable::NoNull {
                values: inner,
            })));
        }
        let bits = pack(values.iter().map(|v| u64::from(!v.is_null())), 1)?;
        let validity = self.write_flat(Bytes::from(bits), 1, None, allocator)?;
        Ok(Arc::new(ArrayEncoding::Nullable(Nullable::SomeNull {
            validity,
            values: inner,
        })))
    }

    /// Encode values without a nullability wrapper. Null rows are stored as placeholders.
    fn encode_values(
        &self,
        values: &[Value],
        plan: &EncodingPlan,
        allocator: &mut dyn BufferAllocator,
    ) -> StrataResult<EncodingRef> {
        let node = match plan {
            EncodingPlan::Flat {
                bits_per_value,
                compression,
            } => {
                let raw = flat_bytes(values, *bits_per_value)?;
                return self.write_flat(raw, *bits_per_value, compression.as_deref(), allocator);
            }
            EncodingPlan::FixedSizeList { dimension, items } => {
                if !items.is_leaf() {
                    strata_bail!(
                        EncodingPolicy: "Fixed size list items cannot be a {} plan",
                        items.name()
                    )
                }
                if *dimension == 0 {
                    strata_bail!(EncodingPolicy: "Fixed size list dimension must be positive")
                }
                let dim = *dimension as usize;
                let mut flat_items = Vec::with_capacity(values.len() * dim);
                for value in values {
                    match value {
                        Value::Null => flat_items.extend(std::iter::repeat_n(Value::Null, dim)),
                        Value::List(list) if list.len() == dim => {
                            flat_items.extend(list.iter().cloned())
                        }
                        other => strata_bail!(
                            EncodingPolicy: "Expected a list of {} items, got {}",
                            dim,
                            other
                        ),
                    }
                }
                ArrayEncoding::FixedSizeList(FixedSizeList {
                    dimension: *dimension,
                    items: self.encode_nullable(&flat_items, items, allocator)?,
                })
            }
            EncodingPlan::Binary {
                indices,
                bytes,
                null_adjustment,
            } => {
                let mut heap = Vec::new();
                let mut lengths = Vec::with_capacity(values.len());
                for value in values {
                    match value {
                        Value::Null => lengths.push(None),
                        Value::Bytes(b) => {
                            heap.extend_from_slice(b);
                            lengths.push(Some(b.len() as u64));
                        }
                        other => strata_bail!(EncodingPolicy: "Expected bytes, got {}", other),
                    }
                }
                let codec = offset_codec(*null_adjustment, heap.len() as u64)?;
                let indices = self.encode_integers(&codec.encode(lengths)?, indices, allocator)?;
                let EncodingPlan::Flat {
                    bits_per_value: 8,
                    compression,
                } = bytes.as_ref()
                else {
                    strata_bail!(EncodingPolicy: "Binary heap must be a flat plan of 8 bits")
                };
                let bytes = self.write_flat(Bytes::from(heap), 8, compression.as_deref(), allocator)?;
                ArrayEncoding::Binary(Binary {
                    indices,
                    bytes,
                    null_adjustment: codec.adjustment(),
                })
            }
            EncodingPlan::Fsst { binary } => {
                if !matches!(binary.as_ref(), EncodingPlan::Binary { .. }) {
                    strata_bail!(EncodingPolicy: "FSST codes must use a binary plan")
                }
                let strings = binary_array(values)?;
                let compressor = fsst_train_compressor(&strings)?;
                let fsst = fsst_compress(&strings, &compressor)?;
                let codes = fsst.codes().to_values()?;
                ArrayEncoding::Fsst(Fsst {
                    binary: self.encode_values(&codes, binary, allocator)?,
                    symbol_table: Bytes::from(fsst.symbol_table()),
                })
            }
            EncodingPlan::Dictionary { indices, items } => {
                let dict = dict_encode(&dictionary_input(values)?)?;
                let num_dictionary_items = u32::try_from(dict.values().len()).map_err(|_| {
                    strata_err!(
                        EncodingPolicy: "{} distinct values do not fit a dictionary",
                        dict.values().len()
                    )
                })?;
                let codes = dict.codes().u64_values()?;
                ArrayEncoding::Dictionary(Dictionary {
                    indices: self.encode_integers(&codes, indices, allocator)?,
                    items: self.encode_nullable(&dict.values().to_values()?, items, allocator)?,
                    num_dictionary_items,
                })
            }
            EncodingPlan::List { .. } | EncodingPlan::Struct { .. } => strata_bail!(
                EncodingPolicy: "A {} plan describes a separate column and cannot be nested here",
                plan.name()
            ),
        };
        Ok(Arc::new(node))
    }

    /// Offsets and indices must be stored in a flat leaf.
    fn encode_integers(
        &self,
        values: &[u64],
        plan: &EncodingPlan,
        allocator: &mut dyn BufferAllocator,
    ) -> StrataResult<EncodingRef> {
        let EncodingPlan::Flat {
            bits_per_value,
            compression,
        } = plan
        else {
            strata_bail!(EncodingPolicy: "Offsets and indices need a flat plan, got {}", plan.name())
        };
        let bits = *bits_per_value;
        if bits == 0 || bits > 64 {
            strata_bail!(EncodingPolicy: "Cannot store integers at {} bits", bits)
        }
        if let Some(v) = values.iter().find(|&&v| !fits(v, bits)) {
            strata_bail!(EncodingPolicy: "Offset or index {} does not fit in {} bits", v, bits)
        }
        let raw = Bytes::from(pack(values.iter().copied(), bits)?);
        self.write_flat(raw, bits, compression.as_deref(), allocator)
    }

    fn write_flat(
        &self,
        raw: Bytes,
        bits_per_value: u64,
        compression: Option<&str>,
        allocator: &mut dyn BufferAllocator,
    ) -> StrataResult<EncodingRef> {
        let scheme = compression.filter(|name| !CompressionRegistry::is_uncompressed(name));
        let data = match scheme {
            Some(name) => self.compression.compress(name, raw, bits_per_value)?,
            None => raw,
        };
        let buffer = allocator.put(BufferLocation::Page, data);
        log::trace!("Wrote {}-bit flat buffer {}", bits_per_value, buffer);
        let flat = Flat::new(bits_per_value, buffer);
        Ok(Arc::new(ArrayEncoding::Flat(match scheme {
            Some(name) => flat.with_compression(name),
            None => flat,
        })))
    }
}

fn fits(value: u64, bits: u64) -> bool {
    bits >= 64 || value >> bits == 0
}

fn offset_codec(adjustment: Option<u64>, max_offset: u64) -> StrataResult<OffsetCodec> {
    match adjustment {
        None => OffsetCodec::for_items(max_offset),
        Some(adjustment) if adjustment <= max_offset => strata_bail!(
            EncodingPolicy: "Null adjustment {} does not exceed the largest offset {}",
            adjustment,
            max_offset
        ),
        Some(adjustment) => OffsetCodec::try_new(adjustment),
    }
}

/// Pack fixed-width values; null rows become zeros.
fn flat_bytes(values: &[Value], bits: u64) -> StrataResult<Bytes> {
    if bits == 0 {
        strata_bail!(EncodingPolicy: "Flat values need a positive width")
    }
    if bits <= 64 {
        let ints = values
            .iter()
            .map(|value| match value {
                Value::Null => Ok(0),
                Value::UInt(v) if fits(*v, bits) => Ok(*v),
                other => Err(strata_err!(
                    EncodingPolicy: "Value {} does not fit a {}-bit flat leaf",
                    other,
                    bits
                )),
            })
            .collect::<StrataResult<Vec<_>>>()?;
        return Ok(Bytes::from(pack(ints, bits)?));
    }
    if bits % 8 != 0 {
        strata_bail!(EncodingPolicy: "Values wider than 64 bits must be byte aligned, got {}", bits)
    }
    let width = usize::try_from(bits / 8)
        .map_err(|_| strata_err!(EncodingPolicy: "Value width {} overflows usize", bits))?;
    let mut data = Vec::with_capacity(values.len() * width);
    for value in values {
        match value {
            Value::Null => data.resize(data.len() + width, 0),
            Value::Bytes(b) if b.len() == width => data.extend_from_slice(b),
            other => strata_bail!(
                EncodingPolicy: "Value {} does not fit a {}-bit flat leaf",
                other,
                bits
            ),
        }
    }
    Ok(Bytes::from(data))
}

fn binary_array(values: &[Value]) -> StrataResult<BinaryArray> {
    let strings = values
        .iter()
        .map(|value| match value {
            Value::Null => Ok(None),
            Value::Bytes(b) => Ok(Some(b.as_ref())),
            other => Err(strata_err!(EncodingPolicy: "Expected bytes, got {}", other)),
        })
        .collect::<StrataResult<Vec<_>>>()?;
    Ok(BinaryArray::from_iter_opt(strings))
}

/// Dictionaries are built over integers or byte strings.
fn dictionary_input(values: &[Value]) -> StrataResult<Array> {
    if values.iter().any(|v| matches!(v, Value::Bytes(_))) {
        return Ok(binary_array(values)?.into());
    }
    let ints = values
        .iter()
        .map(|value| match value {
            Value::Null => Ok(0),
            Value::UInt(v) => Ok(*v),
            other => Err(strata_err!(
                EncodingPolicy: "Cannot dictionary encode {}",
                other
            )),
        })
        .collect::<StrataResult<Vec<_>>>()?;
    let validity = if values.iter().any(Value::is_null) {
        values.iter().map(|v| !v.is_null()).collect()
    } else {
        Validity::NonNullable
    };
    Ok(PrimitiveArray::from_u64s(&ints, 64)?
        .with_validity(validity)?
        .into())
}

/// Split struct rows into one vector of values per field.
fn split_struct(values: &[Value], num_fields: usize) -> StrataResult<Vec<Vec<Value>>> {
    let mut fields = vec![Vec::with_capacity(values.len()); num_fields];
    for value in values {
        match value {
            Value::Struct(row) if row.len() == num_fields => {
                for (field, v) in fields.iter_mut().zip(row) {
                    field.push(v.clone());
                }
            }
            Value::Null => strata_bail!(EncodingPolicy: "Struct rows cannot be null"),
            other => strata_bail!(
                EncodingPolicy: "Expected a struct of {} fields, got {}",
                num_fields,
                other
            ),
        }
    }
    Ok(fields)
}
