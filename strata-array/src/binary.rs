use std::ops::Range;

use bytes::{Bytes, BytesMut};
use strata_error::{StrataResult, strata_bail, strata_err};

use crate::validity::Validity;
use crate::value::Value;

/// Variable-width byte values addressed by `len + 1` monotonically increasing offsets into a
/// shared byte heap. `offsets[0]` is always zero.
#[derive(Clone, Debug)]
pub struct BinaryArray {
    offsets: Vec<u64>,
    bytes: Bytes,
    validity: Validity,
}

impl BinaryArray {
    pub fn try_new(offsets: Vec<u64>, bytes: Bytes, validity: Validity) -> StrataResult<Self> {
        let Some(&last) = offsets.last() else {
            strata_bail!("Binary offsets must contain at least one entry")
        };
        if offsets[0] != 0 {
            strata_bail!(CorruptData: "Binary offsets must start at zero, got {}", offsets[0])
        }
        if offsets.windows(2).any(|w| w[0] > w[1]) {
            strata_bail!(CorruptData: "Binary offsets must be non-decreasing")
        }
        if last > bytes.len() as u64 {
            strata_bail!(
                CorruptData: "Binary offsets address {} bytes, heap holds {}",
                last,
                bytes.len()
            )
        }
        validity.check_len(offsets.len() - 1)?;
        Ok(Self {
            offsets,
            bytes,
            validity,
        })
    }

    /// Build an array from optional byte strings, `None` marking a null.
    pub fn from_iter_opt<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a [u8]>>,
    {
        let mut offsets = vec![0u64];
        let mut heap = BytesMut::new();
        let mut validity = Vec::new();
        for value in values {
            if let Some(v) = value {
                heap.extend_from_slice(v);
            }
            validity.push(value.is_some());
            offsets.push(heap.len() as u64);
        }
        let validity = if validity.iter().all(|v| *v) {
            Validity::NonNullable
        } else {
            Validity::from_iter(validity)
        };
        Self {
            offsets,
            bytes: heap.freeze(),
            validity,
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    pub fn with_validity(mut self, validity: Validity) -> StrataResult<Self> {
        validity.check_len(self.len())?;
        self.validity = validity;
        Ok(self)
    }

    fn byte_range(&self, index: usize) -> StrataResult<Range<usize>> {
        let start = usize::try_from(self.offsets[index])
            .map_err(|_| strata_err!("Binary offset overflows usize"))?;
        let end = usize::try_from(self.offsets[index + 1])
            .map_err(|_| strata_err!("Binary offset overflows usize"))?;
        Ok(start..end)
    }

    /// The raw bytes stored at `index`, regardless of validity.
    pub fn value_unchecked(&self, index: usize) -> StrataResult<&[u8]> {
        if index >= self.len() {
            strata_bail!(OutOfBounds: index, 0, self.len())
        }
        Ok(&self.bytes[self.byte_range(index)?])
    }

    pub fn value(&self, index: usize) -> StrataResult<Option<&[u8]>> {
        if self.validity.is_null(index) {
            return Ok(None);
        }
        self.value_unchecked(index).map(Some)
    }

    pub fn iter(&self) -> impl Iterator<Item = StrataResult<Option<&[u8]>>> + '_ {
        (0..self.len()).map(|i| self.value(i))
    }

    pub fn slice(&self, range: Range<usize>) -> StrataResult<Self> {
        if range.start > range.end || range.end > self.len() {
            strata_bail!(OutOfBounds: range.end, 0, self.len())
        }
        let base = self.offsets[range.start];
        let offsets = self.offsets[range.start..=range.end]
            .iter()
            .map(|o| o - base)
            .collect::<Vec<_>>();
        let heap_start = usize::try_from(base)
            .map_err(|_| strata_err!("Binary offset overflows usize"))?;
        let heap_end = usize::try_from(self.offsets[range.end])
            .map_err(|_| strata_err!("Binary offset overflows usize"))?;
        let bytes = self.bytes.slice(heap_start..heap_end);
        Self::try_new(offsets, bytes, self.validity.slice(range))
    }

    pub fn take(&self, indices: &[usize]) -> StrataResult<Self> {
        let mut offsets = Vec::with_capacity(indices.len() + 1);
        offsets.push(0u64);
        let mut heap = BytesMut::new();
        for &idx in indices {
            heap.extend_from_slice(self.value_unchecked(idx)?);
            offsets.push(heap.len() as u64);
        }
        Self::try_new(offsets, heap.freeze(), self.validity.take(indices))
    }

    pub fn to_values(&self) -> StrataResult<Vec<Value>> {
        (0..self.len())
            .map(|i| {
                Ok(match self.value(i)? {
                    None => Value::Null,
                    Some(_) => Value::Bytes(self.bytes.slice(self.byte_range(i)?)),
                })
            })
            .collect()
    }
}
