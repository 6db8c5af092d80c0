use std::ops::Range;

use bytes::Bytes;
use strata_error::{StrataResult, strata_bail, strata_err};

use crate::bitpacking::{pack, packed_len, unpack_one};
use crate::validity::Validity;
use crate::value::Value;

/// Fixed-width values packed LSB-first at `bits_per_value` bits each.
///
/// The first value starts `bit_offset` bits into `data`, which lets a decoder hand out the
/// exact byte span it fetched for a row range without re-aligning sub-byte values.
#[derive(Clone, Debug)]
pub struct PrimitiveArray {
    bits_per_value: u64,
    bit_offset: usize,
    len: usize,
    data: Bytes,
    validity: Validity,
}

impl PrimitiveArray {
    pub fn try_new(
        bits_per_value: u64,
        bit_offset: usize,
        len: usize,
        data: Bytes,
    ) -> StrataResult<Self> {
        if bits_per_value == 0 {
            strata_bail!("bits_per_value must be positive")
        }
        if bit_offset >= 8 {
            strata_bail!("bit offset {} must be smaller than a byte", bit_offset)
        }
        if bits_per_value > 64 && (bits_per_value % 8 != 0 || bit_offset != 0) {
            strata_bail!(
                "Values wider than 64 bits must be byte aligned, got {} bits at offset {}",
                bits_per_value,
                bit_offset
            )
        }
        let required = packed_len(len, bits_per_value, bit_offset)?;
        if (data.len() as u64) < required {
            strata_bail!(
                CorruptData: "{} values of {} bits need {} bytes, buffer holds {}",
                len,
                bits_per_value,
                required,
                data.len()
            )
        }
        Ok(Self {
            bits_per_value,
            bit_offset,
            len,
            data,
            validity: Validity::NonNullable,
        })
    }

    /// Pack integer values at the given width.
    pub fn from_u64s(values: &[u64], bits_per_value: u64) -> StrataResult<Self> {
        let data = pack(values.iter().copied(), bits_per_value)?;
        Self::try_new(bits_per_value, 0, values.len(), Bytes::from(data))
    }

    /// Concatenate fixed-width byte values, each exactly `byte_width` bytes long.
    pub fn from_fixed_width<'a, I>(values: I, byte_width: usize) -> StrataResult<Self>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut data = Vec::new();
        let mut len = 0;
        for value in values {
            if value.len() != byte_width {
                strata_bail!(
                    "Expected fixed-width value of {} bytes, got {}",
                    byte_width,
                    value.len()
                )
            }
            data.extend_from_slice(value);
            len += 1;
        }
        Self::try_new(byte_width as u64 * 8, 0, len, Bytes::from(data))
    }

    pub fn with_validity(mut self, validity: Validity) -> StrataResult<Self> {
        validity.check_len(self.len)?;
        self.validity = validity;
        Ok(self)
    }

    pub fn bits_per_value(&self) -> u64 {
        self.bits_per_value
    }

    pub fn bit_offset(&self) -> usize {
        self.bit_offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    /// Read the value at `index` as an integer. Only valid for widths up to 64 bits.
    pub fn value(&self, index: usize) -> StrataResult<u64> {
        if index >= self.len {
            strata_bail!(OutOfBounds: index, 0, self.len)
        }
        if self.bits_per_value > 64 {
            strata_bail!(
                "Cannot read a {}-bit value as an integer",
                self.bits_per_value
            )
        }
        Ok(unpack_one(
            &self.data,
            self.bit_offset,
            self.bits_per_value,
            index,
        ))
    }

    /// Read all values as integers, ignoring validity.
    pub fn u64_values(&self) -> StrataResult<Vec<u64>> {
        if self.bits_per_value > 64 {
            strata_bail!(
                "Cannot read {}-bit values as integers",
                self.bits_per_value
            )
        }
        Ok((0..self.len)
            .map(|i| unpack_one(&self.data, self.bit_offset, self.bits_per_value, i))
            .collect())
    }

    /// The raw bytes of the value at `index`. Only valid for byte-aligned widths.
    pub fn value_bytes(&self, index: usize) -> StrataResult<&[u8]> {
        if index >= self.len {
            strata_bail!(OutOfBounds: index, 0, self.len)
        }
        if self.bits_per_value % 8 != 0 || self.bit_offset != 0 {
            strata_bail!(
                "Cannot address {}-bit values as bytes",
                self.bits_per_value
            )
        }
        let width = usize::try_from(self.bits_per_value / 8)
            .map_err(|_| strata_err!("Value width overflows usize"))?;
        Ok(&self.data[index * width..(index + 1) * width])
    }

    pub fn slice(&self, range: Range<usize>) -> StrataResult<Self> {
        if range.start > range.end || range.end > self.len {
            strata_bail!(OutOfBounds: range.end, 0, self.len)
        }
        let start_bit = self.bit_offset as u64 + range.start as u64 * self.bits_per_value;
        let len = range.end - range.start;
        let byte_start = usize::try_from(start_bit / 8)
            .map_err(|_| strata_err!("Slice start overflows usize"))?;
        #[allow(clippy::cast_possible_truncation)]
        let bit_offset = (start_bit % 8) as usize;
        let byte_end = byte_start
            + usize::try_from(packed_len(len, self.bits_per_value, bit_offset)?)
                .map_err(|_| strata_err!("Slice end overflows usize"))?;
        Ok(Self {
            bits_per_value: self.bits_per_value,
            bit_offset,
            len,
            data: self.data.slice(byte_start..byte_end),
            validity: self.validity.slice(range),
        })
    }

    pub fn take(&self, indices: &[usize]) -> StrataResult<Self> {
        if let Some(&idx) = indices.iter().find(|&&i| i >= self.len) {
            strata_bail!(OutOfBounds: idx, 0, self.len)
        }
        let taken = if self.bits_per_value <= 64 {
            let values = indices
                .iter()
                .map(|&i| unpack_one(&self.data, self.bit_offset, self.bits_per_value, i));
            Self::try_new(
                self.bits_per_value,
                0,
                indices.len(),
                Bytes::from(pack(values, self.bits_per_value)?),
            )?
        } else {
            let width = usize::try_from(self.bits_per_value / 8)
                .map_err(|_| strata_err!("Value width overflows usize"))?;
            let values = indices
                .iter()
                .map(|&i| self.value_bytes(i))
                .collect::<StrataResult<Vec<_>>>()?;
            Self::from_fixed_width(values, width)?
        };
        taken.with_validity(self.validity.take(indices))
    }

    pub fn to_values(&self) -> StrataResult<Vec<Value>> {
        (0..self.len)
            .map(|i| {
                if self.validity.is_null(i) {
                    Ok(Value::Null)
                } else if self.bits_per_value <= 64 {
                    self.value(i).map(Value::UInt)
                } else {
                    self.value_bytes(i)
                        .map(|b| Value::Bytes(Bytes::copy_from_slice(b)))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::primitive::PrimitiveArray;
    use crate::validity::Validity;
    use crate::value::Value;

    #[test]
    fn slice_sub_byte() {
        let array = PrimitiveArray::from_u64s(&[1, 2, 3, 4, 5, 6, 7, 0, 1, 2], 3).unwrap();
        let sliced = array.slice(3..8).unwrap();
        assert_eq!(sliced.u64_values().unwrap(), vec![4, 5, 6, 7, 0]);
        assert_eq!(sliced.bit_offset(), 1);
        let again = sliced.slice(1..3).unwrap();
        assert_eq!(again.u64_values().unwrap(), vec![5, 6]);
    }

    #[test]
    fn take_with_validity() {
        let array = PrimitiveArray::from_u64s(&[10, 20, 30], 8)
            .unwrap()
            .with_validity(Validity::from_iter([true, false, true]))
            .unwrap();
        let taken = array.take(&[2, 1, 2]).unwrap();
        assert_eq!(
            taken.to_values().unwrap(),
            vec![Value::UInt(30), Value::Null, Value::UInt(30)]
        );
    }

    #[test]
    fn wide_values_are_bytes() {
        let array = PrimitiveArray::from_fixed_width(
            [&[1u8; 16][..], &[2u8; 16][..]],
            16,
        )
        .unwrap();
        assert_eq!(array.bits_per_value(), 128);
        assert_eq!(
            array.take(&[1]).unwrap().to_values().unwrap(),
            vec![Value::Bytes(Bytes::from(vec![2u8; 16]))]
        );
        assert!(array.value(0).is_err());
    }

    #[test]
    fn short_buffer_is_corrupt() {
        let err = PrimitiveArray::try_new(32, 0, 3, Bytes::from(vec![0u8; 11])).unwrap_err();
        assert!(err.is_corrupt_data());
    }
}
