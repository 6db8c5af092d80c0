//! LSB-first bit packing of fixed-width values.
//!
//! Value `i` of a buffer packed at `bits` bits per value occupies bits
//! `[i * bits, (i + 1) * bits)`, where bit `b` is bit `b % 8` of byte `b / 8`.

use std::ops::Range;

use strata_error::{StrataResult, strata_bail, strata_err};

/// The byte span covering rows `rows` of a buffer packed at `bits_per_value`, together with the
/// offset in bits of the first row inside the first byte of that span.
pub fn byte_span(rows: &Range<u64>, bits_per_value: u64) -> StrataResult<(Range<u64>, usize)> {
    let (Some(start_bit), Some(end_bit)) = (
        rows.start.checked_mul(bits_per_value),
        rows.end.checked_mul(bits_per_value),
    ) else {
        strata_bail!(
            CorruptData: "Rows {:?} of {} bits overflow a u64 bit position",
            rows,
            bits_per_value
        )
    };
    let start = start_bit / 8;
    let end = end_bit.div_ceil(8).max(start);
    #[allow(clippy::cast_possible_truncation)]
    Ok((start..end, (start_bit % 8) as usize))
}

/// Number of bytes needed to hold `len` values of `bits_per_value` bits starting `bit_offset`
/// bits into the first byte.
pub fn packed_len(len: usize, bits_per_value: u64, bit_offset: usize) -> StrataResult<u64> {
    (len as u64)
        .checked_mul(bits_per_value)
        .and_then(|bits| bits.checked_add(bit_offset as u64))
        .map(|bits| bits.div_ceil(8))
        .ok_or_else(|| {
            strata_err!(
                CorruptData: "{} values of {} bits overflow a u64 bit position",
                len,
                bits_per_value
            )
        })
}

/// Read the value at `index`. `bits` must be in `1..=64` and the value must lie within `data`,
/// which [`packed_len`] guarantees for every index below the checked length.
#[inline]
pub fn unpack_one(data: &[u8], bit_offset: usize, bits: u64, index: usize) -> u64 {
    let start_bit = bit_offset as u64 + index as u64 * bits;
    #[allow(clippy::cast_possible_truncation)]
    let first = (start_bit / 8) as usize;
    let shift = start_bit % 8;
    #[allow(clippy::cast_possible_truncation)]
    let nbytes = (shift + bits).div_ceil(8) as usize;

    let mut window: u128 = 0;
    for (i, byte) in data[first..first + nbytes].iter().enumerate() {
        window |= (*byte as u128) << (8 * i);
    }
    let mask: u128 = (1u128 << bits) - 1;
    #[allow(clippy::cast_possible_truncation)]
    let value = ((window >> shift) & mask) as u64;
    value
}

/// Pack `values` at `bits` bits per value. Every value must fit in `bits` bits.
pub fn pack<I>(values: I, bits: u64) -> StrataResult<Vec<u8>>
where
    I: IntoIterator<Item = u64>,
{
    if bits == 0 || bits > 64 {
        strata_bail!("Cannot pack integers at {} bits per value", bits)
    }
    let mask: u128 = (1u128 << bits) - 1;

    let mut out = Vec::new();
    let mut acc: u128 = 0;
    let mut nacc: u64 = 0;
    for value in values {
        if (value as u128) > mask {
            strata_bail!("Value {} does not fit in {} bits", value, bits)
        }
        acc |= (value as u128) << nacc;
        nacc += bits;
        while nacc >= 8 {
            #[allow(clippy::cast_possible_truncation)]
            out.push((acc & 0xff) as u8);
            acc >>= 8;
            nacc -= 8;
        }
    }
    if nacc > 0 {
        #[allow(clippy::cast_possible_truncation)]
        out.push((acc & 0xff) as u8);
    }
    Ok(out)
}

/// The minimum number of bits needed to represent `value`, at least one.
pub fn bit_width(value: u64) -> u64 {
    (64 - value.leading_zeros() as u64).max(1)
}
