//! The offset scheme shared by lists and binary values.
//!
//! `N` rows store `N` offsets, without a leading zero. With `base(i)` the end of the previous
//! row (`offsets[i - 1] mod adjustment`, or zero for the first row), a valid row of length `len`
//! stores `base(i) + len` and a null row stores `base(i) + adjustment`. A row is therefore null
//! iff its offset is at least the adjustment, and the items of rows `[s, e)` are found from just
//! `offsets[s - 1]` and `offsets[e - 1]`.

use std::ops::Range;

use strata_array::Validity;
use strata_error::{StrataResult, strata_bail, strata_err};

/// Rows decoded by [`OffsetCodec::decode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedOffsets {
    /// `len + 1` offsets relative to the start of `items`.
    pub offsets: Vec<u64>,
    pub validity: Validity,
    /// The absolute span of items addressed by the rows.
    pub items: Range<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffsetCodec {
    adjustment: u64,
}

impl OffsetCodec {
    pub fn try_new(adjustment: u64) -> StrataResult<Self> {
        if adjustment == 0 {
            strata_bail!(CorruptData: "Null offset adjustment must be positive")
        }
        Ok(Self { adjustment })
    }

    /// The codec for rows addressing `num_items` items in total.
    pub fn for_items(num_items: u64) -> StrataResult<Self> {
        match num_items.checked_add(1) {
            Some(adjustment) => Self::try_new(adjustment),
            None => strata_bail!(EncodingPolicy: "Too many items to encode offsets for"),
        }
    }

    pub fn adjustment(&self) -> u64 {
        self.adjustment
    }

    #[inline]
    pub fn is_null(&self, raw: u64) -> bool {
        raw >= self.adjustment
    }

    /// The end of a row's items, regardless of nullness.
    #[inline]
    pub fn end(&self, raw: u64) -> u64 {
        raw % self.adjustment
    }

    /// Encode row lengths, `None` marking a null row.
    pub fn encode<I>(&self, lengths: I) -> StrataResult<Vec<u64>>
    where
        I: IntoIterator<Item = Option<u64>>,
    {
        let mut base = 0u64;
        lengths
            .into_iter()
            .map(|len| match len {
                Some(len) => {
                    base = match base.checked_add(len) {
                        Some(end) if end < self.adjustment => end,
                        _ => strata_bail!(
                            EncodingPolicy: "List end offset exceeds null adjustment {}",
                            self.adjustment
                        ),
                    };
                    Ok(base)
                }
                None => base.checked_add(self.adjustment).ok_or_else(|| {
                    strata_err!(EncodingPolicy: "Null offset overflows u64")
                }),
            })
            .collect()
    }

    /// The absolute span of items addressed by a row range, given the raw offset of the row
    /// before the range (`None` when the range starts at row zero) and the raw offset of the last
    /// row of the range (`None` when the range is empty).
    pub fn span(&self, before: Option<u64>, last: Option<u64>) -> StrataResult<Range<u64>> {
        let start = before.map(|raw| self.end(raw)).unwrap_or(0);
        let end = last.map(|raw| self.end(raw)).unwrap_or(start);
        if end < start {
            strata_bail!(
                CorruptData: "Offsets decrease from {} to {}",
                start,
                end
            )
        }
        Ok(start..end)
    }

    /// Decode the raw offsets of a row range, given the raw offset of the row before it.
    pub fn decode(&self, before: Option<u64>, raw: &[u64]) -> StrataResult<DecodedOffsets> {
        let base = before.map(|raw| self.end(raw)).unwrap_or(0);
        let mut offsets = Vec::with_capacity(raw.len() + 1);
        offsets.push(0);
        let mut prev = base;
        for &value in raw {
            if value / self.adjustment > 1 {
                strata_bail!(
                    CorruptData: "Offset {} exceeds twice the null adjustment {}",
                    value,
                    self.adjustment
                )
            }
            let end = self.end(value);
            if end < prev {
                strata_bail!(CorruptData: "Offsets decrease from {} to {}", prev, end)
            }
            offsets.push(end - base);
            prev = end;
        }
        let validity = if raw.iter().any(|&v| self.is_null(v)) {
            raw.iter().map(|&v| !self.is_null(v)).collect()
        } else {
            Validity::NonNullable
        };
        Ok(DecodedOffsets {
            offsets,
            validity,
            items: base..prev,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strata_array::Validity;

    use crate::offsets::OffsetCodec;

    // [[A, B], null, [], [C, D, E]]
    const LENGTHS: [Option<u64>; 4] = [Some(2), None, Some(0), Some(3)];

    #[test]
    fn encodes_example() {
        let codec = OffsetCodec::try_new(7).unwrap();
        let offsets = codec.encode(LENGTHS).unwrap();
        assert_eq!(offsets, vec![2, 9, 2, 5]);
        assert_eq!(
            offsets.iter().map(|&o| codec.is_null(o)).collect::<Vec<_>>(),
            vec![false, true, false, false]
        );
    }

    #[test]
    fn middle_rows_need_two_offsets() {
        let codec = OffsetCodec::try_new(7).unwrap();
        // rows [1, 3) read only offsets[0] = 2 and offsets[2] = 2
        assert_eq!(codec.span(Some(2), Some(2)).unwrap(), 2..2);
        let decoded = codec.decode(Some(2), &[9, 2]).unwrap();
        assert_eq!(decoded.offsets, vec![0, 0, 0]);
        assert_eq!(decoded.items, 2..2);
        assert_eq!(decoded.validity, Validity::from_iter([false, true]));
    }

    #[rstest]
    #[case(0, 4)]
    #[case(0, 1)]
    #[case(1, 4)]
    #[case(3, 4)]
    #[case(2, 2)]
    fn decode_matches_lengths(#[case] start: usize, #[case] end: usize) {
        let codec = OffsetCodec::try_new(7).unwrap();
        let raw = codec.encode(LENGTHS).unwrap();
        let before = start.checked_sub(1).map(|i| raw[i]);
        let decoded = codec.decode(before, &raw[start..end]).unwrap();
        for (i, len) in LENGTHS[start..end].iter().enumerate() {
            assert_eq!(decoded.validity.is_valid(i), len.is_some());
            assert_eq!(
                decoded.offsets[i + 1] - decoded.offsets[i],
                len.unwrap_or(0)
            );
        }
        let last = end.checked_sub(1).filter(|_| end > start).map(|i| raw[i]);
        assert_eq!(codec.span(before, last).unwrap(), decoded.items);
    }

    #[test]
    fn lengths_reaching_adjustment_are_rejected() {
        let codec = OffsetCodec::try_new(4).unwrap();
        let err = codec.encode([Some(2), Some(2)]).unwrap_err();
        assert!(err.is_encoding_policy());
    }

    #[test]
    fn decreasing_offsets_are_corrupt() {
        let codec = OffsetCodec::try_new(10).unwrap();
        assert!(codec.decode(Some(5), &[3]).unwrap_err().is_corrupt_data());
        assert!(codec.decode(None, &[25]).unwrap_err().is_corrupt_data());
    }
}
