//! Array validity and nullability behavior, used by every decoded array.

use std::ops::{BitAnd, Range};

use arrow_buffer::{BooleanBuffer, BooleanBufferBuilder};
use strata_error::{StrataResult, strata_bail};

/// Validity information for an array
#[derive(Clone, Debug, Default)]
pub enum Validity {
    /// Items *can't* be null
    #[default]
    NonNullable,
    /// All items are valid
    AllValid,
    /// All items are null
    AllInvalid,
    /// Item `i` is valid iff bit `i` is set
    Bitmap(BooleanBuffer),
}

impl Validity {
    pub fn null_count(&self, length: usize) -> StrataResult<usize> {
        match self {
            Self::NonNullable | Self::AllValid => Ok(0),
            Self::AllInvalid => Ok(length),
            Self::Bitmap(b) => {
                if b.len() != length {
                    strata_bail!(
                        "Validity bitmap length {} doesn't match array length {}",
                        b.len(),
                        length
                    )
                }
                Ok(length - b.count_set_bits())
            }
        }
    }

    /// Returns whether the `index` item is valid.
    #[inline]
    pub fn is_valid(&self, index: usize) -> bool {
        match self {
            Self::NonNullable | Self::AllValid => true,
            Self::AllInvalid => false,
            Self::Bitmap(b) => b.value(index),
        }
    }

    #[inline]
    pub fn is_null(&self, index: usize) -> bool {
        !self.is_valid(index)
    }

    pub fn is_nullable(&self) -> bool {
        !matches!(self, Self::NonNullable)
    }

    /// Check that a bitmap validity covers exactly `length` items.
    pub fn check_len(&self, length: usize) -> StrataResult<()> {
        if let Self::Bitmap(b) = self {
            if b.len() != length {
                strata_bail!(
                    "Validity bitmap length {} doesn't match array length {}",
                    b.len(),
                    length
                )
            }
        }
        Ok(())
    }

    pub fn slice(&self, range: Range<usize>) -> Self {
        match self {
            Self::Bitmap(b) => Self::Bitmap(b.slice(range.start, range.end - range.start)),
            _ => self.clone(),
        }
    }

    pub fn take(&self, indices: &[usize]) -> Self {
        match self {
            Self::Bitmap(b) => Self::Bitmap(indices.iter().map(|&i| b.value(i)).collect()),
            _ => self.clone(),
        }
    }

    /// Materialize the validity as a bitmap of the given length.
    pub fn to_bitmap(&self, length: usize) -> BooleanBuffer {
        match self {
            Self::NonNullable | Self::AllValid => BooleanBuffer::new_set(length),
            Self::AllInvalid => BooleanBuffer::new_unset(length),
            Self::Bitmap(b) => b.clone(),
        }
    }

    /// Logically & two Validity values of the same length
    pub fn and(self, rhs: Validity) -> Validity {
        match (self, rhs) {
            (Validity::NonNullable, Validity::NonNullable) => Validity::NonNullable,
            // Any `AllInvalid` makes the output all invalid values
            (Validity::AllInvalid, _) | (_, Validity::AllInvalid) => Validity::AllInvalid,
            (Validity::Bitmap(a), Validity::AllValid)
            | (Validity::Bitmap(a), Validity::NonNullable)
            | (Validity::NonNullable, Validity::Bitmap(a))
            | (Validity::AllValid, Validity::Bitmap(a)) => Validity::Bitmap(a),
            (Validity::NonNullable, Validity::AllValid)
            | (Validity::AllValid, Validity::NonNullable)
            | (Validity::AllValid, Validity::AllValid) => Validity::AllValid,
            (Validity::Bitmap(lhs), Validity::Bitmap(rhs)) => Validity::from(lhs.bitand(&rhs)),
        }
    }

    /// Concatenate validities of consecutive arrays with the given lengths.
    pub fn concat<'a>(parts: impl IntoIterator<Item = (&'a Validity, usize)>) -> Validity {
        let parts = parts.into_iter().collect::<Vec<_>>();
        if parts.iter().all(|(v, _)| matches!(v, Validity::NonNullable)) {
            return Validity::NonNullable;
        }
        if parts
            .iter()
            .all(|(v, _)| matches!(v, Validity::NonNullable | Validity::AllValid))
        {
            return Validity::AllValid;
        }
        let total = parts.iter().map(|(_, len)| *len).sum();
        let mut builder = BooleanBufferBuilder::new(total);
        for (validity, len) in parts {
            match validity {
                Validity::NonNullable | Validity::AllValid => builder.append_n(len, true),
                Validity::AllInvalid => builder.append_n(len, false),
                Validity::Bitmap(b) => builder.append_buffer(b),
            }
        }
        Validity::from(builder.finish())
    }
}

impl PartialEq for Validity {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NonNullable, Self::NonNullable) => true,
            (Self::AllValid, Self::AllValid) => true,
            (Self::AllInvalid, Self::AllInvalid) => true,
            (Self::Bitmap(a), Self::Bitmap(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Validity {}

impl From<BooleanBuffer> for Validity {
    fn from(value: BooleanBuffer) -> Self {
        if value.count_set_bits() == value.len() {
            Self::AllValid
        } else if value.count_set_bits() == 0 {
            Self::AllInvalid
        } else {
            Self::Bitmap(value)
        }
    }
}

impl FromIterator<bool> for Validity {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Validity::from(BooleanBuffer::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use arrow_buffer::BooleanBuffer;
    use rstest::rstest;

    use crate::validity::Validity;

    #[rstest]
    #[case(Validity::AllValid, Validity::NonNullable, Validity::AllValid)]
    #[case(Validity::AllInvalid, Validity::AllValid, Validity::AllInvalid)]
    #[case(
        Validity::from(BooleanBuffer::from(vec![true, false, true])),
        Validity::from(BooleanBuffer::from(vec![false, true, true])),
        Validity::from(BooleanBuffer::from(vec![false, false, true]))
    )]
    fn and(#[case] lhs: Validity, #[case] rhs: Validity, #[case] expected: Validity) {
        assert_eq!(lhs.and(rhs), expected);
    }

    #[test]
    fn bitmaps_normalize() {
        assert_eq!(Validity::from_iter([true, true]), Validity::AllValid);
        assert_eq!(Validity::from_iter([false, false]), Validity::AllInvalid);
    }

    #[test]
    fn concat_mixes_variants() {
        let bits = Validity::from_iter([true, false]);
        let concat = Validity::concat([(&Validity::AllValid, 1), (&bits, 2), (&Validity::AllInvalid, 1)]);
        assert_eq!(concat, Validity::from_iter([true, true, false, false]));
        assert_eq!(concat.null_count(4).unwrap(), 2);
    }
}
