use std::ops::Range;

use strata_error::{StrataResult, strata_bail, strata_err};

use crate::array::Array;
use crate::validity::Validity;
use crate::value::Value;

/// Variable-length lists described by `len + 1` offsets into an items array.
///
/// A list column's items live in a separate column, so a freshly decoded [`ListArray`] only
/// knows the absolute span of items its rows address (`item_range`). The items are attached
/// with [`ListArray::with_items`] once the caller has decoded that span of the items column.
#[derive(Clone, Debug)]
pub struct ListArray {
    offsets: Vec<u64>,
    validity: Validity,
    item_range: Range<u64>,
    items: Option<Box<Array>>,
}

impl ListArray {
    pub fn try_new(
        offsets: Vec<u64>,
        validity: Validity,
        item_range: Range<u64>,
    ) -> StrataResult<Self> {
        let Some(&last) = offsets.last() else {
            strata_bail!("List offsets must contain at least one entry")
        };
        if offsets[0] != 0 {
            strata_bail!(CorruptData: "List offsets must start at zero, got {}", offsets[0])
        }
        if offsets.windows(2).any(|w| w[0] > w[1]) {
            strata_bail!(CorruptData: "List offsets must be non-decreasing")
        }
        if item_range.start > item_range.end || last != item_range.end - item_range.start {
            strata_bail!(
                CorruptData: "List offsets address {} items but the item range is {:?}",
                last,
                item_range
            )
        }
        validity.check_len(offsets.len() - 1)?;
        Ok(Self {
            offsets,
            validity,
            item_range,
            items: None,
        })
    }

    /// Attach the decoded items covering [`ListArray::item_range`].
    pub fn with_items(mut self, items: Array) -> StrataResult<Self> {
        let expected = self.item_range.end - self.item_range.start;
        if items.len() as u64 != expected {
            strata_bail!(
                CorruptData: "List addresses {} items, items column produced {}",
                expected,
                items.len()
            )
        }
        self.items = Some(Box::new(items));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offsets relative to the first item of [`ListArray::item_range`].
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    /// The absolute span of the items column addressed by these lists.
    pub fn item_range(&self) -> &Range<u64> {
        &self.item_range
    }

    pub fn items(&self) -> Option<&Array> {
        self.items.as_deref()
    }

    pub fn list_len(&self, index: usize) -> u64 {
        self.offsets[index + 1] - self.offsets[index]
    }

    fn items_or_err(&self) -> StrataResult<&Array> {
        self.items
            .as_deref()
            .ok_or_else(|| strata_err!("List items have not been decoded"))
    }

    pub fn take(&self, indices: &[usize]) -> StrataResult<Self> {
        let items = self.items_or_err()?;
        let mut offsets = Vec::with_capacity(indices.len() + 1);
        offsets.push(0u64);
        let mut item_indices = Vec::new();
        for &idx in indices {
            if idx >= self.len() {
                strata_bail!(OutOfBounds: idx, 0, self.len())
            }
            for item in self.offsets[idx]..self.offsets[idx + 1] {
                item_indices.push(
                    usize::try_from(item).map_err(|_| strata_err!("Item index overflows usize"))?,
                );
            }
            offsets.push(item_indices.len() as u64);
        }
        let taken = items.take(&item_indices)?;
        Self::try_new(
            offsets,
            self.validity.take(indices),
            0..item_indices.len() as u64,
        )?
        .with_items(taken)
    }

    pub fn to_values(&self) -> StrataResult<Vec<Value>> {
        let items = self.items_or_err()?.to_values()?;
        (0..self.len())
            .map(|i| {
                if self.validity.is_null(i) {
                    return Ok(Value::Null);
                }
                let start = usize::try_from(self.offsets[i])
                    .map_err(|_| strata_err!("Item offset overflows usize"))?;
                let end = usize::try_from(self.offsets[i + 1])
                    .map_err(|_| strata_err!("Item offset overflows usize"))?;
                Ok(Value::List(items[start..end].to_vec()))
            })
            .collect()
    }
}

/// Lists of exactly `dimension` items each; row `i` owns items `[i * dimension, (i + 1) * dimension)`.
#[derive(Clone, Debug)]
pub struct FixedSizeListArray {
    dimension: u32,
    len: usize,
    items: Box<Array>,
    validity: Validity,
}

impl FixedSizeListArray {
    pub fn try_new(dimension: u32, items: Array) -> StrataResult<Self> {
        if dimension == 0 {
            strata_bail!("Fixed size list dimension must be positive")
        }
        let dim = dimension as usize;
        if items.len() % dim != 0 {
            strata_bail!(
                CorruptData: "{} items cannot be grouped into lists of {}",
                items.len(),
                dimension
            )
        }
        Ok(Self {
            dimension,
            len: items.len() / dim,
            items: Box::new(items),
            validity: Validity::NonNullable,
        })
    }

    pub fn with_validity(mut self, validity: Validity) -> StrataResult<Self> {
        validity.check_len(self.len)?;
        self.validity = validity;
        Ok(self)
    }

    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn items(&self) -> &Array {
        &self.items
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    pub fn take(&self, indices: &[usize]) -> StrataResult<Self> {
        let dim = self.dimension as usize;
        if let Some(&idx) = indices.iter().find(|&&i| i >= self.len) {
            strata_bail!(OutOfBounds: idx, 0, self.len)
        }
        let item_indices = indices
            .iter()
            .flat_map(|&i| i * dim..(i + 1) * dim)
            .collect::<Vec<_>>();
        Self::try_new(self.dimension, self.items.take(&item_indices)?)?
            .with_validity(self.validity.take(indices))
    }

    pub fn to_values(&self) -> StrataResult<Vec<Value>> {
        let dim = self.dimension as usize;
        let items = self.items.to_values()?;
        Ok(items
            .chunks(dim)
            .enumerate()
            .map(|(i, chunk)| {
                if self.validity.is_null(i) {
                    Value::Null
                } else {
                    Value::List(chunk.to_vec())
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::array::Array;
    use crate::list::{FixedSizeListArray, ListArray};
    use crate::primitive::PrimitiveArray;
    use crate::validity::Validity;
    use crate::value::Value;

    fn items(values: &[u64]) -> Array {
        Array::Primitive(PrimitiveArray::from_u64s(values, 8).unwrap())
    }

    #[test]
    fn list_values_with_nulls() {
        let list = ListArray::try_new(
            vec![0, 2, 2, 2, 5],
            Validity::from_iter([true, false, true, true]),
            10..15,
        )
        .unwrap()
        .with_items(items(&[1, 2, 3, 4, 5]))
        .unwrap();
        assert_eq!(
            list.to_values().unwrap(),
            vec![
                Value::List(vec![Value::UInt(1), Value::UInt(2)]),
                Value::Null,
                Value::List(vec![]),
                Value::List(vec![Value::UInt(3), Value::UInt(4), Value::UInt(5)]),
            ]
        );
    }

    #[test]
    fn items_must_cover_range() {
        let list = ListArray::try_new(vec![0, 3], Validity::NonNullable, 4..7).unwrap();
        assert!(list.with_items(items(&[1, 2])).is_err());
    }

    #[test]
    fn fixed_size_take() {
        let fsl = FixedSizeListArray::try_new(2, items(&[1, 2, 3, 4, 5, 6])).unwrap();
        assert_eq!(fsl.len(), 3);
        let taken = fsl.take(&[2, 0]).unwrap();
        assert_eq!(
            taken.to_values().unwrap(),
            vec![
                Value::List(vec![Value::UInt(5), Value::UInt(6)]),
                Value::List(vec![Value::UInt(1), Value::UInt(2)]),
            ]
        );
    }
}
