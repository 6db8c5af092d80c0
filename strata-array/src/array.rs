use std::ops::Range;

use strata_error::{StrataResult, strata_bail};

use crate::binary::BinaryArray;
use crate::list::{FixedSizeListArray, ListArray};
use crate::primitive::PrimitiveArray;
use crate::validity::Validity;
use crate::value::Value;

/// An array whose every item is null. Produced without touching any buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NullArray {
    len: usize,
}

impl NullArray {
    pub fn new(len: usize) -> Self {
        Self { len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Equal-length child arrays, one per field. Struct rows are never null themselves.
#[derive(Clone, Debug)]
pub struct StructArray {
    len: usize,
    fields: Vec<Array>,
}

impl StructArray {
    pub fn try_new(len: usize, fields: Vec<Array>) -> StrataResult<Self> {
        if let Some((idx, field)) = fields.iter().enumerate().find(|(_, f)| f.len() != len) {
            strata_bail!(
                CorruptData: "Struct field {} has {} rows, expected {}",
                idx,
                field.len(),
                len
            )
        }
        Ok(Self { len, fields })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn fields(&self) -> &[Array] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Array> {
        self.fields.get(index)
    }
}

/// A decoded span of rows of one column.
#[derive(Clone, Debug)]
pub enum Array {
    Null(NullArray),
    Primitive(PrimitiveArray),
    Binary(BinaryArray),
    List(ListArray),
    FixedSizeList(FixedSizeListArray),
    Struct(StructArray),
}

impl Array {
    pub fn len(&self) -> usize {
        match self {
            Array::Null(a) => a.len(),
            Array::Primitive(a) => a.len(),
            Array::Binary(a) => a.len(),
            Array::List(a) => a.len(),
            Array::FixedSizeList(a) => a.len(),
            Array::Struct(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validity(&self) -> Validity {
        match self {
            Array::Null(_) => Validity::AllInvalid,
            Array::Primitive(a) => a.validity().clone(),
            Array::Binary(a) => a.validity().clone(),
            Array::List(a) => a.validity().clone(),
            Array::FixedSizeList(a) => a.validity().clone(),
            Array::Struct(_) => Validity::NonNullable,
        }
    }

    pub fn is_valid(&self, index: usize) -> bool {
        match self {
            Array::Null(_) => false,
            Array::Primitive(a) => a.validity().is_valid(index),
            Array::Binary(a) => a.validity().is_valid(index),
            Array::List(a) => a.validity().is_valid(index),
            Array::FixedSizeList(a) => a.validity().is_valid(index),
            Array::Struct(_) => true,
        }
    }

    /// Combine `validity` with the array's existing validity.
    pub fn with_validity(self, validity: Validity) -> StrataResult<Self> {
        validity.check_len(self.len())?;
        Ok(match self {
            Array::Null(a) => Array::Null(a),
            Array::Primitive(a) => {
                let combined = a.validity().clone().and(validity);
                Array::Primitive(a.with_validity(combined)?)
            }
            Array::Binary(a) => {
                let combined = a.validity().clone().and(validity);
                Array::Binary(a.with_validity(combined)?)
            }
            Array::List(a) => {
                let combined = a.validity().clone().and(validity);
                let items = a.items().cloned();
                let list = ListArray::try_new(a.offsets().to_vec(), combined, a.item_range().clone())?;
                Array::List(match items {
                    Some(items) => list.with_items(items)?,
                    None => list,
                })
            }
            Array::FixedSizeList(a) => {
                let combined = a.validity().clone().and(validity);
                Array::FixedSizeList(a.with_validity(combined)?)
            }
            Array::Struct(_) => strata_bail!("Struct arrays are never nullable"),
        })
    }

    pub fn slice(&self, range: Range<usize>) -> StrataResult<Self> {
        if range.start > range.end || range.end > self.len() {
            strata_bail!(OutOfBounds: range.end, 0, self.len())
        }
        Ok(match self {
            Array::Null(_) => Array::Null(NullArray::new(range.end - range.start)),
            Array::Primitive(a) => Array::Primitive(a.slice(range)?),
            Array::Binary(a) => Array::Binary(a.slice(range)?),
            _ => self.take(&range.collect::<Vec<_>>())?,
        })
    }

    pub fn take(&self, indices: &[usize]) -> StrataResult<Self> {
        Ok(match self {
            Array::Null(a) => {
                if let Some(&idx) = indices.iter().find(|&&i| i >= a.len()) {
                    strata_bail!(OutOfBounds: idx, 0, a.len())
                }
                Array::Null(NullArray::new(indices.len()))
            }
            Array::Primitive(a) => Array::Primitive(a.take(indices)?),
            Array::Binary(a) => Array::Binary(a.take(indices)?),
            Array::List(a) => Array::List(a.take(indices)?),
            Array::FixedSizeList(a) => Array::FixedSizeList(a.take(indices)?),
            Array::Struct(a) => {
                if let Some(&idx) = indices.iter().find(|&&i| i >= a.len()) {
                    strata_bail!(OutOfBounds: idx, 0, a.len())
                }
                Array::Struct(StructArray::try_new(
                    indices.len(),
                    a.fields()
                        .iter()
                        .map(|f| f.take(indices))
                        .collect::<StrataResult<Vec<_>>>()?,
                )?)
            }
        })
    }

    /// Materialize every row as a logical [`Value`].
    pub fn to_values(&self) -> StrataResult<Vec<Value>> {
        match self {
            Array::Null(a) => Ok(vec![Value::Null; a.len()]),
            Array::Primitive(a) => a.to_values(),
            Array::Binary(a) => a.to_values(),
            Array::List(a) => a.to_values(),
            Array::FixedSizeList(a) => a.to_values(),
            Array::Struct(a) => {
                let mut fields = a
                    .fields()
                    .iter()
                    .map(|f| f.to_values().map(Vec::into_iter))
                    .collect::<StrataResult<Vec<_>>>()?;
                Ok((0..a.len())
                    .map(|_| {
                        Value::Struct(
                            fields
                                .iter_mut()
                                .map(|f| f.next().unwrap_or(Value::Null))
                                .collect(),
                        )
                    })
                    .collect())
            }
        }
    }
}

impl From<NullArray> for Array {
    fn from(value: NullArray) -> Self {
        Array::Null(value)
    }
}

impl From<PrimitiveArray> for Array {
    fn from(value: PrimitiveArray) -> Self {
        Array::Primitive(value)
    }
}

impl From<BinaryArray> for Array {
    fn from(value: BinaryArray) -> Self {
        Array::Binary(value)
    }
}

impl From<ListArray> for Array {
    fn from(value: ListArray) -> Self {
        Array::List(value)
    }
}

impl From<FixedSizeListArray> for Array {
    fn from(value: FixedSizeListArray) -> Self {
        Array::FixedSizeList(value)
    }
}

impl From<StructArray> for Array {
    fn from(value: StructArray) -> Self {
        Array::Struct(value)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::array::{Array, NullArray, StructArray};
    use crate::binary::BinaryArray;
    use crate::primitive::PrimitiveArray;
    use crate::validity::Validity;
    use crate::value::Value;

    fn people() -> Array {
        let ids = PrimitiveArray::from_u64s(&[1, 2, 3], 16).unwrap();
        let names = BinaryArray::from_iter_opt([Some(&b"ada"[..]), None, Some(&b"bo"[..])]);
        Array::Struct(StructArray::try_new(3, vec![ids.into(), names.into()]).unwrap())
    }

    #[test]
    fn struct_values_zip_fields() {
        assert_eq!(
            people().to_values().unwrap(),
            vec![
                Value::Struct(vec![Value::UInt(1), Value::from("ada")]),
                Value::Struct(vec![Value::UInt(2), Value::Null]),
                Value::Struct(vec![Value::UInt(3), Value::from("bo")]),
            ]
        );
    }

    #[rstest]
    #[case(0..3)]
    #[case(1..2)]
    #[case(3..3)]
    fn slice_matches_values(#[case] range: std::ops::Range<usize>) {
        let array = people();
        let expected = array.to_values().unwrap()[range.clone()].to_vec();
        assert_eq!(array.slice(range).unwrap().to_values().unwrap(), expected);
    }

    #[test]
    fn with_validity_intersects() {
        let array: Array = PrimitiveArray::from_u64s(&[7, 8, 9], 4)
            .unwrap()
            .with_validity(Validity::from_iter([true, true, false]))
            .unwrap()
            .into();
        let masked = array
            .with_validity(Validity::from_iter([false, true, true]))
            .unwrap();
        assert_eq!(
            masked.to_values().unwrap(),
            vec![Value::Null, Value::UInt(8), Value::Null]
        );
    }

    #[test]
    fn mismatched_struct_fields() {
        let err = StructArray::try_new(2, vec![NullArray::new(3).into()]).unwrap_err();
        assert!(err.is_corrupt_data());
    }
}
