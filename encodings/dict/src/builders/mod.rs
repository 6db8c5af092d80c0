use binary::BytesDictBuilder;
use primitive::PrimitiveDictBuilder;
use strata_array::bitpacking::bit_width;
use strata_array::{Array, PrimitiveArray};
use strata_error::{StrataResult, strata_bail};

use crate::DictArray;

mod binary;
mod primitive;

/// Assigns codes to the distinct values of the arrays it is fed, in first-seen order.
pub trait DictEncoder {
    /// Encode `array`, returning one code per row. Null rows receive code zero.
    fn encode(&mut self, array: &Array) -> StrataResult<Vec<u64>>;

    /// The distinct values seen so far, indexed by code.
    fn values(&mut self) -> StrataResult<Array>;
}

/// Dictionary encode a primitive or binary array.
///
/// Codes are packed at the narrowest width that addresses every distinct value and carry the
/// input's validity; the dictionary values themselves are never null.
pub fn dict_encode(array: &Array) -> StrataResult<DictArray> {
    let dict_builder: &mut dyn DictEncoder = match array {
        Array::Primitive(p) if p.bits_per_value() <= 64 => {
            &mut PrimitiveDictBuilder::new(p.bits_per_value())
        }
        Array::Primitive(p) => &mut BytesDictBuilder::fixed_width(p.bits_per_value()),
        Array::Binary(_) => &mut BytesDictBuilder::variable_width(),
        _ => strata_bail!("Can only dictionary encode primitive or binary arrays"),
    };
    let codes = dict_builder.encode(array)?;
    let values = dict_builder.values()?;
    let width = bit_width(values.len().saturating_sub(1) as u64);
    let codes = PrimitiveArray::from_u64s(&codes, width)?.with_validity(array.validity())?;
    DictArray::try_new(codes, values)
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use strata_array::{Array, BinaryArray, PrimitiveArray, Validity, Value};

    use crate::dict_encode;

    #[rstest]
    #[case(&[1, 1, 3, 3, 3], 1)]
    #[case(&[7, 6, 5, 4, 3, 2, 1, 0], 3)]
    #[case(&[42], 1)]
    fn encode_primitive(#[case] values: &[u64], #[case] code_width: u64) {
        let array: Array = PrimitiveArray::from_u64s(values, 8).unwrap().into();
        let dict = dict_encode(&array).unwrap();
        assert_eq!(dict.codes().bits_per_value(), code_width);
        assert_eq!(
            dict.canonicalize().unwrap().to_values().unwrap(),
            array.to_values().unwrap()
        );
    }

    #[test]
    fn encode_nullable_binary() {
        let array: Array = BinaryArray::from_iter_opt([
            Some(&b"hello"[..]),
            None,
            Some(&b"world"[..]),
            Some(&b"hello"[..]),
            None,
        ])
        .into();
        let dict = dict_encode(&array).unwrap();
        assert_eq!(dict.values().len(), 2);
        assert_eq!(dict.codes().u64_values().unwrap(), vec![0, 0, 1, 0, 0]);
        assert_eq!(
            dict.codes().validity(),
            &Validity::from_iter([true, false, true, true, false])
        );
        assert_eq!(
            dict.canonicalize().unwrap().to_values().unwrap(),
            vec![
                Value::from("hello"),
                Value::Null,
                Value::from("world"),
                Value::from("hello"),
                Value::Null
            ]
        );
    }

    #[test]
    fn encode_wide_primitive() {
        let array: Array =
            PrimitiveArray::from_fixed_width([&[9u8; 16][..], &[1u8; 16][..], &[9u8; 16][..]], 16)
                .unwrap()
                .into();
        let dict = dict_encode(&array).unwrap();
        assert_eq!(dict.values().len(), 2);
        assert_eq!(
            dict.canonicalize().unwrap().to_values().unwrap(),
            array.to_values().unwrap()
        );
    }

    #[test]
    fn rejects_lists() {
        let array: Array = strata_array::NullArray::new(2).into();
        assert!(dict_encode(&array).is_err());
    }
}
