use std::sync::Arc;

use bytes::Bytes;
use prost::Message;
use strata_error::{StrataError, StrataResult, strata_err};
use strata_proto::encodings as pb;
use strata_proto::encodings::array_encoding::ArrayEncoding as PbArrayEncoding;
use strata_proto::encodings::buffer::BufferType;
use strata_proto::encodings::column_encoding::ColumnEncoding as PbColumnEncoding;
use strata_proto::encodings::nullable::Nullability;

use crate::buffer::{BufferLocation, BufferRef};
use crate::node::{
    ArrayEncoding, Binary, ColumnEncoding, Dictionary, EncodingRef, FixedSizeList, Flat, Fsst,
    List, Nullable, ZoneIndex,
};

impl From<BufferLocation> for BufferType {
    fn from(value: BufferLocation) -> Self {
        match value {
            BufferLocation::Page => BufferType::Page,
            BufferLocation::Column => BufferType::Column,
            BufferLocation::File => BufferType::File,
        }
    }
}

impl From<BufferType> for BufferLocation {
    fn from(value: BufferType) -> Self {
        match value {
            BufferType::Page => BufferLocation::Page,
            BufferType::Column => BufferLocation::Column,
            BufferType::File => BufferLocation::File,
        }
    }
}

impl From<&BufferRef> for pb::Buffer {
    fn from(value: &BufferRef) -> Self {
        pb::Buffer {
            buffer_index: value.index,
            buffer_type: BufferType::from(value.location) as i32,
        }
    }
}

impl TryFrom<&pb::Buffer> for BufferRef {
    type Error = StrataError;

    fn try_from(value: &pb::Buffer) -> Result<Self, Self::Error> {
        let buffer_type = BufferType::try_from(value.buffer_type).map_err(|_| {
            strata_err!(UnsupportedEncoding: "Unknown buffer type {}", value.buffer_type)
        })?;
        Ok(BufferRef::new(value.buffer_index, buffer_type.into()))
    }
}

fn buffer(field: Option<&pb::Buffer>, name: &str) -> StrataResult<BufferRef> {
    field
        .ok_or_else(|| strata_err!(InvalidSerde: "Missing buffer {}", name))?
        .try_into()
}

fn child(field: Option<&pb::ArrayEncoding>, name: &str) -> StrataResult<EncodingRef> {
    let field = field.ok_or_else(|| strata_err!(InvalidSerde: "Missing child encoding {}", name))?;
    Ok(Arc::new(ArrayEncoding::try_from(field)?))
}

fn boxed(node: &EncodingRef) -> Option<Box<pb::ArrayEncoding>> {
    Some(Box::new(pb::ArrayEncoding::from(node.as_ref())))
}

impl TryFrom<&pb::ArrayEncoding> for ArrayEncoding {
    type Error = StrataError;

    fn try_from(value: &pb::ArrayEncoding) -> Result<Self, Self::Error> {
        let encoding = value
            .array_encoding
            .as_ref()
            .ok_or_else(|| strata_err!(UnsupportedEncoding: "Unknown array encoding"))?;
        Ok(match encoding {
            PbArrayEncoding::Flat(flat) => ArrayEncoding::Flat(Flat {
                bits_per_value: flat.bits_per_value,
                buffer: buffer(flat.buffer.as_ref(), "flat.buffer")?,
                compression: flat.compression.as_ref().map(|c| c.scheme.clone()),
            }),
            PbArrayEncoding::Nullable(nullable) => ArrayEncoding::Nullable(
                match nullable
                    .nullability
                    .as_ref()
                    .ok_or_else(|| strata_err!(UnsupportedEncoding: "Unknown nullability"))?
                {
                    Nullability::NoNulls(no_null) => Nullable::NoNull {
                        values: child(no_null.values.as_deref(), "no_nulls.values")?,
                    },
                    Nullability::SomeNulls(some_null) => Nullable::SomeNull {
                        validity: child(some_null.validity.as_deref(), "some_nulls.validity")?,
                        values: child(some_null.values.as_deref(), "some_nulls.values")?,
                    },
                    Nullability::AllNulls(_) => Nullable::AllNull,
                },
            ),
            PbArrayEncoding::FixedSizeList(fsl) => ArrayEncoding::FixedSizeList(FixedSizeList {
                dimension: fsl.dimension,
                items: child(fsl.items.as_deref(), "fixed_size_list.items")?,
            }),
            PbArrayEncoding::List(list) => ArrayEncoding::List(List {
                offsets: child(list.offsets.as_deref(), "list.offsets")?,
                null_offset_adjustment: list.null_offset_adjustment,
                num_items: list.num_items,
            }),
            PbArrayEncoding::Struct(_) => ArrayEncoding::Struct,
            PbArrayEncoding::Binary(binary) => ArrayEncoding::Binary(Binary {
                indices: child(binary.indices.as_deref(), "binary.indices")?,
                bytes: child(binary.bytes.as_deref(), "binary.bytes")?,
                null_adjustment: binary.null_adjustment,
            }),
            PbArrayEncoding::Dictionary(dict) => ArrayEncoding::Dictionary(Dictionary {
                indices: child(dict.indices.as_deref(), "dictionary.indices")?,
                items: child(dict.items.as_deref(), "dictionary.items")?,
                num_dictionary_items: dict.num_dictionary_items,
            }),
            PbArrayEncoding::Fsst(fsst) => ArrayEncoding::Fsst(Fsst {
                binary: child(fsst.binary.as_deref(), "fsst.binary")?,
                symbol_table: Bytes::copy_from_slice(&fsst.symbol_table),
            }),
        })
    }
}

impl From<&ArrayEncoding> for pb::ArrayEncoding {
    fn from(value: &ArrayEncoding) -> Self {
        let encoding = match value {
            ArrayEncoding::Flat(flat) => PbArrayEncoding::Flat(pb::Flat {
                bits_per_value: flat.bits_per_value,
                buffer: Some((&flat.buffer).into()),
                compression: flat.compression.as_ref().map(|scheme| pb::Compression {
                    scheme: scheme.clone(),
                }),
            }),
            ArrayEncoding::Nullable(nullable) => {
                let nullability = match nullable {
                    Nullable::NoNull { values } => {
                        Nullability::NoNulls(Box::new(pb::nullable::NoNull {
                            values: boxed(values),
                        }))
                    }
                    Nullable::SomeNull { validity, values } => {
                        Nullability::SomeNulls(Box::new(pb::nullable::SomeNull {
                            validity: boxed(validity),
                            values: boxed(values),
                        }))
                    }
                    Nullable::AllNull => Nullability::AllNulls(pb::nullable::AllNull {}),
                };
                PbArrayEncoding::Nullable(Box::new(pb::Nullable {
                    nullability: Some(nullability),
                }))
            }
            ArrayEncoding::FixedSizeList(fsl) => {
                PbArrayEncoding::FixedSizeList(Box::new(pb::FixedSizeList {
                    dimension: fsl.dimension,
                    items: boxed(&fsl.items),
                }))
            }
            ArrayEncoding::List(list) => PbArrayEncoding::List(Box::new(pb::List {
                offsets: boxed(&list.offsets),
                null_offset_adjustment: list.null_offset_adjustment,
                num_items: list.num_items,
            })),
            ArrayEncoding::Struct => PbArrayEncoding::Struct(pb::SimpleStruct {}),
            ArrayEncoding::Binary(binary) => PbArrayEncoding::Binary(Box::new(pb::Binary {
                indices: boxed(&binary.indices),
                bytes: boxed(&binary.bytes),
                null_adjustment: binary.null_adjustment,
            })),
            ArrayEncoding::Dictionary(dict) => {
                PbArrayEncoding::Dictionary(Box::new(pb::Dictionary {
                    indices: boxed(&dict.indices),
                    items: boxed(&dict.items),
                    num_dictionary_items: dict.num_dictionary_items,
                }))
            }
            ArrayEncoding::Fsst(fsst) => PbArrayEncoding::Fsst(Box::new(pb::Fsst {
                binary: boxed(&fsst.binary),
                symbol_table: fsst.symbol_table.to_vec(),
            })),
        };
        pb::ArrayEncoding {
            array_encoding: Some(encoding),
        }
    }
}

impl TryFrom<&pb::ColumnEncoding> for ColumnEncoding {
    type Error = StrataError;

    fn try_from(value: &pb::ColumnEncoding) -> Result<Self, Self::Error> {
        match value
            .column_encoding
            .as_ref()
            .ok_or_else(|| strata_err!(UnsupportedEncoding: "Unknown column encoding"))?
        {
            PbColumnEncoding::Values(values) => {
                Ok(ColumnEncoding::Values(Arc::new(ArrayEncoding::try_from(values)?)))
            }
            PbColumnEncoding::ZoneIndex(zoned) => {
                let inner = zoned
                    .inner
                    .as_deref()
                    .ok_or_else(|| strata_err!(InvalidSerde: "Missing zone index inner column"))?;
                Ok(ColumnEncoding::ZoneIndex(ZoneIndex {
                    rows_per_zone: zoned.rows_per_zone,
                    zone_map_buffer: buffer(zoned.zone_map_buffer.as_ref(), "zone_map_buffer")?,
                    inner: Arc::new(ColumnEncoding::try_from(inner)?),
                }))
            }
        }
    }
}

impl From<&ColumnEncoding> for pb::ColumnEncoding {
    fn from(value: &ColumnEncoding) -> Self {
        let encoding = match value {
            ColumnEncoding::Values(values) => {
                PbColumnEncoding::Values(pb::ArrayEncoding::from(values.as_ref()))
            }
            ColumnEncoding::ZoneIndex(zoned) => {
                PbColumnEncoding::ZoneIndex(Box::new(pb::ZoneIndex {
                    rows_per_zone: zoned.rows_per_zone,
                    zone_map_buffer: Some((&zoned.zone_map_buffer).into()),
                    inner: Some(Box::new(pb::ColumnEncoding::from(zoned.inner.as_ref()))),
                }))
            }
        };
        pb::ColumnEncoding {
            column_encoding: Some(encoding),
        }
    }
}

impl ArrayEncoding {
    /// Serialize the tree as an `ArrayEncoding` protobuf message.
    pub fn to_bytes(&self) -> Vec<u8> {
        pb::ArrayEncoding::from(self).encode_to_vec()
    }

    /// Deserialize and validate a tree serialized with [`ArrayEncoding::to_bytes`].
    pub fn try_from_bytes(bytes: &[u8]) -> StrataResult<Self> {
        let encoding = ArrayEncoding::try_from(&pb::ArrayEncoding::decode(bytes)?)?;
        encoding.validate()?;
        Ok(encoding)
    }
}

impl ColumnEncoding {
    /// Serialize the root as a `ColumnEncoding` protobuf message.
    pub fn to_bytes(&self) -> Vec<u8> {
        pb::ColumnEncoding::from(self).encode_to_vec()
    }

    /// Deserialize and validate a root serialized with [`ColumnEncoding::to_bytes`].
    pub fn try_from_bytes(bytes: &[u8]) -> StrataResult<Self> {
        let encoding = ColumnEncoding::try_from(&pb::ColumnEncoding::decode(bytes)?)?;
        encoding.validate()?;
        Ok(encoding)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use prost::Message;
    use strata_proto::encodings as pb;

    use crate::buffer::{BufferLocation, BufferRef};
    use crate::node::{
        ArrayEncoding, ColumnEncoding, Dictionary, Flat, Fsst, List, Nullable, ZoneIndex,
    };

    #[test]
    fn flat_wire_bytes() {
        let flat = ArrayEncoding::Flat(Flat::new(1, BufferRef::page(0)));
        // field 1 (flat) { field 1 (bits_per_value) = 1, field 2 (buffer) = {} }
        assert_eq!(flat.to_bytes(), vec![0x0a, 0x04, 0x08, 0x01, 0x12, 0x00]);
    }

    #[test]
    fn buffer_type_numbers() {
        let buffer = pb::Buffer::from(&BufferRef::new(3, BufferLocation::Column));
        assert_eq!(buffer.encode_to_vec(), vec![0x08, 0x03, 0x10, 0x01]);
        let buffer = pb::Buffer::from(&BufferRef::new(0, BufferLocation::File));
        assert_eq!(buffer.buffer_type, 2);
    }

    #[test]
    fn nested_tree_survives_serialization() {
        let flat = |bits, index| Arc::new(ArrayEncoding::Flat(Flat::new(bits, BufferRef::page(index))));
        let dict = Arc::new(ArrayEncoding::Dictionary(Dictionary {
            indices: flat(3, 2),
            items: Arc::new(ArrayEncoding::Fsst(Fsst {
                binary: flat(8, 3),
                symbol_table: Bytes::from_static(&[0]),
            })),
            num_dictionary_items: 5,
        }));
        let column = ColumnEncoding::ZoneIndex(ZoneIndex {
            rows_per_zone: 128,
            zone_map_buffer: BufferRef::column(0),
            inner: Arc::new(ColumnEncoding::Values(Arc::new(ArrayEncoding::Nullable(
                Nullable::SomeNull {
                    validity: flat(1, 0),
                    values: Arc::new(ArrayEncoding::List(List {
                        offsets: Arc::new(ArrayEncoding::Flat(
                            Flat::new(16, BufferRef::page(1)).with_compression("zstd"),
                        )),
                        null_offset_adjustment: 11,
                        num_items: 10,
                    })),
                },
            )))),
        });
        assert_eq!(ColumnEncoding::try_from_bytes(&column.to_bytes()).unwrap(), column);
        assert_eq!(
            ArrayEncoding::try_from_bytes(&dict.to_bytes()).unwrap(),
            dict.as_ref().clone()
        );
    }

    #[test]
    fn unknown_variant_is_unsupported() {
        // field 9 is not a known array encoding
        let err = ArrayEncoding::try_from_bytes(&[0x4a, 0x00]).unwrap_err();
        assert!(err.is_unsupported_encoding());
    }

    #[test]
    fn unknown_buffer_type_is_unsupported() {
        let encoding = pb::ArrayEncoding {
            array_encoding: Some(pb::array_encoding::ArrayEncoding::Flat(pb::Flat {
                bits_per_value: 8,
                buffer: Some(pb::Buffer {
                    buffer_index: 0,
                    buffer_type: 7,
                }),
                compression: None,
            })),
        };
        let err = ArrayEncoding::try_from_bytes(&encoding.encode_to_vec()).unwrap_err();
        assert!(err.is_unsupported_encoding());
    }
}
