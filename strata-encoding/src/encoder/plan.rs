use crate::compression::ZstdCompression;

/// The widths and compression the encoder should use, mirroring the shape of the tree it builds.
///
/// Nullability is not part of the plan: it is derived from the values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodingPlan {
    Flat {
        bits_per_value: u64,
        compression: Option<String>,
    },
    FixedSizeList {
        dimension: u32,
        items: Box<EncodingPlan>,
    },
    List {
        offsets: Box<EncodingPlan>,
        items: Box<EncodingPlan>,
        /// Defaults to one more than the number of items.
        null_offset_adjustment: Option<u64>,
    },
    Binary {
        indices: Box<EncodingPlan>,
        bytes: Box<EncodingPlan>,
        /// Defaults to one more than the number of heap bytes.
        null_adjustment: Option<u64>,
    },
    Dictionary {
        indices: Box<EncodingPlan>,
        items: Box<EncodingPlan>,
    },
    Fsst {
        binary: Box<EncodingPlan>,
    },
    Struct {
        fields: Vec<EncodingPlan>,
    },
}

impl EncodingPlan {
    pub fn flat(bits_per_value: u64) -> Self {
        EncodingPlan::Flat {
            bits_per_value,
            compression: None,
        }
    }

    pub fn zstd(bits_per_value: u64) -> Self {
        EncodingPlan::Flat {
            bits_per_value,
            compression: Some(ZstdCompression::NAME.to_string()),
        }
    }

    /// Variable-width values with 64-bit offsets into a plain byte heap.
    pub fn binary() -> Self {
        EncodingPlan::Binary {
            indices: Box::new(Self::flat(64)),
            bytes: Box::new(Self::flat(8)),
            null_adjustment: None,
        }
    }

    pub fn list(items: EncodingPlan) -> Self {
        EncodingPlan::List {
            offsets: Box::new(Self::flat(64)),
            items: Box::new(items),
            null_offset_adjustment: None,
        }
    }

    pub fn fixed_size_list(dimension: u32, items: EncodingPlan) -> Self {
        EncodingPlan::FixedSizeList {
            dimension,
            items: Box::new(items),
        }
    }

    pub fn dictionary(index_bits: u64, items: EncodingPlan) -> Self {
        EncodingPlan::Dictionary {
            indices: Box::new(Self::flat(index_bits)),
            items: Box::new(items),
        }
    }

    pub fn fsst() -> Self {
        EncodingPlan::Fsst {
            binary: Box::new(Self::binary()),
        }
    }

    pub fn structure(fields: Vec<EncodingPlan>) -> Self {
        EncodingPlan::Struct { fields }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EncodingPlan::Flat { .. } => "flat",
            EncodingPlan::FixedSizeList { .. } => "fixed_size_list",
            EncodingPlan::List { .. } => "list",
            EncodingPlan::Binary { .. } => "binary",
            EncodingPlan::Dictionary { .. } => "dictionary",
            EncodingPlan::Fsst { .. } => "fsst",
            EncodingPlan::Struct { .. } => "struct",
        }
    }

    /// Whether values encoded with this plan are a leaf column without child columns.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, EncodingPlan::List { .. } | EncodingPlan::Struct { .. })
    }
}
