use std::fmt::{Display, Formatter};

/// The scope a buffer index is resolved in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BufferLocation {
    /// Buffers private to a single page of a column.
    Page,
    /// Buffers shared by every page of a column, such as a dictionary.
    Column,
    /// Buffers shared by every column of a file.
    File,
}

impl Display for BufferLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferLocation::Page => write!(f, "page"),
            BufferLocation::Column => write!(f, "column"),
            BufferLocation::File => write!(f, "file"),
        }
    }
}

/// A reference to an addressable byte buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferRef {
    pub index: u32,
    pub location: BufferLocation,
}

impl BufferRef {
    pub fn new(index: u32, location: BufferLocation) -> Self {
        Self { index, location }
    }

    pub fn page(index: u32) -> Self {
        Self::new(index, BufferLocation::Page)
    }

    pub fn column(index: u32) -> Self {
        Self::new(index, BufferLocation::Column)
    }
}

impl Display for BufferRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.location, self.index)
    }
}
