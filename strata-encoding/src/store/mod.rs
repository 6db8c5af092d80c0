//! Resolving buffer references to bytes, and allocating references for new buffers.

use std::ops::Range;

use bytes::Bytes;
use futures::future::BoxFuture;
pub use memory::*;
use strata_error::StrataResult;

use crate::buffer::{BufferLocation, BufferRef};

mod memory;

/// Static future resolving to the bytes of a buffer.
pub type BufferFuture = BoxFuture<'static, StrataResult<Bytes>>;

/// A trait for providing buffer data to a [`crate::Decoder`].
///
/// The request is the only suspension point of a decode. Implementations must return
/// [`strata_error::StrataError::NotFound`] for references they cannot resolve.
pub trait BufferStore: 'static + Send + Sync {
    /// Request the bytes of `buffer`, or only the byte `range` of it, returning a future that
    /// will eventually resolve to the data.
    fn request(&self, buffer: BufferRef, range: Option<Range<u64>>) -> BufferFuture;
}

/// Places buffers produced by the encoder and hands out references to them.
pub trait BufferAllocator {
    fn put(&mut self, location: BufferLocation, data: Bytes) -> BufferRef;
}
