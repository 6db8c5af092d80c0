use std::collections::HashMap;
use std::ops::Range;

use bytes::Bytes;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use strata_error::{StrataExpect, strata_err};

use crate::buffer::{BufferLocation, BufferRef};
use crate::store::{BufferAllocator, BufferFuture, BufferStore};

/// A request observed by [`InMemoryBuffers`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferRequest {
    pub buffer: BufferRef,
    pub range: Option<Range<u64>>,
}

/// An in-memory buffer store and allocator that records every request it serves.
#[derive(Default)]
pub struct InMemoryBuffers {
    buffers: RwLock<HashMap<BufferLocation, Vec<Bytes>>>,
    requests: Mutex<Vec<BufferRequest>>,
}

impl InMemoryBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// The requests served so far, in the order they were made.
    pub fn requests(&self) -> Vec<BufferRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    /// Total number of buffers held across all locations.
    pub fn buffer_count(&self) -> usize {
        self.buffers.read().values().map(Vec::len).sum()
    }

    pub fn get(&self, buffer: BufferRef) -> Option<Bytes> {
        self.buffers
            .read()
            .get(&buffer.location)
            .and_then(|b| b.get(buffer.index as usize))
            .cloned()
    }
}

impl BufferStore for InMemoryBuffers {
    fn request(&self, buffer: BufferRef, range: Option<Range<u64>>) -> BufferFuture {
        log::trace!("Requesting buffer {} range {:?}", buffer, range);
        self.requests.lock().push(BufferRequest {
            buffer,
            range: range.clone(),
        });
        let data = self.get(buffer);
        async move {
            let data = data.ok_or_else(|| strata_err!(NotFound: "Buffer {} not found", buffer))?;
            let Some(range) = range else {
                return Ok(data);
            };
            if range.start > range.end || range.end > data.len() as u64 {
                return Err(strata_err!(
                    CorruptData: "Requested bytes {:?} of buffer {} holding {} bytes",
                    range,
                    buffer,
                    data.len()
                ));
            }
            let start = usize::try_from(range.start)
                .map_err(|_| strata_err!("Byte offset overflows usize"))?;
            let end = usize::try_from(range.end)
                .map_err(|_| strata_err!("Byte offset overflows usize"))?;
            Ok(data.slice(start..end))
        }
        .boxed()
    }
}

impl BufferAllocator for InMemoryBuffers {
    fn put(&mut self, location: BufferLocation, data: Bytes) -> BufferRef {
        let mut buffers = self.buffers.write();
        let slots = buffers.entry(location).or_default();
        let index = u32::try_from(slots.len())
            .ok()
            .strata_expect("Cannot store more than u32::MAX buffers");
        slots.push(data);
        BufferRef::new(index, location)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::executor::block_on;

    use crate::buffer::{BufferLocation, BufferRef};
    use crate::store::{BufferAllocator, BufferStore, InMemoryBuffers};

    #[test]
    fn indices_are_per_location() {
        let mut buffers = InMemoryBuffers::new();
        let a = buffers.put(BufferLocation::Page, Bytes::from_static(b"abc"));
        let b = buffers.put(BufferLocation::Column, Bytes::from_static(b"xyz"));
        let c = buffers.put(BufferLocation::Page, Bytes::from_static(b"def"));
        assert_eq!(a, BufferRef::page(0));
        assert_eq!(b, BufferRef::column(0));
        assert_eq!(c, BufferRef::page(1));
        assert_eq!(block_on(buffers.request(c, Some(1..3))).unwrap().as_ref(), b"ef");
        assert_eq!(buffers.request_count(), 1);
    }

    #[test]
    fn unknown_buffer_is_not_found() {
        let buffers = InMemoryBuffers::new();
        let err = block_on(buffers.request(BufferRef::page(3), None)).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn range_past_end_is_corrupt() {
        let mut buffers = InMemoryBuffers::new();
        let a = buffers.put(BufferLocation::File, Bytes::from_static(b"abc"));
        let err = block_on(buffers.request(a, Some(2..5))).unwrap_err();
        assert!(err.is_corrupt_data());
    }
}
