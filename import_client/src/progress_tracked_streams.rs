use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use more_asserts::debug_assert_le;
use progress_tracking::UploadPercentReporter;

/// Serves an in-memory payload to the transport in blocks of at most `block_size` bytes and
/// reports upload progress as they are pulled.
///
/// A block counts as sent once the transport asks for the next one, so progress trails the
/// transport by one block; the last block is counted when the end of the stream is polled.
pub struct UploadProgressStream {
    payload: Bytes,
    block_size: usize,
    offset: usize,
    reporter: UploadPercentReporter,
}

impl UploadProgressStream {
    pub fn new(payload: impl Into<Bytes>, block_size: usize, reporter: UploadPercentReporter) -> Self {
        Self {
            payload: payload.into(),
            block_size: block_size.max(1),
            offset: 0,
            reporter,
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    fn remaining(&self) -> usize {
        self.payload.len() - self.offset
    }

    fn next_block(&mut self) -> Option<Bytes> {
        if self.remaining() == 0 {
            return None;
        }
        let end = self.offset + self.block_size.min(self.remaining());
        let block = self.payload.slice(self.offset..end);
        self.offset = end;
        Some(block)
    }
}

impl Stream for UploadProgressStream {
    type Item = std::result::Result<Bytes, std::io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        debug_assert_le!(this.offset, this.payload.len());

        if this.offset > 0 {
            this.reporter.report_bytes(this.offset as u64);
        }

        Poll::Ready(this.next_block().map(Ok))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let blocks = self.remaining().div_ceil(self.block_size);
        (blocks, Some(blocks))
    }
}
