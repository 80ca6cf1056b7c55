//! Fixed-size chunking between the network callback and the destination file.
//!
//! libcurl delivers the body in pieces of whatever size the socket produced.
//! `ChunkSink` regroups them into `capacity`-sized chunks: each full chunk is
//! written in one call, and the remainder is written by `finish`.

use std::io::{self, Write};

/// Whether the producer should keep feeding the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// Hooks the sink calls at chunk boundaries.
pub(crate) trait ChunkEvents {
    /// Called before the first byte of a new chunk is buffered.
    fn before_chunk(&mut self) -> Flow;

    /// Called after a chunk of `len` bytes was written; `position` is the
    /// total number of bytes written so far.
    fn after_write(&mut self, len: usize, position: u64) -> Flow;
}

pub(crate) struct ChunkSink<W> {
    writer: W,
    buf: Vec<u8>,
    capacity: usize,
    position: u64,
    writes: u64,
}

impl<W: Write> ChunkSink<W> {
    /// `capacity` must be positive; the buffer is allocated once here.
    pub(crate) fn new(writer: W, capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            writer,
            buf: Vec::with_capacity(capacity),
            capacity,
            position: 0,
            writes: 0,
        }
    }

    /// Bytes written to the underlying writer so far.
    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    /// Buffer `data`, writing every chunk that fills up.
    pub(crate) fn push(
        &mut self,
        mut data: &[u8],
        events: &mut impl ChunkEvents,
    ) -> io::Result<Flow> {
        while !data.is_empty() {
            if self.buf.is_empty() && events.before_chunk() == Flow::Stop {
                return Ok(Flow::Stop);
            }
            let take = (self.capacity - self.buf.len()).min(data.len());
            self.buf.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.buf.len() == self.capacity && self.write_buffered(events)? == Flow::Stop {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    /// Write the final partial chunk. A zero-byte remainder is skipped unless
    /// nothing has been written at all, so an empty body still reports once.
    pub(crate) fn finish(&mut self, events: &mut impl ChunkEvents) -> io::Result<Flow> {
        if self.buf.is_empty() && self.writes > 0 {
            return Ok(Flow::Continue);
        }
        self.write_buffered(events)
    }

    pub(crate) fn into_inner(self) -> W {
        self.writer
    }

    fn write_buffered(&mut self, events: &mut impl ChunkEvents) -> io::Result<Flow> {
        self.writer.write_all(&self.buf)?;
        let len = self.buf.len();
        self.position += len as u64;
        self.writes += 1;
        self.buf.clear();
        Ok(events.after_write(len, self.position))
    }
}
