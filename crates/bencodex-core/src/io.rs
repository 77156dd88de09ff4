//! Sequential byte sources and sinks used by the codec.
//!
//! [`Reader`] is a cursor over input that can report its position and step
//! back, which the decoder needs for one-byte lookahead. [`Writer`] is an
//! append-only sink. Both come in an in-memory flavour and one wrapping a
//! `std::io` stream.

use std::io::{self, Read, Seek, SeekFrom, Write};

use bytes::Bytes;

use crate::error::Result;

/// A byte source with a movable cursor.
pub trait Reader {
    /// Reads up to `size` bytes; fewer at end of input, none for `size == 0`.
    fn read(&mut self, size: usize) -> Result<Bytes>;

    /// Current offset from the start of the input.
    fn tell(&self) -> u64;

    /// Moves the cursor by `delta` bytes, clamped to `[0, length]`.
    fn seek(&mut self, delta: i64) -> Result<()>;

    /// Reads a single byte, or `None` at end of input.
    fn read_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.read(1)?.first().copied())
    }
}

/// An append-only byte sink.
pub trait Writer {
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<R: Reader + ?Sized> Reader for &mut R {
    fn read(&mut self, size: usize) -> Result<Bytes> {
        (**self).read(size)
    }

    fn tell(&self) -> u64 {
        (**self).tell()
    }

    fn seek(&mut self, delta: i64) -> Result<()> {
        (**self).seek(delta)
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }
}

impl<W: Writer + ?Sized> Writer for &mut W {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }
}

fn clamp_offset(current: u64, delta: i64, len: u64) -> u64 {
    let target = i128::from(current) + i128::from(delta);
    target.clamp(0, i128::from(len)) as u64
}

/// Reads from an in-memory buffer without copying.
#[derive(Debug, Clone)]
pub struct MemoryReader {
    buffer: Bytes,
    offset: usize,
}

impl MemoryReader {
    pub fn new(buffer: impl Into<Bytes>) -> Self {
        MemoryReader {
            buffer: buffer.into(),
            offset: 0,
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &[u8] {
        &self.buffer[self.offset..]
    }
}

impl Reader for MemoryReader {
    fn read(&mut self, size: usize) -> Result<Bytes> {
        let end = self.offset.saturating_add(size).min(self.buffer.len());
        let read = self.buffer.slice(self.offset..end);
        self.offset = end;
        Ok(read)
    }

    fn tell(&self) -> u64 {
        self.offset as u64
    }

    fn seek(&mut self, delta: i64) -> Result<()> {
        self.offset =
            clamp_offset(self.offset as u64, delta, self.buffer.len() as u64) as usize;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.buffer.get(self.offset).copied();
        if byte.is_some() {
            self.offset += 1;
        }
        Ok(byte)
    }
}

/// Collects written bytes in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    buffer: Vec<u8>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

impl Writer for MemoryWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }
}

/// Reads from a seekable `std::io` stream.
///
/// The decoder pulls input one byte at a time, so unbuffered handles such as
/// `File` should be wrapped in a `BufReader` first. Stepping back over the
/// byte just read is served from memory; other seeks go to the stream.
#[derive(Debug)]
pub struct StreamReader<R> {
    inner: R,
    position: u64,
    last: Option<u8>,
    unread: Option<u8>,
}

impl<R: Read + Seek> StreamReader<R> {
    pub fn new(mut inner: R) -> io::Result<Self> {
        let position = inner.stream_position()?;
        Ok(StreamReader {
            inner,
            position,
            last: None,
            unread: None,
        })
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Returns the stream, positioned at the logical read offset.
    pub fn into_inner(mut self) -> io::Result<R> {
        if self.unread.is_some() {
            self.inner.seek(SeekFrom::Current(-1))?;
        }
        Ok(self.inner)
    }
}

impl<R: Read + Seek> Reader for StreamReader<R> {
    fn read(&mut self, size: usize) -> Result<Bytes> {
        if size == 0 {
            return Ok(Bytes::new());
        }
        let mut buf = Vec::new();
        if let Some(byte) = self.unread.take() {
            buf.push(byte);
        }
        // take() grows the buffer with the bytes actually present, so a bogus
        // length prefix cannot force a huge allocation.
        let wanted = (size - buf.len()) as u64;
        (&mut self.inner).take(wanted).read_to_end(&mut buf)?;
        self.position += buf.len() as u64;
        self.last = buf.last().copied();
        Ok(Bytes::from(buf))
    }

    fn tell(&self) -> u64 {
        self.position
    }

    fn seek(&mut self, delta: i64) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        if delta == -1 && self.unread.is_none() {
            if let Some(byte) = self.last.take() {
                self.unread = Some(byte);
                self.position -= 1;
                return Ok(());
            }
        }
        let len = self.inner.seek(SeekFrom::End(0))?;
        let target = clamp_offset(self.position, delta, len);
        self.position = self.inner.seek(SeekFrom::Start(target))?;
        self.last = None;
        self.unread = None;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        if let Some(byte) = self.unread.take() {
            self.position += 1;
            self.last = Some(byte);
            return Ok(Some(byte));
        }
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => {
                    self.last = None;
                    return Ok(None);
                }
                Ok(_) => {
                    self.position += 1;
                    self.last = Some(byte[0]);
                    return Ok(Some(byte[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Writes to a `std::io` stream.
#[derive(Debug)]
pub struct StreamWriter<W> {
    inner: W,
}

impl<W: Write> StreamWriter<W> {
    pub fn new(inner: W) -> Self {
        StreamWriter { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Writer for StreamWriter<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if !bytes.is_empty() {
            self.inner.write_all(bytes)?;
        }
        Ok(())
    }
}
