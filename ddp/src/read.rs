//! Byte sources for the decoder. The decoder only ever asks for exactly as many bytes as the next field of a record
//! occupies, which lets it pull a single record off a live connection without buffering whatever follows it.

use crate::error::DecodeError;
use std::borrow::Cow;
use std::io;

/// Never reserve more than this ahead of the bytes actually received from a stream.
const CHUNK: usize = 64 * 1024;

/// A source of bytes which can hand out exactly `n` of them at a time.
pub trait Read<'de> {

    /// Reads exactly `n` bytes or fails with `DecodeError::Eof`. Slice sources lend their bytes, stream sources
    /// return owned ones.
    fn read(&mut self, n: usize) -> Result<Cow<'de, [u8]>, DecodeError>;

    fn read_byte(&mut self) -> Result<u8, DecodeError>;

    /// Discards exactly `n` bytes.
    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.read(n).map(|_| ())
    }

    /// The number of bytes consumed so far.
    fn position(&self) -> usize;

}

/// Reads from an in-memory buffer.
pub struct SliceRead<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SliceRead<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The unconsumed tail of the buffer.
    pub fn remainder(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}

impl<'a> Read<'a> for SliceRead<'a> {

    fn read(&mut self, n: usize) -> Result<Cow<'a, [u8]>, DecodeError> {
        if self.buf[self.pos..].len() < n {
            Err(DecodeError::Eof)
        } else {
            self.pos += n;
            Ok(Cow::Borrowed(&self.buf[self.pos - n .. self.pos]))
        }
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        match self.buf.get(self.pos) {
            Some(b) => {
                self.pos += 1;
                Ok(*b)
            },
            None => Err(DecodeError::Eof),
        }
    }

    fn position(&self) -> usize {
        self.pos
    }

}

/// Reads from anything implementing `std::io::Read`, for instance a `TcpStream`. Every field is fetched with its own
/// exact-size read, so wrapping an unbuffered socket in a `BufReader` is advisable if the reader may keep it.
pub struct IoRead<R> {
    reader: R,
    pos: usize,
}

impl<R: io::Read> IoRead<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, pos: 0 }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: io::Read> Read<'static> for IoRead<R> {

    fn read(&mut self, n: usize) -> Result<Cow<'static, [u8]>, DecodeError> {
        let mut buf = Vec::with_capacity(n.min(CHUNK));
        let c = io::Read::read_to_end(&mut io::Read::take(&mut self.reader, n as u64), &mut buf)?;
        self.pos += c;
        if c < n {
            Err(DecodeError::Eof)
        } else {
            Ok(Cow::Owned(buf))
        }
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let mut buf = [0u8; 1];
        io::Read::read_exact(&mut self.reader, &mut buf)?;
        self.pos += 1;
        Ok(buf[0])
    }

    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        let c = io::copy(&mut io::Read::take(&mut self.reader, n as u64), &mut io::sink())?;
        self.pos += c as usize;
        if (c as usize) < n {
            Err(DecodeError::Eof)
        } else {
            Ok(())
        }
    }

    fn position(&self) -> usize {
        self.pos
    }

}
