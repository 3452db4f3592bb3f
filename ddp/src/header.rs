//! A DDP record starts with up to two structural bytes. The optional version byte has its leading bit cleared and
//! carries the protocol version in the remaining seven bits. The mandatory header byte has its leading bit set,
//! followed by a four bit type tag and a three bit count `sz`. The next `sz` bytes contain the length of the payload
//! as an unsigned integer in network byte order, after which the payload itself follows.
//!
//! ```text
//! (0VVV VVVV)? (1TTT TSSS) <sz bytes length> <length bytes payload>
//! ```
//!
//! A zero `sz` means that neither length nor payload are present. Every type assigns such an empty record a fixed
//! value, see [Tag::sentinel](crate::Tag::sentinel).

use crate::error::{DecodeError, EncodeError};
use crate::read::Read;
use crate::varint;
use crate::version;
use std::convert::TryFrom;
use std::io::Write;

/// The largest payload whose length still fits into seven bytes.
pub const MAX_LENGTH: u64 = (1 << 56) - 1;

const HEADER_BIT: u8 = 0b1000_0000;
const TAG_MASK: u8 = 0b0111_1000;
const SZ_MASK: u8 = 0b0000_0111;
const VERSION_MASK: u8 = 0b0111_1111;

/// The type of a record. Codes 12 to 15 are reserved and rejected by the decoder.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Bin = 0,
    Int = 1,
    NegInt = 2,
    Float = 3,
    NegFloat = 4,
    Complex = 5,
    Str = 6,
    False = 7,
    True = 8,
    Null = 9,
    Map = 10,
    Arr = 11,
}

impl Tag {

    /// Returns the mnemonic of the tag. This is useful for error messages.
    pub fn name(&self) -> &'static str {
        match *self {
            Tag::Bin      => "binary",
            Tag::Int      => "integer",
            Tag::NegInt   => "negative integer",
            Tag::Float    => "float",
            Tag::NegFloat => "negative float",
            Tag::Complex  => "complex",
            Tag::Str      => "string",
            Tag::False    => "false",
            Tag::True     => "true",
            Tag::Null     => "null",
            Tag::Map      => "map",
            Tag::Arr      => "array",
        }
    }

    /// Whether a record of this type may appear in key position of a map.
    pub fn is_key(&self) -> bool {
        !matches!(*self, Tag::Map | Tag::Arr)
    }

}

impl TryFrom<u8> for Tag {
    type Error = DecodeError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            x if x == Tag::Bin as u8      => Ok(Tag::Bin),
            x if x == Tag::Int as u8      => Ok(Tag::Int),
            x if x == Tag::NegInt as u8   => Ok(Tag::NegInt),
            x if x == Tag::Float as u8    => Ok(Tag::Float),
            x if x == Tag::NegFloat as u8 => Ok(Tag::NegFloat),
            x if x == Tag::Complex as u8  => Ok(Tag::Complex),
            x if x == Tag::Str as u8      => Ok(Tag::Str),
            x if x == Tag::False as u8    => Ok(Tag::False),
            x if x == Tag::True as u8     => Ok(Tag::True),
            x if x == Tag::Null as u8     => Ok(Tag::Null),
            x if x == Tag::Map as u8      => Ok(Tag::Map),
            x if x == Tag::Arr as u8      => Ok(Tag::Arr),
            x => Err(DecodeError::Reserved(x)),
        }
    }
}

#[inline]
pub fn encode_header(tag: Tag, sz: u8) -> u8 {
    HEADER_BIT | (tag as u8) << 3 | sz & SZ_MASK
}

/// Splits a header byte into its raw tag bits and `sz`.
#[inline]
pub fn decode_header(byte: u8) -> (u8, u8) {
    ((byte & TAG_MASK) >> 3, byte & SZ_MASK)
}

#[inline]
pub fn encode_version(version: u8) -> u8 {
    version & VERSION_MASK
}

/// Returns `None` if `byte` is a header byte rather than a version byte. A version which isn't supported is an error.
#[inline]
pub fn decode_version(byte: u8) -> Result<Option<u8>, DecodeError> {
    if byte & HEADER_BIT == 0 {
        version::check(byte & VERSION_MASK).map(Some)
    } else {
        Ok(None)
    }
}

/// Everything that precedes the payload of a record.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Header {
    pub version: Option<u8>,
    pub tag: Tag,
    /// Length of the payload in bytes
    pub len: u64,
}

impl Header {

    /// Returns the number of written bytes
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<usize, EncodeError> {
        if self.len > MAX_LENGTH {
            return Err(EncodeError::Length(self.len));
        }
        let mut c = 0;
        if let Some(v) = self.version {
            w.write_all(&[encode_version(v)])?;
            c += 1;
        }
        if self.len == 0 {
            w.write_all(&[encode_header(self.tag, 0)])?;
            Ok(c + 1)
        } else {
            let len = varint::pack(self.len);
            w.write_all(&[encode_header(self.tag, len.len() as u8)])?;
            w.write_all(&len)?;
            Ok(c + 1 + len.len())
        }
    }

    /// Reads version, header byte and length field, byte by byte, never more than `budget` bytes. Returns the
    /// header and the number of consumed bytes.
    pub fn read<'de, R: Read<'de>>(r: &mut R, budget: u64) -> Result<(Self, u64), DecodeError> {
        let mut c = 0;
        let mut byte = Self::next(r, budget, &mut c)?;
        let version = decode_version(byte)?;
        if version.is_some() {
            byte = Self::next(r, budget, &mut c)?;
            if byte & HEADER_BIT == 0 {
                return Err(DecodeError::UnexpectedTag { expected: "header byte", found: "version byte" });
            }
        }
        let (tag, sz) = decode_header(byte);
        let tag = Tag::try_from(tag)?;
        let len = if sz == 0 {
            0
        } else {
            check_budget(budget - c, sz as u64)?;
            c += sz as u64;
            varint::unpack(&r.read(sz as usize)?)
        };
        Ok((Header { version, tag, len }, c))
    }

    #[inline]
    fn next<'de, R: Read<'de>>(r: &mut R, budget: u64, c: &mut u64) -> Result<u8, DecodeError> {
        check_budget(budget - *c, 1)?;
        *c += 1;
        r.read_byte()
    }

}

/// Fails unless `wanted` bytes fit into the `remaining` ones.
#[inline]
pub fn check_budget(remaining: u64, wanted: u64) -> Result<(), DecodeError> {
    if wanted > remaining {
        Err(DecodeError::Overrun { declared: wanted, remaining })
    } else {
        Ok(())
    }
}
