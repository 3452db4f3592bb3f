//! The atom of a DDP message is the `Value`.
//! Values are encoded on wire as records: a header announcing type and payload length, followed by the payload.
//! Containers, floats and complex numbers carry further records in their payload, each of which knows its own length,
//! so nothing but the outermost header is needed to find the end of a message.

use crate::error::{DecodeError, DecoderError, EncodeError};
use crate::header::{check_budget, Header, Tag};
use crate::read::{IoRead, Read, SliceRead};
use crate::{float, varint, version, DEFAULT_MAX_DEPTH};
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use std::borrow::Cow;
use std::convert::TryFrom;
use std::io::{self, Write};
use std::str::from_utf8;

/// The sign of an integer. Note that the encoder accepts negative zero but transparently translates it to positive
/// zero. Likewise, decoders will accept the wire format for negative zero but return positive zero, so that testing
/// the output doesn't need to concern itself with another special case.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Sign { Pos, Neg }

/// The possible values according to the DDP data model.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Bytes(Cow<'a, [u8]>),
    Int(Sign, BigUint),
    Float(f64),
    Complex(f64, f64),
    Str(Cow<'a, str>),
    Map(Vec<(Value<'a>, Value<'a>)>),
    Array(Vec<Value<'a>>),
}

impl<'a> Value<'a> {

    pub fn typename(&self) -> &'static str {
        match *self {
            Self::Null          => "null",
            Self::Bool(_)       => "bool",
            Self::Bytes(_)      => "bytes",
            Self::Int(_, _)     => "integer",
            Self::Float(_)      => "float",
            Self::Complex(_, _) => "complex",
            Self::Str(_)        => "string",
            Self::Map(_)        => "map",
            Self::Array(_)      => "array",
        }
    }

    /// The type tag this value is written with.
    pub fn tag(&self) -> Tag {
        match self {
            Self::Null                => Tag::Null,
            Self::Bool(true)          => Tag::True,
            Self::Bool(false)         => Tag::False,
            Self::Bytes(_)            => Tag::Bin,
            Self::Int(Sign::Neg, v) if v.is_zero() => Tag::Int,
            Self::Int(Sign::Neg, _)   => Tag::NegInt,
            Self::Int(Sign::Pos, _)   => Tag::Int,
            Self::Float(v) if *v < 0. => Tag::NegFloat,
            Self::Float(_)           => Tag::Float,
            Self::Complex(_, _)      => Tag::Complex,
            Self::Str(_)             => Tag::Str,
            Self::Map(_)             => Tag::Map,
            Self::Array(_)           => Tag::Arr,
        }
    }

    /// Whether this value is the one an empty payload stands for, i.e. it can be written without one.
    pub fn is_sentinel(&self) -> bool {
        self.tag().sentinel().map_or(false, |s| s == *self)
    }

    /// Detaches the value from the buffer it was decoded from.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Self::Null          => Value::Null,
            Self::Bool(v)       => Value::Bool(v),
            Self::Bytes(v)      => Value::Bytes(Cow::Owned(v.into_owned())),
            Self::Int(s, v)     => Value::Int(s, v),
            Self::Float(v)      => Value::Float(v),
            Self::Complex(r, i) => Value::Complex(r, i),
            Self::Str(v)        => Value::Str(Cow::Owned(v.into_owned())),
            Self::Map(v)        => Value::Map(v.into_iter().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()),
            Self::Array(v)      => Value::Array(v.into_iter().map(Value::into_owned).collect()),
        }
    }

}

impl Tag {

    /// The value of a record of this type whose payload is empty. Complex numbers have none: their payload always
    /// holds two floats.
    pub fn sentinel(&self) -> Option<Value<'static>> {
        match *self {
            Tag::Bin      => Some(Value::Bytes(Cow::Borrowed(&[]))),
            Tag::Int      => Some(Value::Int(Sign::Pos, BigUint::zero())),
            Tag::NegInt   => Some(Value::Int(Sign::Neg, BigUint::one())),
            Tag::Float    => Some(Value::Float(0.)),
            Tag::NegFloat => Some(Value::Float(-1.)),
            Tag::Complex  => None,
            Tag::Str      => Some(Value::Str(Cow::Borrowed(""))),
            Tag::False    => Some(Value::Bool(false)),
            Tag::True     => Some(Value::Bool(true)),
            Tag::Null     => Some(Value::Null),
            Tag::Map      => Some(Value::Map(Vec::new())),
            Tag::Arr      => Some(Value::Array(Vec::new())),
        }
    }

}

impl<'a> std::fmt::Display for Value<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null          => f.write_str("null"),
            Value::Bool(true)    => f.write_str("true"),
            Value::Bool(false)   => f.write_str("false"),
            Value::Bytes(v)      => write!(f, "'{}'", base64::encode(v)),
            Value::Int(s, v)     => write!(f, "{}{}", match s { Sign::Neg if !v.is_zero() => "-", _ => "" }, v),
            Value::Float(v)      => write!(f, "{:?}", v),
            Value::Complex(r, i) => write!(f, "({:?}{}{:?}j)", r, if i.is_sign_negative() { "" } else { "+" }, i),
            Value::Str(v)        => write!(f, "{:?}", v),
            Value::Map(v)        => write!(f, "{{{}}}", v.iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<String>>().join(", ")),
            Value::Array(v)      => write!(f, "[{}]", v.iter()
                .map(|v| v.to_string())
                .collect::<Vec<String>>().join(", ")),
        }
    }
}

impl From<bool> for Value<'static> {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value<'static> {
    fn from(v: i64) -> Self {
        Value::from(v as i128)
    }
}

impl From<u64> for Value<'static> {
    fn from(v: u64) -> Self {
        Value::Int(Sign::Pos, BigUint::from(v))
    }
}

impl From<i128> for Value<'static> {
    fn from(v: i128) -> Self {
        let sign = if v < 0 { Sign::Neg } else { Sign::Pos };
        Value::Int(sign, BigUint::from(v.unsigned_abs()))
    }
}

impl From<u128> for Value<'static> {
    fn from(v: u128) -> Self {
        Value::Int(Sign::Pos, BigUint::from(v))
    }
}

impl From<BigUint> for Value<'static> {
    fn from(v: BigUint) -> Self {
        Value::Int(Sign::Pos, v)
    }
}

impl From<f64> for Value<'static> {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Value::Str(Cow::Borrowed(v))
    }
}

impl From<String> for Value<'static> {
    fn from(v: String) -> Self {
        Value::Str(Cow::Owned(v))
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(v: &'a [u8]) -> Self {
        Value::Bytes(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for Value<'static> {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(Cow::Owned(v))
    }
}

impl<'a> From<Vec<Value<'a>>> for Value<'a> {
    fn from(v: Vec<Value<'a>>) -> Self {
        Value::Array(v)
    }
}

/// Used to encode DDP values. By default the top level record is preceded by a version byte; nested records never
/// are.
pub struct Encoder<'w, W: Write> {
    writer: &'w mut W,
    version: Option<u8>,
    max_depth: usize,
}

impl<'w, W: Write> Encoder<'w, W> {

    pub fn new(writer: &'w mut W) -> Self {
        Self { writer, version: Some(version::CURRENT), max_depth: DEFAULT_MAX_DEPTH }
    }

    /// Whether to write a version byte in front of the record.
    pub fn include_version(mut self, include: bool) -> Self {
        self.version = if include { Some(version::CURRENT) } else { None };
        self
    }

    /// How deep containers may be nested before encoding fails.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Encode a versioned value to the given writer. The resulting `usize` is the amount of bytes that got written.
    pub fn encode(value: &Value, writer: &'w mut W) -> Result<usize, EncodeError> {
        Self::new(writer).encode_value(value)
    }

    /// Encode a value without version byte, as it would appear inside a container.
    pub fn encode_nested(value: &Value, writer: &'w mut W) -> Result<usize, EncodeError> {
        Self::new(writer).include_version(false).encode_value(value)
    }

    pub fn encode_value(&mut self, value: &Value) -> Result<usize, EncodeError> {
        let (tag, payload) = self.payload(value, 0)?;
        let c = Header { version: self.version, tag, len: Self::to_u64(payload.len())? }.encode(&mut *self.writer)?;
        self.writer.write_all(&payload)?;
        log::debug!("type({}) datalen({}) data({})", tag.name(), payload.len(), value);
        Ok(c + payload.len())
    }

    /// Appends the version-less record of a value nested at `depth`.
    fn nested(&self, value: &Value, depth: usize, out: &mut Vec<u8>) -> Result<usize, EncodeError> {
        if depth > self.max_depth {
            return Err(EncodeError::Depth(self.max_depth));
        }
        let (tag, payload) = self.payload(value, depth)?;
        let c = Header { version: None, tag, len: Self::to_u64(payload.len())? }.encode(out)?;
        out.extend_from_slice(&payload);
        log::trace!("nested type({}) datalen({})", tag.name(), payload.len());
        Ok(c + payload.len())
    }

    fn payload<'v>(&self, value: &'v Value, depth: usize) -> Result<(Tag, Cow<'v, [u8]>), EncodeError> {
        let tag = value.tag();
        if value.is_sentinel() {
            return Ok((tag, Cow::Borrowed(&[])));
        }
        let payload = match value {
            Value::Null | Value::Bool(_) => Cow::Borrowed(&[][..]),
            Value::Int(_, v) if v.is_zero() => Cow::Borrowed(&[][..]),
            Value::Bytes(v)   => Cow::Borrowed(v.as_ref()),
            Value::Str(v)     => Cow::Borrowed(v.as_bytes()),
            Value::Int(_, v)  => Cow::Owned(varint::pack_magnitude(v)),
            Value::Float(v)   => {
                let (digits, exponent) = float::pack(v.abs()).map_err(|_| EncodeError::Float(*v))?;
                let mut buf = Vec::new();
                self.nested(&Value::from(digits), depth + 1, &mut buf)?;
                self.nested(&Value::from(exponent as i64), depth + 1, &mut buf)?;
                Cow::Owned(buf)
            },
            Value::Complex(r, i) => {
                let mut buf = Vec::new();
                self.nested(&Value::Float(*r), depth + 1, &mut buf)?;
                self.nested(&Value::Float(*i), depth + 1, &mut buf)?;
                Cow::Owned(buf)
            },
            Value::Map(inner) => {
                let mut buf = Vec::new();
                for (key, val) in inner.iter() {
                    self.nested(key, depth + 1, &mut buf)?;
                    self.nested(val, depth + 1, &mut buf)?;
                }
                Cow::Owned(buf)
            },
            Value::Array(inner) => {
                let mut buf = Vec::new();
                for field in inner.iter() {
                    self.nested(field, depth + 1, &mut buf)?;
                }
                Cow::Owned(buf)
            },
        };
        Ok((tag, payload))
    }

    #[inline]
    fn to_u64(value: usize) -> Result<u64, EncodeError> {
        u64::try_from(value).map_err(|_| EncodeError::Length(value as u64))
    }

}

/// Encodes a versioned value into a fresh buffer.
pub fn to_bytes(value: &Value) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    Encoder::encode(value, &mut buf)?;
    Ok(buf)
}

/// Used to decode DDP records, either from a buffer or straight from a stream. Each call to
/// [decode_value](Decoder::decode_value) consumes exactly one record including all records nested inside it.
pub struct Decoder<R> {
    read: R,
    max_depth: usize,
}

impl<'a> Decoder<SliceRead<'a>> {

    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self { read: SliceRead::new(buf), max_depth: DEFAULT_MAX_DEPTH }
    }

    /// Decode a single value from the given buffer. All strings and byte data will be borrowed from the buffer
    /// instead of copied. Returns the value and the number of consumed bytes; whatever follows is left alone.
    pub fn decode<B: ?Sized + AsRef<[u8]>>(buf: &'a B) -> Result<(Value<'a>, usize), DecoderError> {
        let mut decoder = Self::from_slice(buf.as_ref());
        let value = decoder.decode_value()?;
        Ok((value, decoder.position()))
    }

    /// Like [decode](Decoder::decode) but hands back the unconsumed tail of the buffer.
    pub fn decode_split(buf: &'a [u8]) -> Result<(Value<'a>, &'a [u8]), DecoderError> {
        let mut decoder = Self::from_slice(buf);
        let value = decoder.decode_value()?;
        Ok((value, decoder.remainder()))
    }

    pub fn remainder(&self) -> &'a [u8] {
        self.read.remainder()
    }

}

impl<R: io::Read> Decoder<IoRead<R>> {

    pub fn from_reader(reader: R) -> Self {
        Self { read: IoRead::new(reader), max_depth: DEFAULT_MAX_DEPTH }
    }

    /// Decode a single value from a stream, reading exactly the bytes which belong to it. Returns the value and the
    /// number of bytes consumed from the stream.
    pub fn decode_from_reader(reader: R) -> Result<(Value<'static>, usize), DecoderError> {
        let mut decoder = Self::from_reader(reader);
        let value = decoder.decode_value()?;
        Ok((value, decoder.position()))
    }

    pub fn into_inner(self) -> R {
        self.read.into_inner()
    }

}

impl<'de, R: Read<'de>> Decoder<R> {

    /// How deep containers may be nested before decoding fails.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.read.position()
    }

    /// Decode the next record. Either the whole record is consumed and returned or decoding fails; in the latter
    /// case the source is left somewhere inside the record and can't be used for further records.
    pub fn decode_value(&mut self) -> Result<Value<'de>, DecoderError> {
        let start = self.read.position();
        let (tag, value, c) = self.record(u64::MAX, 0).map_err(|e| e.at(self.read.position()))?;
        log::debug!("type({}) of {} bytes at input position {}", tag.name(), c, start);
        Ok(value)
    }

    /// Reads one record of at most `budget` bytes and returns its tag, its value and its size.
    fn record(&mut self, budget: u64, depth: usize) -> Result<(Tag, Value<'de>, u64), DecodeError> {
        if depth > self.max_depth {
            return Err(DecodeError::Depth(self.max_depth));
        }
        let (header, c) = Header::read(&mut self.read, budget)?;
        check_budget(budget - c, header.len)?;
        log::trace!("version({}) type({}) datalen({})",
            header.version.map_or_else(|| "-".to_owned(), |v| v.to_string()), header.tag.name(), header.len);
        let value = self.payload(header.tag, Self::to_usize(header.len)?, depth)?;
        Ok((header.tag, value, c + header.len))
    }

    fn payload(&mut self, tag: Tag, len: usize, depth: usize) -> Result<Value<'de>, DecodeError> {
        if len == 0 {
            if let Some(sentinel) = tag.sentinel() {
                return Ok(sentinel);
            }
        }
        match tag {
            Tag::Bin    => Ok(Value::Bytes(self.read.read(len)?)),
            Tag::Int    => Ok(Value::Int(Sign::Pos, varint::unpack_magnitude(&self.read.read(len)?))),
            Tag::NegInt => match varint::unpack_magnitude(&self.read.read(len)?) {
                v if v.is_zero() => Ok(Value::Int(Sign::Pos, v)),
                v => Ok(Value::Int(Sign::Neg, v)),
            },
            Tag::Str    => Ok(Value::Str(match self.read.read(len)? {
                Cow::Borrowed(v) => Cow::Borrowed(from_utf8(v)?),
                Cow::Owned(v)    => Cow::Owned(String::from_utf8(v).map_err(|e| e.utf8_error())?),
            })),
            Tag::False | Tag::True | Tag::Null => {
                self.read.skip(len)?;
                Ok(match tag { Tag::False => Value::Bool(false), Tag::True => Value::Bool(true), _ => Value::Null })
            },
            Tag::Float | Tag::NegFloat => {
                let mut remaining = len as u64;
                let v = self.float(&mut remaining, depth)?;
                self.read.skip(remaining as usize)?;
                Ok(Value::Float(if tag == Tag::NegFloat { -v } else { v }))
            },
            Tag::Complex => {
                let mut remaining = len as u64;
                let r = self.float_entry(&mut remaining, depth, "complex")?;
                let i = self.float_entry(&mut remaining, depth, "complex")?;
                self.read.skip(remaining as usize)?;
                Ok(Value::Complex(r, i))
            },
            Tag::Map => {
                let mut remaining = len as u64;
                let mut entries = Vec::new();
                while remaining > 0 {
                    let (t, key) = self.entry(&mut remaining, depth, "map")?;
                    if !t.is_key() {
                        return Err(DecodeError::IllegalKey(t.name()));
                    }
                    let (_, val) = self.entry(&mut remaining, depth, "map")?;
                    entries.push((key, val));
                }
                Ok(Value::Map(entries))
            },
            Tag::Arr => {
                let mut remaining = len as u64;
                let mut elements = Vec::new();
                while remaining > 0 {
                    elements.push(self.entry(&mut remaining, depth, "array")?.1);
                }
                Ok(Value::Array(elements))
            },
        }
    }

    /// Reads the next nested record out of a payload with `remaining` bytes left.
    fn entry(&mut self, remaining: &mut u64, depth: usize, container: &'static str) -> Result<(Tag, Value<'de>), DecodeError> {
        if *remaining == 0 {
            return Err(DecodeError::Incomplete(container));
        }
        let (tag, value, c) = self.record(*remaining, depth + 1)?;
        *remaining -= c;
        Ok((tag, value))
    }

    /// Reads mantissa digits and exponent and reassembles the absolute value of a float.
    fn float(&mut self, remaining: &mut u64, depth: usize) -> Result<f64, DecodeError> {
        let digits = match self.entry(remaining, depth, "float")? {
            (_, Value::Int(Sign::Pos, v)) => v,
            (t, _) => return Err(DecodeError::UnexpectedTag { expected: "integer", found: t.name() }),
        };
        let exponent = match self.entry(remaining, depth, "float")? {
            (_, Value::Int(Sign::Pos, v)) => v.to_i64().unwrap_or(i64::MAX),
            (_, Value::Int(Sign::Neg, v)) => v.to_i64().map_or(i64::MIN, |v| -v),
            (t, _) => return Err(DecodeError::UnexpectedTag { expected: "integer", found: t.name() }),
        };
        float::unpack(&digits, exponent)
    }

    fn float_entry(&mut self, remaining: &mut u64, depth: usize, container: &'static str) -> Result<f64, DecodeError> {
        match self.entry(remaining, depth, container)? {
            (_, Value::Float(v)) => Ok(v),
            (t, _) => Err(DecodeError::UnexpectedTag { expected: "float", found: t.name() }),
        }
    }

    #[inline]
    fn to_usize(value: u64) -> Result<usize, DecodeError> {
        usize::try_from(value).map_err(|_| DecodeError::Length(value))
    }

}

#[cfg(test)]
mod test {
    use super::{to_bytes, Decoder, Encoder, Sign, Value};
    use crate::error::{DecodeError, EncodeError, ErrorKind};
    use crate::header::{Header, Tag};
    use crate::varint;
    use num_bigint::BigUint;
    use std::borrow::Cow;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn nested(value: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        Encoder::encode_nested(value, &mut buf).unwrap();
        buf
    }

    fn map(entries: Vec<(Value<'static>, Value<'static>)>) -> Value<'static> {
        Value::Map(entries)
    }

    #[test]
    fn literal_vectors() {
        assert_eq!(vec![0x03, 0x88], to_bytes(&Value::from(0i64)).unwrap());
        assert_eq!(Value::from(0u64), Decoder::decode(&[0x03, 0x88]).unwrap().0);
        assert_eq!(vec![0x03, 0x90], to_bytes(&Value::from(-1i64)).unwrap());
        assert_eq!(vec![0xb1, 0x01, 0x41], nested(&Value::from("A")));
        assert_eq!(vec![0x03, 0xd8], to_bytes(&Value::Array(vec![])).unwrap());
        assert_eq!(vec![0x03, 0xd1, 0x06, 0xb1, 0x01, 0x61, 0x89, 0x01, 0x01],
            to_bytes(&map(vec![(Value::from("a"), Value::from(1i64))])).unwrap());
    }

    #[test]
    fn literal_floats() {
        assert_eq!(vec![0x03, 0x99, 0x06, 0x89, 0x01, 0x05, 0x89, 0x01, 0x01], to_bytes(&Value::Float(1.)).unwrap());
        assert_eq!(vec![0x03, 0xa1, 0x07, 0x89, 0x02, 0x02, 0x71, 0x89, 0x01, 0x02], to_bytes(&Value::Float(-2.5)).unwrap());
        assert_eq!(vec![0x98], nested(&Value::Float(0.)));
        assert_eq!(vec![0xa0], nested(&Value::Float(-1.)));
        assert_eq!(vec![0xa9, 0x02, 0x98, 0xa0], nested(&Value::Complex(0., -1.)));
    }

    #[test]
    fn sentinels() {
        assert_eq!(vec![0x88], nested(&Value::Int(Sign::Neg, BigUint::from(0u8))));
        assert_eq!(vec![0x80], nested(&Value::Bytes(Cow::Borrowed(&[]))));
        assert_eq!(vec![0xb0], nested(&Value::Str(Cow::Borrowed(""))));
        assert_eq!(vec![0xd0], nested(&Value::Map(vec![])));
        assert_eq!(vec![0xc8], nested(&Value::Null));
        assert_eq!(vec![0xc0], nested(&Value::Bool(true)));
        assert_eq!(vec![0xb8], nested(&Value::Bool(false)));
        assert_eq!(vec![0x98], nested(&Value::Float(-0.)));
        // a length field which says zero is as good as none
        assert_eq!(Value::from(-1i64), Decoder::decode(&[0x91, 0x00]).unwrap().0);
        assert_eq!(Value::Float(-1.), Decoder::decode(&[0xa1, 0x00]).unwrap().0);
    }

    #[test]
    fn simple_values() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::Null, &mut buf);
        assert_roundtrip(Value::Bool(true), &mut buf);
        assert_roundtrip(Value::Bool(false), &mut buf);
        for i in (0..u64::MAX).step_by(3_203_431_780_337) {
            assert_roundtrip(Value::from(i), &mut buf);
            assert_roundtrip(Value::Int(Sign::Neg, BigUint::from(i.max(1))), &mut buf);
        }
        assert_roundtrip(Value::from(u64::MAX), &mut buf);
        assert_roundtrip(Value::Int(Sign::Neg, BigUint::from(u64::MAX)), &mut buf);
    }

    #[test]
    fn big_integers() {
        let mut buf = Vec::new();
        let two_64: BigUint = BigUint::from(1u8) << 64;
        assert_eq!(vec![0x03, 0x89, 0x09, 1, 0, 0, 0, 0, 0, 0, 0, 0], to_bytes(&Value::from(two_64.clone())).unwrap());
        assert_eq!(Value::from(two_64.clone()), Decoder::decode(&[0x03, 0x89, 0x09, 1, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap().0);
        assert_eq!(Value::from(i128::MIN), Decoder::decode(&to_bytes(&Value::from(i128::MIN)).unwrap()).unwrap().0);
        assert_roundtrip(Value::Int(Sign::Neg, two_64), &mut buf);
        assert_roundtrip(Value::from(u128::MAX), &mut buf);
        assert_roundtrip(Value::from((BigUint::from(1u8) << 4000) - 1u8), &mut buf);
        // leading zero bytes from lenient encoders decode to the same number
        assert_eq!(Value::from(2u64), Decoder::decode(&[0x89, 0x0a, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2]).unwrap().0);
        assert_eq!("-18446744073709551616", Value::Int(Sign::Neg, BigUint::from(1u8) << 64).to_string());
    }

    #[test]
    fn negative_zero() {
        let zero = Value::from(0u64);
        assert_eq!(zero, Decoder::decode(&[0x91, 0x01, 0x00]).unwrap().0);
        assert_eq!(zero, Decoder::decode(&nested(&Value::Int(Sign::Neg, BigUint::from(0u8)))).unwrap().0);
    }

    #[test]
    fn floats() {
        let mut buf = Vec::new();
        for v in [0., -1., 1., -2.5, 0.1, 1337.8472, -1e-300, f64::MAX, f64::MIN, f64::MIN_POSITIVE, f64::from_bits(1),
                  std::f64::consts::PI, -std::f64::consts::E] {
            assert_roundtrip(Value::Float(v), &mut buf);
        }
        assert_roundtrip(Value::Complex(1.5, -0.25), &mut buf);
        assert_roundtrip(Value::Complex(0., 0.), &mut buf);
        assert_roundtrip(Value::Complex(-1., f64::MAX), &mut buf);
    }

    #[test]
    fn unsupported_floats() {
        for v in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let err = to_bytes(&Value::Float(v)).unwrap_err();
            assert!(matches!(err, EncodeError::Float(_)));
            assert_eq!(ErrorKind::Type, err.kind());
        }
        assert!(matches!(to_bytes(&Value::Complex(0., f64::NAN)), Err(EncodeError::Float(_))));
        assert!(matches!(to_bytes(&Value::Array(vec![Value::Float(f64::INFINITY)])), Err(EncodeError::Float(_))));
    }

    #[test]
    fn strings() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::Str(Cow::Borrowed("Üben von Xylophon und Querflöte ist ja zweckmäßig.")), &mut buf);
        assert_roundtrip(Value::Str(Cow::Owned("x".repeat(70_000))), &mut buf);
    }

    #[test]
    fn bytes() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::Bytes(Cow::Borrowed(&[1, 2, 3, 4, 255])), &mut buf);
        assert_roundtrip(Value::Bytes(Cow::Owned(vec![0; 300])), &mut buf);
    }

    #[test]
    fn array_mixed() {
        let mut buf = Vec::new();
        assert_roundtrip(Value::Array(vec![
                Value::from(1u64),
                Value::Str(Cow::Borrowed("Jessica")),
                Value::Null,
                Value::Float(std::f64::consts::PI),
                Value::Complex(1., 2.),
                Value::Bytes(Cow::Borrowed(b"\x00\xff")),
        ]), &mut buf);
    }

    #[test]
    fn array_long() {
        let mut buf = Vec::new();
        for i in 0..1 << 10 {
            assert_roundtrip(Value::Array(vec![ Value::from(1u64); i as usize ]), &mut buf);
        }
    }

    #[test]
    fn map_entries() {
        let mut buf = Vec::new();
        assert_roundtrip(map(vec![
                (Value::Str(Cow::Borrowed("first")),  Value::from(1u64)),
                (Value::Str(Cow::Borrowed("second")), Value::from(2u64)),
                (Value::from(-3i64),                  Value::from(3u64)),
                (Value::Float(0.5),                   Value::Null),
                (Value::Bool(true),                   Value::Array(vec![])),
                (Value::Null,                         Value::Map(vec![])),
                (Value::Str(Cow::Borrowed("first")),  Value::from(4u64)),
        ]), &mut buf);
    }

    #[test]
    fn deeply_nested() {
        let mut buf = Vec::new();
        let value = map(vec![
            (Value::from("outer"), Value::Array(vec![
                map(vec![(Value::from("inner"), Value::Array(vec![
                    Value::Array(vec![Value::from(-7i64), Value::from("deep")]),
                    map(vec![]),
                ]))]),
                Value::Float(-0.5),
            ])),
            (Value::from(2i64), Value::Complex(3., 4.)),
        ]);
        assert_roundtrip(value, &mut buf);
    }

    #[test]
    fn self_delimiting() {
        let a = map(vec![(Value::from("a"), Value::Array(vec![Value::from(1i64), Value::Float(2.5)]))]);
        let b = Value::from("bee");
        let mut buf = nested(&a);
        let first = buf.len();
        buf.extend(nested(&b));
        buf.extend_from_slice(&[0xde, 0xad]);
        let (value, rest) = Decoder::decode_split(&buf).unwrap();
        assert_eq!(a, value);
        assert_eq!(&buf[first..], rest);
        let (value, c) = Decoder::decode(rest).unwrap();
        assert_eq!(b, value);
        assert_eq!(&[0xde, 0xad], &rest[c..]);
    }

    #[test]
    fn illegal_keys() {
        for key in [Value::Map(vec![]), Value::Array(vec![Value::Null])] {
            let buf = to_bytes(&map(vec![(key, Value::Null)])).unwrap();
            let err = Decoder::decode(&buf).unwrap_err();
            assert_eq!(ErrorKind::KeyType, err.kind());
        }
        let buf = to_bytes(&map(vec![(Value::Array(vec![]), Value::Null)])).unwrap();
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::IllegalKey("array")));
    }

    #[test]
    fn version_gate() {
        // the payload is truncated, which would be an error too, but the version is looked at first
        let buf: [u8; 3] = [0x02, 0xb5, 0x05];
        let err = Decoder::decode(&buf).unwrap_err();
        assert_eq!(1, err.position());
        assert!(matches!(err.into_inner(), DecodeError::Version(2)));
        let mut cursor = Cursor::new(&buf[..]);
        assert!(matches!(Decoder::decode_from_reader(&mut cursor).unwrap_err().into_inner(), DecodeError::Version(2)));
        assert_eq!(1, cursor.position());
    }

    #[test]
    fn unversioned_top_level() {
        assert_eq!(Value::from("A"), Decoder::decode(&[0xb1, 0x01, 0x41]).unwrap().0);
        // nested records may carry a version too
        assert_eq!(Value::Array(vec![Value::Null]), Decoder::decode(&[0xd9, 0x02, 0x03, 0xc8]).unwrap().0);
    }

    #[test]
    fn errors() {
        let buf: [u8; 0] = [];
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::Eof));
        let buf = [0xb1, 0x02, 0xc3, 0x28];
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::Utf8(_)));
        let buf = [0xe0];
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::Reserved(12)));
        let buf = [0x03, 0xf8];
        let err = Decoder::decode(&buf).unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());
        let buf = [0xb1, 0x05, 0x41];
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::Eof));
        let buf = [0x89, 0x09, 1, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!((Value::from(BigUint::from(1u8) << 64), 11), Decoder::decode(&buf).unwrap());
    }

    #[test]
    fn malformed_containers() {
        // a key without a value
        let buf = [0xd1, 0x03, 0xb1, 0x01, 0x61];
        let err = Decoder::decode(&buf).unwrap_err();
        assert_eq!(ErrorKind::Malformed, err.kind());
        assert!(matches!(err.into_inner(), DecodeError::Incomplete("map")));
        // the element claims two bytes but the array only has one left
        let buf = [0xd9, 0x02, 0xb1, 0x02, 0x41, 0x42];
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::Overrun { declared: 2, remaining: 0 }));
        // a float with a mantissa but no exponent
        let buf = [0x99, 0x03, 0x89, 0x01, 0x05];
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::Incomplete("float")));
        // complex numbers always have a payload
        let buf = [0xa8];
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::Incomplete("complex")));
        // a mantissa which is a string
        let buf = [0x99, 0x04, 0xb1, 0x01, 0x41, 0x88];
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::UnexpectedTag { expected: "integer", found: "string" }));
        // an exponent which overflows
        let buf = [0x99, 0x07, 0x89, 0x01, 0x05, 0x89, 0x02, 0x13, 0x88];
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::Float));
        // complex parts must be floats
        let buf = [0xa9, 0x02, 0x88, 0x98];
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::UnexpectedTag { expected: "float", found: "integer" }));
    }

    #[test]
    fn extreme_float_exponents() {
        let start = Instant::now();
        // a zero mantissa with an exponent of 2^62
        let buf = [0x99, 0x0b, 0x88, 0x89, 0x08, 0x40, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!((Value::Float(0.), 13), Decoder::decode(&buf).unwrap());
        assert_eq!((Value::Float(0.), 13), Decoder::decode_from_reader(Cursor::new(&buf[..])).unwrap());
        // a non-zero mantissa overflows
        let buf = [0x99, 0x0d, 0x89, 0x01, 0x05, 0x89, 0x08, 0x40, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::Float));
        // and underflows with an exponent of -2^62
        let buf = [0x99, 0x0d, 0x89, 0x01, 0x05, 0x91, 0x08, 0x40, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(Value::Float(0.), Decoder::decode(&buf).unwrap().0);
        // exponents beyond 64 bits saturate as well
        let buf = [0x99, 0x0e, 0x89, 0x01, 0x05, 0x89, 0x09, 1, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::Float));
        // a mantissa below one half
        let buf = [0x99, 0x06, 0x89, 0x01, 0x01, 0x89, 0x01, 0x01];
        assert_eq!(Value::Float(0.2), Decoder::decode(&buf).unwrap().0);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn ignored_payloads() {
        // payload bytes of fixed values and surplus bytes after a float are skipped
        let buf = [0xc1, 0x02, 0xaa, 0xbb, 0x88];
        let (value, c) = Decoder::decode(&buf).unwrap();
        assert_eq!(Value::Bool(true), value);
        assert_eq!(4, c);
        let buf = [0x99, 0x07, 0x89, 0x01, 0x05, 0x89, 0x01, 0x01, 0xff];
        let (value, c) = Decoder::decode(&buf).unwrap();
        assert_eq!(Value::Float(1.), value);
        assert_eq!(9, c);
    }

    #[test]
    fn depth() {
        let mut value = Value::Null;
        for _ in 0..10 {
            value = Value::Array(vec![value]);
        }
        let mut buf = Vec::new();
        assert!(matches!(Encoder::new(&mut buf).max_depth(9).encode_value(&value), Err(EncodeError::Depth(9))));
        buf.clear();
        Encoder::new(&mut buf).max_depth(10).encode_value(&value).unwrap();
        assert!(matches!(Decoder::from_slice(&buf).with_max_depth(9).decode_value().unwrap_err().into_inner(), DecodeError::Depth(9)));
        assert_eq!(value, Decoder::from_slice(&buf).with_max_depth(10).decode_value().unwrap());
    }

    #[test]
    fn adversarial_nesting() {
        // ten thousand arrays opening inside each other must fail gracefully instead of exhausting the stack
        let mut sizes = vec![1u64];
        for _ in 0..10_000 {
            let s = sizes[sizes.len() - 1];
            sizes.push(1 + varint::width(s) as u64 + s);
        }
        let mut buf = Vec::new();
        for s in sizes[..sizes.len() - 1].iter().rev() {
            Header { version: None, tag: Tag::Arr, len: *s }.encode(&mut buf).unwrap();
        }
        buf.push(0xd8);
        assert!(matches!(Decoder::decode(&buf).unwrap_err().into_inner(), DecodeError::Depth(_)));
    }

    #[test]
    fn too_big_allocations() {
        let mut buf = [0u8; 9];
        buf[0] = 0x87;
        for i in (2..u64::MAX >> 8).step_by(3_203_431_780_337) {
                let i = i.to_be_bytes();
                buf[1..8].copy_from_slice(&i[1..]);
                assert!(Decoder::decode(&buf).is_err()); // should never panic
                assert!(Decoder::decode_from_reader(Cursor::new(&buf)).is_err());
        }
    }

    #[test]
    fn stream() {
        let a = map(vec![(Value::from("a"), Value::Array(vec![Value::from(1i64), Value::Complex(2.5, -3.)])),
                         (Value::from(7i64), Value::from(vec![1u8, 2, 3]))]);
        let b = Value::from("bee");
        let mut buf = to_bytes(&a).unwrap();
        let first = buf.len();
        Encoder::encode(&b, &mut buf).unwrap();
        buf.push(0xff);
        let mut cursor = Cursor::new(buf);
        let (value, c) = Decoder::decode_from_reader(&mut cursor).unwrap();
        assert_eq!(a, value);
        assert_eq!(first, c);
        assert_eq!(first as u64, cursor.position());
        let (value, _) = Decoder::decode_from_reader(&mut cursor).unwrap();
        assert_eq!(b, value);
        assert_eq!(cursor.get_ref().len() as u64 - 1, cursor.position());
    }

    #[test]
    fn stream_errors() {
        let buf = to_bytes(&Value::Array(vec![Value::from("truncated")])).unwrap();
        for end in 0..buf.len() {
            let err = Decoder::decode_from_reader(Cursor::new(&buf[..end])).unwrap_err();
            assert_eq!(ErrorKind::Malformed, err.kind());
            assert!(matches!(Decoder::decode(&buf[..end]).unwrap_err().into_inner(), DecodeError::Eof));
        }
        let buf: [u8; 4] = [0xb1, 0x02, 0xc3, 0x28];
        assert!(matches!(Decoder::decode_from_reader(Cursor::new(&buf)).unwrap_err().into_inner(), DecodeError::Utf8(_)));
    }

    #[test]
    fn into_owned() {
        let buf = to_bytes(&Value::Array(vec![Value::from("s"), Value::from(&b"b"[..])])).unwrap();
        let owned: Value<'static> = Decoder::decode(&buf).unwrap().0.into_owned();
        drop(buf);
        assert_eq!(Value::Array(vec![Value::from("s"), Value::from(vec![b'b'])]), owned);
    }

    #[test]
    fn display() {
        let value = map(vec![
            (Value::from("k"), Value::Array(vec![Value::from(-3i64), Value::Float(1.), Value::Null])),
            (Value::from(vec![0xfbu8, 0xff]), Value::Complex(1., -2.)),
        ]);
        assert_eq!("{\"k\": [-3, 1.0, null], '+/8=': (1.0-2.0j)}", value.to_string());
    }

    #[test]
    fn tags() {
        assert_eq!(Tag::NegFloat, Value::Float(-3.).tag());
        assert_eq!(Tag::Int, Value::Int(Sign::Neg, BigUint::from(0u8)).tag());
        assert_eq!(Tag::NegInt, Value::from(-2i64).tag());
        assert!(Value::from(-1i64).is_sentinel());
        assert!(Value::Float(-1.).is_sentinel());
        assert!(!Value::Float(1.).is_sentinel());
    }

    fn assert_roundtrip(val: Value, buf: &mut Vec<u8>) {
        buf.clear();
        let c = Encoder::encode(&val, buf).unwrap();
        assert_eq!(c, buf.len());
        assert_eq!((val.clone(), c), Decoder::decode(buf).unwrap());
        assert_eq!((val.into_owned(), c), Decoder::decode_from_reader(Cursor::new(&buf[..])).unwrap());
    }

}
