use std::fmt::{Display, Formatter, self};

/// The coarse classification every error of this crate falls into.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// The value has no encoding rule, or the wire carries a type that can't be used where it was found
    Type,
    /// A map key was a container
    KeyType,
    /// The version byte names a protocol generation this implementation doesn't speak
    Version,
    /// The input is truncated, inconsistent or otherwise unusable
    Malformed,
}

#[derive(Debug)]
pub struct DecoderError {
    inner: DecodeError,
    at: usize,
}

impl DecoderError {
    pub fn into_inner(self) -> DecodeError {
        self.inner
    }

    /// The input position at which decoding gave up.
    pub fn position(&self) -> usize {
        self.at
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind()
    }
}

impl std::error::Error for DecoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
       Some(&self.inner)
    }
}

impl Display for DecoderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{} at input position {}", self.inner, self.at)
    }
}

#[derive(Debug)]
pub enum DecodeError {
    /// The input ended before the record did
    Eof,
    /// A nested record claims more bytes than its container has left
    Overrun { declared: u64, remaining: u64 },
    /// A map, float or complex payload ended in the middle of an entry
    Incomplete(&'static str),
    Utf8(std::str::Utf8Error),
    /// One of the reserved type tags 12 to 15
    Reserved(u8),
    UnexpectedTag { expected: &'static str, found: &'static str },
    IllegalKey(&'static str),
    Version(u8),
    /// A float payload which doesn't describe a finite number
    Float,
    Length(u64),
    Depth(usize),
    Io(std::io::Error),
}

impl DecodeError {
    pub fn at(self, at: usize) -> DecoderError {
        DecoderError { inner: self, at }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Reserved(_) | DecodeError::UnexpectedTag { .. } => ErrorKind::Type,
            DecodeError::IllegalKey(_) => ErrorKind::KeyType,
            DecodeError::Version(_) => ErrorKind::Version,
            _ => ErrorKind::Malformed,
        }
    }
}

impl From<std::str::Utf8Error> for DecodeError {
    fn from(e: std::str::Utf8Error) -> DecodeError {
        DecodeError::Utf8(e)
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(e: std::io::Error) -> DecodeError {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => DecodeError::Eof,
            _ => DecodeError::Io(e),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Utf8(e) => Some(e),
            DecodeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            DecodeError::Eof => f.write_str("Unexpected end of input while decoding"),
            DecodeError::Overrun { declared, remaining } => write!(f, "Nested record of {} bytes exceeds the {} bytes left in its container", declared, remaining),
            DecodeError::Incomplete(container) => write!(f, "Payload of {} ended in the middle of an entry", container),
            DecodeError::Utf8(e) => write!(f, "String slice was not valid Utf-8: {}", e),
            DecodeError::Reserved(tag) => write!(f, "Reserved type tag {:#x}", tag),
            DecodeError::UnexpectedTag { expected, found } => write!(f, "Expected {}, found {}", expected, found),
            DecodeError::IllegalKey(name) => write!(f, "Type {} is not allowed as a map key", name),
            DecodeError::Version(v) => write!(f, "Version {} is not compatible with {}", v, crate::version::CURRENT),
            DecodeError::Float => f.write_str("Float payload does not describe a finite number"),
            DecodeError::Length(value) => write!(f, "Length {} exceeds maximum {}", value, usize::MAX),
            DecodeError::Depth(max) => write!(f, "Nesting exceeds the maximum depth of {}", max),
            DecodeError::Io(e) => write!(f, "IO error {}", e),
        }
    }
}

#[derive(Debug)]
pub enum EncodeError {
    Io(std::io::Error),
    /// The payload is too long for a seven byte length field
    Length(u64),
    /// Infinity and NaN have no representation
    Float(f64),
    Depth(usize),
}

impl EncodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EncodeError::Float(_) => ErrorKind::Type,
            _ => ErrorKind::Malformed,
        }
    }
}

impl From<std::io::Error> for EncodeError {
    fn from(e: std::io::Error) -> EncodeError {
        EncodeError::Io(e)
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            EncodeError::Io(e) => write!(f, "IO error {}", e),
            EncodeError::Length(value) => write!(f, "Length {} exceeds maximum {}", value, crate::header::MAX_LENGTH),
            EncodeError::Float(value) => write!(f, "{} is not supported", value),
            EncodeError::Depth(max) => write!(f, "Nesting exceeds the maximum depth of {}", max),
        }
    }
}
