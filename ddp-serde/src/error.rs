use std;
use std::fmt::{self, Display};
use serde::{de, ser};
use ddp::{DecoderError, EncodeError, ErrorKind};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    // Decode
    Decode(DecoderError),
    Trailing(usize),
    UnexpectedType(&'static [&'static str], &'static str),
    Int,
    // Encode
    Encode(EncodeError),
    MissingKey,
    // Both
    Message(String),
}

impl Error {
    /// Classifies the error the same way the core crate does. Mismatches between the data and the target type count
    /// as malformed input.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Decode(e) => e.kind(),
            Error::Encode(e) => e.kind(),
            Error::Int | Error::MissingKey => ErrorKind::Type,
            _ => ErrorKind::Malformed,
        }
    }
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(msg) => fmt.write_str(msg),
            Error::Encode(e) => write!(fmt, "Encoding error: {}", e),
            Error::Decode(e) => write!(fmt, "Decoding error: {}", e),
            Error::Trailing(at) => write!(fmt, "Trailing bytes in input after position {}", at),
            Error::UnexpectedType(expected, actual) => write!(fmt, "Unexpected type: expected one of ({}), found {}", expected.join(", "), actual),
            Error::Int => fmt.write_str("Integer didn't fit into target type"),
            Error::MissingKey => fmt.write_str("Map value serialized without a key"),
        }
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Error {
        Error::Encode(e)
    }
}

impl From<DecoderError> for Error {
    fn from(e: DecoderError) -> Error {
        Error::Decode(e)
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(_e: std::num::TryFromIntError) -> Error {
        Error::Int
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            Error::Encode(e) => Some(e),
            _ => None,
        }
    }
}
