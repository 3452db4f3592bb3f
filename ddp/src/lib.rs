//! All encoding functions take a value and a writer and return the amount of written bytes. All decoding functions
//! take a buffer or a reader and return the value and the number of consumed bytes.
//!
//! # Records
//!
//! Every value is written as a self-delimiting record: an optional version byte, a header byte holding the type tag
//! and the width of the length field, the length field itself and finally the payload. Maps, arrays, floats and
//! complex numbers nest further records in their payload. See the [header] module for the bit layout.
//!
//! # Streams
//!
//! Since a record announces its length before its payload, [Decoder::decode_from_reader] can pull exactly one
//! record off a socket, issuing one exact-size read per field, without consuming anything that follows it.
//!
//! # A note on `usize`
//!
//! Payload lengths on wire are unsigned integers of up to seven bytes. Rust however uses the architecture-dependent
//! `usize` for slice indexing. On architectures where `usize` is smaller, some valid messages can not be decoded and
//! a `DecodeError::Length` will be raised.
//!
//! # A note on integers
//!
//! Integers carry their magnitude as a [BigUint] next to a [Sign], so integers of any size survive the trip. Use
//! `ToPrimitive` from `num-traits` or `TryFrom` to narrow them down to machine integers.
//!
//! # A note on Maps
//!
//! The variant `Value::Map` uses a `Vec` of key-value pairs internally because `f64` implements neither `Ord` nor
//! `Hash` and a map has to keep its insertion order anyway.
//!
//! # Examples
//!
//! ```
//! use ddp::Value;
//! use ddp::{Decoder, Encoder};
//! use std::borrow::Cow;
//!
//! let mut buf = Vec::new();
//! let value = Value::Map(vec![(Value::Str(Cow::Borrowed("a")), Value::from(1u64))]);
//! Encoder::encode(&value, &mut buf).unwrap();
//! assert_eq!(buf, [
//!     0x03, // Version 3
//!     0xd1, // Map, length in one byte
//!     0x06, // 6 bytes of payload
//!     0xb1, // String, length in one byte
//!     0x01, // 1 byte of payload
//!     0x61, // 'a'
//!     0x89, // Integer, length in one byte
//!     0x01, // 1 byte of payload
//!     0x01, // 1
//! ]);
//! let decoded = Decoder::decode(&buf).unwrap();
//! assert_eq!(value, decoded.0);
//! assert_eq!(9, decoded.1);
//! ```

mod error;
mod float;
pub mod header;
mod read;
mod value;
mod varint;
pub mod version;

pub use num_bigint::BigUint;
pub use error::*;
pub use header::Tag;
pub use read::{IoRead, Read, SliceRead};
pub use value::*;

/// How deep containers may be nested unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 128;
