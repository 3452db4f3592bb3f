//! Conveniently serialize and deserialize your Rust data structures into the DDP wire format.
//!
//! # Two-step serialization
//!
//! Every DDP record announces the length of its payload before the payload itself, so a struct can't be streamed
//! field by field without knowing how much space its fields will take. Values are therefore first turned into a
//! [ddp::Value] by the [Serializer] and then encoded in one go. Deserialization goes the same way backwards: a message
//! is decoded into a `Value` first, which the [Deserializer] then walks.
//!
//! # Mapping
//!
//! * integers of any width become DDP integers; on the way back, a wire integer that doesn't fit the target type is
//!   an [Error::Int]
//! * `f32` and `f64` become floats, `char` and strings become strings and byte strings (see `serde_bytes`) become
//!   binary
//! * `None`, `()` and unit structs become null, `Some(v)` becomes `v`
//! * sequences, tuples and sets become arrays, maps and structs become maps
//! * unit variants become their name as a string, all other variants a map with the name as its only key
//! * a complex number on wire can be deserialized as a pair of floats
//!
//! # Examples
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Cat<'a> {
//!     name: &'a str,
//!     lives: u8,
//! }
//!
//! let cat = Cat { name: "Tom", lives: 9 };
//! let bytes = ddp_serde::to_bytes(&cat).unwrap();
//! assert_eq!(bytes, [
//!   0x03,                                 // Version 3
//!   0xd1, 0x15,                           // Map, 21 bytes of payload
//!     0xb1, 0x04,                         // String, 4 bytes of payload
//!       0x6e, 0x61, 0x6d, 0x65,           // 'name'
//!     0xb1, 0x03,                         // String, 3 bytes of payload
//!       0x54, 0x6f, 0x6d,                 // 'Tom'
//!     0xb1, 0x05,                         // String, 5 bytes of payload
//!       0x6c, 0x69, 0x76, 0x65, 0x73,     // 'lives'
//!     0x89, 0x01,                         // Integer, 1 byte of payload
//!       0x09,                             // 9
//! ]);
//!
//! let deserialized: Cat = ddp_serde::from_bytes(&bytes).unwrap();
//! assert_eq!(cat, deserialized);
//! ```

mod de;
mod error;
mod ser;

pub use de::{from_bytes, from_reader, from_value, Deserializer};
pub use error::{Error, Result};
pub use ser::{to_bytes, to_value, to_writer, Serializer};
