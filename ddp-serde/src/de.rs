use serde::de::{self, DeserializeOwned, DeserializeSeed, EnumAccess, MapAccess, SeqAccess, Unexpected, VariantAccess, Visitor};
use serde::Deserialize;
use ddp::{Decoder, Sign, Value};
use std::borrow::Cow;
use std::convert::TryInto;
use std::io;

use crate::error::{Error, Result};

/// Drives a `Deserialize` implementation from a decoded [Value]. Strings and byte strings which still borrow from the
/// input are handed to the visitor as borrowed, so `&str` fields work with [from_bytes].
pub struct Deserializer<'de> {
    value: Value<'de>,
}

impl<'de> Deserializer<'de> {
    pub fn new(value: Value<'de>) -> Self {
        Deserializer { value }
    }
}

/// Decodes exactly one message. Anything left over after the first record counts as an error.
pub fn from_bytes<'a, T: Deserialize<'a>>(s: &'a [u8]) -> Result<T> {
    let (value, c) = Decoder::decode(s)?;
    if c < s.len() {
        return Err(Error::Trailing(c));
    }
    from_value(value)
}

/// Pulls one message off `reader`. Bytes behind it stay in the reader.
pub fn from_reader<R: io::Read, T: DeserializeOwned>(reader: R) -> Result<T> {
    let (value, _) = Decoder::decode_from_reader(reader)?;
    from_value(value)
}

pub fn from_value<'de, T: Deserialize<'de>>(value: Value<'de>) -> Result<T> {
    T::deserialize(Deserializer::new(value))
}

impl<'de> Deserializer<'de> {

    /// Integers of any size arrive here, the serde data model ends at 128 bits.
    #[inline]
    fn int(self) -> Result<i128> {
        match self.value {
            Value::Int(Sign::Pos, v) => i128::try_from(&v).map_err(|_| Error::Int),
            Value::Int(Sign::Neg, v) => match u128::try_from(&v) {
                Ok(m) if m <= i128::MIN.unsigned_abs() => Ok((m as i128).wrapping_neg()),
                _ => Err(Error::Int),
            },
            o => Err(Error::UnexpectedType(&["integer"], o.typename())),
        }
    }

    #[inline]
    fn float(self) -> Result<f64> {
        match self.value {
            Value::Float(v) => Ok(v),
            o => Err(Error::UnexpectedType(&["float"], o.typename())),
        }
    }

    fn string(self) -> Result<Cow<'de, str>> {
        match self.value {
            Value::Str(v) => Ok(v),
            o => Err(Error::UnexpectedType(&["string"], o.typename())),
        }
    }

}

fn visit_str<'de, V: Visitor<'de>>(v: Cow<'de, str>, visitor: V) -> Result<V::Value> {
    match v {
        Cow::Borrowed(s) => visitor.visit_borrowed_str(s),
        Cow::Owned(s) => visitor.visit_string(s),
    }
}

fn visit_bytes<'de, V: Visitor<'de>>(v: Cow<'de, [u8]>, visitor: V) -> Result<V::Value> {
    match v {
        Cow::Borrowed(b) => visitor.visit_borrowed_bytes(b),
        Cow::Owned(b) => visitor.visit_byte_buf(b),
    }
}

fn visit_array<'de, V: Visitor<'de>>(elements: Vec<Value<'de>>, visitor: V) -> Result<V::Value> {
    let len = elements.len();
    let mut seq = SeqDeserializer::new(elements);
    let value = visitor.visit_seq(&mut seq)?;
    if seq.iter.len() == 0 {
        Ok(value)
    } else {
        Err(de::Error::invalid_length(len, &"fewer elements in array"))
    }
}

fn visit_map<'de, V: Visitor<'de>>(entries: Vec<(Value<'de>, Value<'de>)>, visitor: V) -> Result<V::Value> {
    let len = entries.len();
    let mut map = MapDeserializer::new(entries);
    let value = visitor.visit_map(&mut map)?;
    if map.iter.len() == 0 {
        Ok(value)
    } else {
        Err(de::Error::invalid_length(len, &"fewer entries in map"))
    }
}

/// Complex numbers have no counterpart in the serde data model and show up as a pair of floats.
fn complex(re: f64, im: f64) -> Vec<Value<'static>> {
    vec![Value::Float(re), Value::Float(im)]
}

impl<'de> de::Deserializer<'de> for Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(v) => visitor.visit_bool(v),
            Value::Bytes(v) => visit_bytes(v, visitor),
            Value::Int(Sign::Pos, v) => match u64::try_from(&v) {
                Ok(u) => visitor.visit_u64(u),
                Err(_) => visitor.visit_u128(u128::try_from(&v).map_err(|_| Error::Int)?),
            },
            Value::Int(Sign::Neg, v) => {
                let i = Deserializer::new(Value::Int(Sign::Neg, v)).int()?;
                match i64::try_from(i) {
                    Ok(i) => visitor.visit_i64(i),
                    Err(_) => visitor.visit_i128(i),
                }
            },
            Value::Float(v) => visitor.visit_f64(v),
            Value::Complex(re, im) => visit_array(complex(re, im), visitor),
            Value::Str(v) => visit_str(v, visitor),
            Value::Map(v) => visit_map(v, visitor),
            Value::Array(v) => visit_array(v, visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Bool(v) => visitor.visit_bool(v),
            o => Err(Error::UnexpectedType(&["bool"], o.typename())),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i8(self.int()?.try_into()?)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i16(self.int()?.try_into()?)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i32(self.int()?.try_into()?)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i64(self.int()?.try_into()?)
    }

    fn deserialize_i128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_i128(self.int()?)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u8(self.int()?.try_into()?)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u16(self.int()?.try_into()?)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u32(self.int()?.try_into()?)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_u64(self.int()?.try_into()?)
    }

    fn deserialize_u128<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Int(Sign::Pos, v) => visitor.visit_u128(u128::try_from(&v).map_err(|_| Error::Int)?),
            _ => visitor.visit_u128(self.int()?.try_into()?),
        }
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f32(self.float()? as f32)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f64(self.float()?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let v = self.string()?;
        let mut chars = v.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(de::Error::invalid_value(Unexpected::Str(&v), &"a single character")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visit_str(self.string()?, visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Bytes(v) => visit_bytes(v, visitor),
            o => Err(Error::UnexpectedType(&["bytes"], o.typename())),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Bytes(v) => visitor.visit_byte_buf(v.into_owned()),
            Value::Array(v) => {
                let mut bytes = Vec::with_capacity(v.len());
                for element in v {
                    bytes.push(Deserializer::new(element).int()?.try_into()?);
                }
                visitor.visit_byte_buf(bytes)
            },
            o => Err(Error::UnexpectedType(&["bytes", "array"], o.typename())),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            o => Err(Error::UnexpectedType(&["null"], o.typename())),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Array(v) => visit_array(v, visitor),
            Value::Complex(re, im) => visit_array(complex(re, im), visitor),
            o => Err(Error::UnexpectedType(&["array", "complex"], o.typename())),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(self, _name: &'static str, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Map(v) => visit_map(v, visitor),
            o => Err(Error::UnexpectedType(&["map"], o.typename())),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(self, _name: &'static str, _fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(self, _name: &'static str, _variants: &'static [&'static str],  visitor: V) -> Result<V::Value> {
        match self.value {
            Value::Str(v) => visitor.visit_enum(EnumDeserializer::new(Value::Str(v), None)),
            Value::Map(mut v) if v.len() == 1 => {
                let (variant, content) = v.remove(0);
                visitor.visit_enum(EnumDeserializer::new(variant, Some(content)))
            },
            o => Err(Error::UnexpectedType(&["string", "map"], o.typename())),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

}

struct MapDeserializer<'de> {
    iter: std::vec::IntoIter<(Value<'de>, Value<'de>)>,
    value: Option<Value<'de>>,
}

impl<'de> MapDeserializer<'de> {
    fn new(entries: Vec<(Value<'de>, Value<'de>)>) -> Self {
        Self { iter: entries.into_iter(), value: None }
    }
}

impl<'de> MapAccess<'de> for MapDeserializer<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(Deserializer::new(key)).map(Some)
            },
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        match self.value.take() {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(de::Error::custom("value is missing")),
        }
    }

    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer<'de> {
    variant: Value<'de>,
    content: Option<Value<'de>>,
}

impl<'de> EnumDeserializer<'de> {
    fn new(variant: Value<'de>, content: Option<Value<'de>>) -> Self {
        Self { variant, content }
    }
}

impl<'de> EnumAccess<'de> for EnumDeserializer<'de> {
    type Error = Error;
    type Variant = VariantDeserializer<'de>;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant = seed.deserialize(Deserializer::new(self.variant))?;
        Ok((variant, VariantDeserializer { content: self.content }))
    }
}

struct VariantDeserializer<'de> {
    content: Option<Value<'de>>,
}

impl<'de> VariantAccess<'de> for VariantDeserializer<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.content {
            None | Some(Value::Null) => Ok(()),
            Some(o) => Err(Error::UnexpectedType(&["null"], o.typename())),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        match self.content {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(de::Error::invalid_type(Unexpected::UnitVariant, &"newtype variant")),
        }
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        match self.content {
            Some(value) => de::Deserializer::deserialize_seq(Deserializer::new(value), visitor),
            None => Err(de::Error::invalid_type(Unexpected::UnitVariant, &"tuple variant")),
        }
    }

    fn struct_variant<V: Visitor<'de>>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        match self.content {
            Some(value) => de::Deserializer::deserialize_map(Deserializer::new(value), visitor),
            None => Err(de::Error::invalid_type(Unexpected::UnitVariant, &"struct variant")),
        }
    }

}

struct SeqDeserializer<'de> {
    iter: std::vec::IntoIter<Value<'de>>,
}

impl<'de> SeqDeserializer<'de> {
    fn new(elements: Vec<Value<'de>>) -> Self {
        Self { iter: elements.into_iter() }
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer<'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        match self.iter.next() {
            Some(value) => seed.deserialize(Deserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    #[inline]
    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}
