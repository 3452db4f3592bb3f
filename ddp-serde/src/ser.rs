use serde::{ser, Serialize};
use ddp::{Encoder, Value};
use std::borrow::Cow;
use std::io::Write;

use crate::error::{Error, Result};

/// Turns any `Serialize` type into a DDP [Value]. The value is encoded in a second step since every record needs to
/// know the length of its payload before the payload is written.
pub struct Serializer;

pub fn to_value<T: ?Sized + Serialize>(value: &T) -> Result<Value<'static>> {
    value.serialize(Serializer)
}

pub fn to_bytes<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(ddp::to_bytes(&to_value(value)?)?)
}

pub fn to_writer<T: ?Sized + Serialize, W: Write>(mut writer: W, value: &T) -> Result<()> {
    Encoder::encode(&to_value(value)?, &mut writer)?;
    Ok(())
}

/// Externally tagged enum variants: a map with the variant name as its only key.
fn variant(name: &'static str, content: Value<'static>) -> Value<'static> {
    Value::Map(vec![(Value::Str(Cow::Borrowed(name)), content)])
}

impl ser::Serializer for Serializer {

    type Ok = Value<'static>;
    type Error = Error;
    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Value<'static>> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value<'static>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value<'static>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value<'static>> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value<'static>> {
        Ok(Value::from(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value<'static>> {
        Ok(Value::from(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value<'static>> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value<'static>> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value<'static>> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value<'static>> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value<'static>> {
        Ok(Value::from(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value<'static>> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value<'static>> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value<'static>> {
        Ok(Value::Str(Cow::Owned(v.to_string())))
    }

    fn serialize_str(self, v: &str) -> Result<Value<'static>> {
        Ok(Value::Str(Cow::Owned(v.to_owned())))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value<'static>> {
        Ok(Value::Bytes(Cow::Owned(v.to_vec())))
    }

    fn serialize_none(self) -> Result<Value<'static>> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value<'static>> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value<'static>> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value<'static>> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str) -> Result<Value<'static>> {
        Ok(Value::Str(Cow::Borrowed(variant)))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<Value<'static>> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(self, _name: &'static str, _index: u32, variant: &'static str, value: &T) -> Result<Value<'static>> {
        Ok(self::variant(variant, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec { elements: Vec::with_capacity(len.unwrap_or(0)), variant: None })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(self, _name: &'static str, _index: u32, variant: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec { elements: Vec::with_capacity(len), variant: Some(variant) })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap { entries: Vec::with_capacity(len.unwrap_or(0)), key: None, variant: None })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(self, _name: &'static str, _index: u32, variant: &'static str, len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap { entries: Vec::with_capacity(len), key: None, variant: Some(variant) })
    }

}

pub struct SerializeVec {
    elements: Vec<Value<'static>>,
    variant: Option<&'static str>,
}

impl SerializeVec {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.elements.push(value.serialize(Serializer)?);
        Ok(())
    }

    fn finish(self) -> Value<'static> {
        match self.variant {
            Some(name) => variant(name, Value::Array(self.elements)),
            None => Value::Array(self.elements),
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value<'static>> {
        Ok(self.finish())
    }

}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value<'static>> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value<'static>> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value<'static>> {
        Ok(self.finish())
    }
}

pub struct SerializeMap {
    entries: Vec<(Value<'static>, Value<'static>)>,
    key: Option<Value<'static>>,
    variant: Option<&'static str>,
}

impl SerializeMap {
    fn field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.entries.push((Value::Str(Cow::Borrowed(key)), value.serialize(Serializer)?));
        Ok(())
    }

    fn finish(self) -> Value<'static> {
        match self.variant {
            Some(name) => variant(name, Value::Map(self.entries)),
            None => Value::Map(self.entries),
        }
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        self.key = Some(key.serialize(Serializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self.key.take().ok_or(Error::MissingKey)?;
        self.entries.push((key, value.serialize(Serializer)?));
        Ok(())
    }

    fn end(self) -> Result<Value<'static>> {
        Ok(self.finish())
    }

}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.field(key, value)
    }

    fn end(self) -> Result<Value<'static>> {
        Ok(self.finish())
    }

}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Value<'static>;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.field(key, value)
    }

    fn end(self) -> Result<Value<'static>> {
        Ok(self.finish())
    }

}
