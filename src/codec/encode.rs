//! Shortest-form MessagePack encoders. Every encoder writes into the
//! caller's fixed-size buffer (a `&mut &mut [u8]` cursor) and advances it
//! past whatever it wrote, never growing or allocating a buffer itself.

use crate::error::{Error, Result};
use crate::marker::Marker;
use crate::value::Value;

fn put<'a>(buf: &mut &'a mut [u8], n: usize, step: &'static str) -> Result<&'a mut [u8]> {
    if buf.len() < n {
        return Err(Error::Encode { step });
    }
    let taken = std::mem::take(buf);
    let (head, rest) = taken.split_at_mut(n);
    *buf = rest;
    Ok(head)
}

/// Encode an unsigned integer in its shortest form.
pub fn encode_uint(buf: &mut &mut [u8], v: u64) -> Result<()> {
    if v <= 0x7f {
        put(buf, 1, "uint fixint")?[0] = Marker::PosFixInt(v as u8).into_u8();
    } else if v <= u8::MAX as u64 {
        let dst = put(buf, 2, "uint8")?;
        dst[0] = Marker::UInt8.into_u8();
        dst[1] = v as u8;
    } else if v <= u16::MAX as u64 {
        let dst = put(buf, 3, "uint16")?;
        dst[0] = Marker::UInt16.into_u8();
        dst[1..3].copy_from_slice(&(v as u16).to_be_bytes());
    } else if v <= u32::MAX as u64 {
        let dst = put(buf, 5, "uint32")?;
        dst[0] = Marker::UInt32.into_u8();
        dst[1..5].copy_from_slice(&(v as u32).to_be_bytes());
    } else {
        let dst = put(buf, 9, "uint64")?;
        dst[0] = Marker::UInt64.into_u8();
        dst[1..9].copy_from_slice(&v.to_be_bytes());
    }
    Ok(())
}

/// Encode a signed integer in its shortest form. Non-negative values are
/// delegated to [`encode_uint`], since the positive-fixint/uint family is
/// always shorter than the signed-int family for the same magnitude.
pub fn encode_int(buf: &mut &mut [u8], v: i64) -> Result<()> {
    if v >= 0 {
        return encode_uint(buf, v as u64);
    }
    if v >= -32 {
        put(buf, 1, "int negfixint")?[0] = Marker::NegFixInt(v as i8).into_u8();
    } else if v >= i8::MIN as i64 {
        let dst = put(buf, 2, "int8")?;
        dst[0] = Marker::Int8.into_u8();
        dst[1] = v as i8 as u8;
    } else if v >= i16::MIN as i64 {
        let dst = put(buf, 3, "int16")?;
        dst[0] = Marker::Int16.into_u8();
        dst[1..3].copy_from_slice(&(v as i16).to_be_bytes());
    } else if v >= i32::MIN as i64 {
        let dst = put(buf, 5, "int32")?;
        dst[0] = Marker::Int32.into_u8();
        dst[1..5].copy_from_slice(&(v as i32).to_be_bytes());
    } else {
        let dst = put(buf, 9, "int64")?;
        dst[0] = Marker::Int64.into_u8();
        dst[1..9].copy_from_slice(&v.to_be_bytes());
    }
    Ok(())
}

pub fn encode_f32(buf: &mut &mut [u8], v: f32) -> Result<()> {
    let dst = put(buf, 5, "f32")?;
    dst[0] = Marker::F32.into_u8();
    dst[1..5].copy_from_slice(&v.to_be_bytes());
    Ok(())
}

pub fn encode_f64(buf: &mut &mut [u8], v: f64) -> Result<()> {
    let dst = put(buf, 9, "f64")?;
    dst[0] = Marker::F64.into_u8();
    dst[1..9].copy_from_slice(&v.to_be_bytes());
    Ok(())
}

/// Encode a string in its shortest form. Fails if `s` exceeds what str16
/// can address (no schema-bound string ever does) or if the caller's
/// buffer is too small to hold the marker and payload.
pub fn encode_str(buf: &mut &mut [u8], s: &str) -> Result<()> {
    let len = s.len();
    let bytes = s.as_bytes();
    if len <= 31 {
        let dst = put(buf, 1 + len, "fixstr")?;
        dst[0] = Marker::FixStr(len as u8).into_u8();
        dst[1..].copy_from_slice(bytes);
    } else if len <= u8::MAX as usize {
        let dst = put(buf, 2 + len, "str8")?;
        dst[0] = Marker::Str8.into_u8();
        dst[1] = len as u8;
        dst[2..].copy_from_slice(bytes);
    } else if len <= u16::MAX as usize {
        let dst = put(buf, 3 + len, "str16")?;
        dst[0] = Marker::Str16.into_u8();
        dst[1..3].copy_from_slice(&(len as u16).to_be_bytes());
        dst[3..].copy_from_slice(bytes);
    } else {
        return Err(Error::Encode {
            step: "string exceeds str16 addressing",
        });
    }
    Ok(())
}

/// Encode a map header (key count, not byte count) in its shortest form.
pub fn encode_map_header(buf: &mut &mut [u8], len: usize) -> Result<()> {
    if len <= 15 {
        put(buf, 1, "fixmap header")?[0] = Marker::FixMap(len as u8).into_u8();
    } else if len <= u16::MAX as usize {
        let dst = put(buf, 3, "map16 header")?;
        dst[0] = Marker::Map16.into_u8();
        dst[1..3].copy_from_slice(&(len as u16).to_be_bytes());
    } else {
        return Err(Error::Encode {
            step: "map exceeds map16 addressing",
        });
    }
    Ok(())
}

/// Encode one scalar [`Value`] in its shortest form.
pub fn encode_value(buf: &mut &mut [u8], v: Value) -> Result<()> {
    match v {
        Value::U8(n) => encode_uint(buf, n as u64),
        Value::U16(n) => encode_uint(buf, n as u64),
        Value::U32(n) => encode_uint(buf, n as u64),
        Value::U64(n) => encode_uint(buf, n),
        Value::I8(n) => encode_int(buf, n as i64),
        Value::I16(n) => encode_int(buf, n as i64),
        Value::I32(n) => encode_int(buf, n as i64),
        Value::I64(n) => encode_int(buf, n),
        Value::F32(n) => encode_f32(buf, n),
        Value::F64(n) => encode_f64(buf, n),
        Value::Str(s) | Value::FStr(s) => encode_str(buf, s),
    }
}
