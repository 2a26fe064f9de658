//! MessagePack scalar decoders. Every decoder advances the caller's
//! cursor (a `&mut &[u8]`) past whatever it consumed, borrowing strings
//! directly out of the input rather than copying them.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::marker::Marker;
use crate::value::Type;

fn take<'a>(buf: &mut &'a [u8], n: usize, step: &'static str) -> Result<&'a [u8]> {
    if buf.len() < n {
        return Err(Error::Decode { step });
    }
    let (head, rest) = buf.split_at(n);
    *buf = rest;
    Ok(head)
}

/// Read one format byte and advance past it.
pub fn read_marker(buf: &mut &[u8]) -> Result<Marker> {
    let b = take(buf, 1, "marker")?[0];
    Ok(Marker::from_u8(b))
}

/// Read one format byte without advancing.
pub fn peek_marker(buf: &[u8]) -> Result<Marker> {
    buf.first()
        .map(|&b| Marker::from_u8(b))
        .ok_or(Error::Decode { step: "peek marker" })
}

/// A scalar value as it appears on the wire: its detected wire type (one
/// of the twelve [`Type`] variants, determined by the format byte used
/// for numbers and by payload length for strings) plus its raw payload.
pub struct WireValue<'a> {
    pub ty: Type,
    pub payload: WirePayload<'a>,
}

pub enum WirePayload<'a> {
    /// Canonical bit pattern: the numeric value widened to `u64` (signed
    /// values sign-extended, floats via `to_bits()`), matching
    /// [`crate::value::Value::as_raw_bits`].
    Bits(u64),
    Str(&'a str),
}

fn decode_str<'a>(buf: &mut &'a [u8], len: usize, limits: &Limits) -> Result<(Type, &'a str)> {
    if len > limits.str_max {
        return Err(Error::StrTooLong {
            max: limits.str_max,
            actual: len,
        });
    }
    let raw = take(buf, len, "string payload")?;
    let s = std::str::from_utf8(raw).map_err(|_| Error::Decode {
        step: "string payload is not valid utf-8",
    })?;
    let ty = if len <= limits.fstr_max {
        Type::FStr
    } else {
        Type::Str
    };
    Ok((ty, s))
}

/// Decode one scalar value, classifying its wire type from the format
/// byte (numbers) or decoded length (strings).
pub fn decode_value<'a>(buf: &mut &'a [u8], limits: &Limits) -> Result<WireValue<'a>> {
    let marker = read_marker(buf)?;
    let (ty, payload) = match marker {
        Marker::PosFixInt(v) => (Type::U8, WirePayload::Bits(v as u64)),
        Marker::UInt8 => (Type::U8, WirePayload::Bits(take(buf, 1, "u8")?[0] as u64)),
        Marker::UInt16 => (
            Type::U16,
            WirePayload::Bits(BigEndian::read_u16(take(buf, 2, "u16")?) as u64),
        ),
        Marker::UInt32 => (
            Type::U32,
            WirePayload::Bits(BigEndian::read_u32(take(buf, 4, "u32")?) as u64),
        ),
        Marker::UInt64 => (
            Type::U64,
            WirePayload::Bits(BigEndian::read_u64(take(buf, 8, "u64")?)),
        ),
        Marker::NegFixInt(v) => (Type::I8, WirePayload::Bits(v as i64 as u64)),
        Marker::Int8 => (
            Type::I8,
            WirePayload::Bits(take(buf, 1, "i8")?[0] as i8 as i64 as u64),
        ),
        Marker::Int16 => (
            Type::I16,
            WirePayload::Bits(BigEndian::read_i16(take(buf, 2, "i16")?) as i64 as u64),
        ),
        Marker::Int32 => (
            Type::I32,
            WirePayload::Bits(BigEndian::read_i32(take(buf, 4, "i32")?) as i64 as u64),
        ),
        Marker::Int64 => (
            Type::I64,
            WirePayload::Bits(BigEndian::read_i64(take(buf, 8, "i64")?) as u64),
        ),
        Marker::F32 => (
            Type::F32,
            WirePayload::Bits(BigEndian::read_u32(take(buf, 4, "f32")?) as u64),
        ),
        Marker::F64 => (
            Type::F64,
            WirePayload::Bits(BigEndian::read_u64(take(buf, 8, "f64")?)),
        ),
        Marker::FixStr(len) => {
            let (ty, s) = decode_str(buf, len as usize, limits)?;
            (ty, WirePayload::Str(s))
        }
        Marker::Str8 => {
            let len = take(buf, 1, "str8 length")?[0] as usize;
            let (ty, s) = decode_str(buf, len, limits)?;
            (ty, WirePayload::Str(s))
        }
        Marker::Str16 => {
            let len = BigEndian::read_u16(take(buf, 2, "str16 length")?) as usize;
            let (ty, s) = decode_str(buf, len, limits)?;
            (ty, WirePayload::Str(s))
        }
        _ => {
            return Err(Error::Decode {
                step: "expected a scalar value",
            })
        }
    };
    Ok(WireValue { ty, payload })
}

/// Decode a map header, returning the number of key/value pairs.
pub fn decode_map_header(buf: &mut &[u8]) -> Result<usize> {
    match read_marker(buf)? {
        Marker::FixMap(len) => Ok(len as usize),
        Marker::Map16 => Ok(BigEndian::read_u16(take(buf, 2, "map16 length")?) as usize),
        _ => Err(Error::Decode {
            step: "expected a map header",
        }),
    }
}
