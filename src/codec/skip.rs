//! Generic, bounded-stack skipping of arbitrary MessagePack values. Used
//! by [`crate::page::pagein`] to step over map values whose target entry
//! was removed, and able to walk containers this crate never emits
//! itself (bin, ext, array, str32, map32) since a page may be decoded by
//! a different version of this crate than encoded it.

use byteorder::{BigEndian, ByteOrder};

use crate::depth_tracking::DepthTracker;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::marker::Marker;

fn take<'a>(buf: &mut &'a [u8], n: usize, step: &'static str) -> Result<&'a [u8]> {
    if buf.len() < n {
        return Err(Error::Decode { step });
    }
    let (head, rest) = buf.split_at(n);
    *buf = rest;
    Ok(head)
}

/// Number of child elements a just-read value owns, per
/// [`DepthTracker::consume`]: 0 for scalars and strings, `len` for an
/// array, `2 * len` for a map (key and value per entry).
fn skip_one(buf: &mut &[u8]) -> Result<u32> {
    let marker = read_raw_marker(buf)?;
    match marker {
        Marker::PosFixInt(_) | Marker::NegFixInt(_) | Marker::Null | Marker::False | Marker::True => {
            Ok(0)
        }
        Marker::UInt8 | Marker::Int8 => {
            take(buf, 1, "skip 1-byte scalar")?;
            Ok(0)
        }
        Marker::UInt16 | Marker::Int16 => {
            take(buf, 2, "skip 2-byte scalar")?;
            Ok(0)
        }
        Marker::UInt32 | Marker::Int32 | Marker::F32 => {
            take(buf, 4, "skip 4-byte scalar")?;
            Ok(0)
        }
        Marker::UInt64 | Marker::Int64 | Marker::F64 => {
            take(buf, 8, "skip 8-byte scalar")?;
            Ok(0)
        }
        Marker::FixStr(len) => {
            take(buf, len as usize, "skip fixstr payload")?;
            Ok(0)
        }
        Marker::Str8 => {
            let len = take(buf, 1, "skip str8 length")?[0] as usize;
            take(buf, len, "skip str8 payload")?;
            Ok(0)
        }
        Marker::Str16 => {
            let len = BigEndian::read_u16(take(buf, 2, "skip str16 length")?) as usize;
            take(buf, len, "skip str16 payload")?;
            Ok(0)
        }
        Marker::FixMap(len) => Ok(2 * len as u32),
        Marker::Map16 => {
            let len = BigEndian::read_u16(take(buf, 2, "skip map16 length")?) as u32;
            Ok(2 * len)
        }
        Marker::Other(b) => skip_other(buf, b),
    }
}

/// Handle the format bytes this crate never emits but must still step
/// over: bin8/16/32, ext8/16/32, fixarray, array16/32, str32, map32.
fn skip_other(buf: &mut &[u8], b: u8) -> Result<u32> {
    match b {
        0x90..=0x9f => Ok((b & 0x0f) as u32),
        0xc4 => {
            let len = take(buf, 1, "skip bin8 length")?[0] as usize;
            take(buf, len, "skip bin8 payload")?;
            Ok(0)
        }
        0xc5 => {
            let len = BigEndian::read_u16(take(buf, 2, "skip bin16 length")?) as usize;
            take(buf, len, "skip bin16 payload")?;
            Ok(0)
        }
        0xc6 => {
            let len = BigEndian::read_u32(take(buf, 4, "skip bin32 length")?) as usize;
            take(buf, len, "skip bin32 payload")?;
            Ok(0)
        }
        0xc7 => {
            let len = take(buf, 1, "skip ext8 length")?[0] as usize;
            take(buf, 1 + len, "skip ext8 payload")?;
            Ok(0)
        }
        0xc8 => {
            let len = BigEndian::read_u16(take(buf, 2, "skip ext16 length")?) as usize;
            take(buf, 1 + len, "skip ext16 payload")?;
            Ok(0)
        }
        0xc9 => {
            let len = BigEndian::read_u32(take(buf, 4, "skip ext32 length")?) as usize;
            take(buf, 1 + len, "skip ext32 payload")?;
            Ok(0)
        }
        0xdb => {
            let len = BigEndian::read_u32(take(buf, 4, "skip str32 length")?) as usize;
            take(buf, len, "skip str32 payload")?;
            Ok(0)
        }
        0xdc => Ok(BigEndian::read_u16(take(buf, 2, "skip array16 length")?) as u32),
        0xdd => Ok(BigEndian::read_u32(take(buf, 4, "skip array32 length")?)),
        0xdf => Ok(2 * BigEndian::read_u32(take(buf, 4, "skip map32 length")?)),
        _ => Err(Error::Decode {
            step: "unrecognized format byte",
        }),
    }
}

fn read_raw_marker(buf: &mut &[u8]) -> Result<Marker> {
    let b = take(buf, 1, "marker")?[0];
    Ok(Marker::from_u8(b))
}

/// Step the cursor past one complete value (scalar or container, to
/// arbitrary nesting up to `limits.skip_max_depth`) without interpreting
/// its contents.
pub fn skip_value(buf: &mut &[u8], limits: &Limits) -> Result<()> {
    let mut depth = DepthTracker::new(limits.skip_max_depth);
    loop {
        let children = skip_one(buf)?;
        depth.consume(children)?;
        if depth.done() {
            return Ok(());
        }
    }
}
