//! MessagePack format-byte markers used by the wire codec. Internal only.

/// The subset of MessagePack format bytes this crate's wire codec needs:
/// positive/negative fixint, the sized uint/int forms, f32/f64, fixstr /
/// str8 / str16, and fixmap / map16. Anything else observed on the wire
/// (bin, ext, array, str32, map32, ...) is still recognized by
/// [`Marker::from_u8`] so the generic skipper can step over foreign
/// MessagePack produced by other encoders, even though this crate never
/// emits those forms itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    PosFixInt(u8),
    NegFixInt(i8),
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    F32,
    F64,
    FixStr(u8),
    Str8,
    Str16,
    FixMap(u8),
    Map16,
    Null,
    False,
    True,
    /// A format byte this crate doesn't produce but must still be able to
    /// skip: bin8/16/32, ext8/16/32, fixarray, array16/32, str32, map32.
    Other(u8),
}

impl Marker {
    /// Construct a marker from a single format byte.
    pub fn from_u8(n: u8) -> Marker {
        match n {
            0x00..=0x7f => Marker::PosFixInt(n),
            0x80..=0x8f => Marker::FixMap(n & 0x0f),
            0xa0..=0xbf => Marker::FixStr(n & 0x1f),
            0xc0 => Marker::Null,
            0xc2 => Marker::False,
            0xc3 => Marker::True,
            0xca => Marker::F32,
            0xcb => Marker::F64,
            0xcc => Marker::UInt8,
            0xcd => Marker::UInt16,
            0xce => Marker::UInt32,
            0xcf => Marker::UInt64,
            0xd0 => Marker::Int8,
            0xd1 => Marker::Int16,
            0xd2 => Marker::Int32,
            0xd3 => Marker::Int64,
            0xd9 => Marker::Str8,
            0xda => Marker::Str16,
            0xde => Marker::Map16,
            0xe0..=0xff => Marker::NegFixInt(n as i8),
            other => Marker::Other(other),
        }
    }

    /// Convert a marker back into its format byte.
    pub fn into_u8(self) -> u8 {
        match self {
            Marker::PosFixInt(v) => v,
            Marker::NegFixInt(v) => v as u8,
            Marker::UInt8 => 0xcc,
            Marker::UInt16 => 0xcd,
            Marker::UInt32 => 0xce,
            Marker::UInt64 => 0xcf,
            Marker::Int8 => 0xd0,
            Marker::Int16 => 0xd1,
            Marker::Int32 => 0xd2,
            Marker::Int64 => 0xd3,
            Marker::F32 => 0xca,
            Marker::F64 => 0xcb,
            Marker::FixStr(len) => 0xa0 | len,
            Marker::Str8 => 0xd9,
            Marker::Str16 => 0xda,
            Marker::FixMap(len) => 0x80 | len,
            Marker::Map16 => 0xde,
            Marker::Null => 0xc0,
            Marker::False => 0xc2,
            Marker::True => 0xc3,
            Marker::Other(b) => b,
        }
    }
}

impl From<u8> for Marker {
    fn from(val: u8) -> Marker {
        Marker::from_u8(val)
    }
}

impl From<Marker> for u8 {
    fn from(val: Marker) -> u8 {
        val.into_u8()
    }
}
