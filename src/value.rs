//! The scalar type tag `T` and the tagged-union value `V` (named [`Type`]
//! and [`Value`] here). Implemented as a genuine tagged enum with accessor
//! helpers, per the crate's ownership note: a C-style union + separate tag
//! would throw away the compiler's exhaustiveness checking for no benefit
//! in a hosted (non-`no_std`) build.

use crate::error::{Error, Result};
use crate::limits::Limits;

/// One of the twelve scalar types a schema entry may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
    FStr,
}

impl Type {
    /// Parse a lowercase type tag, as it appears in the text schema
    /// grammar and in `Display`/error messages.
    pub fn from_tag(tag: &str) -> Option<Type> {
        Some(match tag {
            "u8" => Type::U8,
            "u16" => Type::U16,
            "u32" => Type::U32,
            "u64" => Type::U64,
            "i8" => Type::I8,
            "i16" => Type::I16,
            "i32" => Type::I32,
            "i64" => Type::I64,
            "f32" => Type::F32,
            "f64" => Type::F64,
            "str" => Type::Str,
            "fstr" => Type::FStr,
            _ => return None,
        })
    }

    /// The lowercase type tag used on the wire and in error messages.
    pub fn tag(self) -> &'static str {
        match self {
            Type::U8 => "u8",
            Type::U16 => "u16",
            Type::U32 => "u32",
            Type::U64 => "u64",
            Type::I8 => "i8",
            Type::I16 => "i16",
            Type::I32 => "i32",
            Type::I64 => "i64",
            Type::F32 => "f32",
            Type::F64 => "f64",
            Type::Str => "str",
            Type::FStr => "fstr",
        }
    }

    /// `true` for `str`/`fstr`: these types reserve a slot in the string
    /// pool rather than storing their payload inline in the value slot.
    pub fn is_string(self) -> bool {
        matches!(self, Type::Str | Type::FStr)
    }

    /// Maximum payload length in bytes for a string type, per the given
    /// limits. Panics if called on a non-string type (an internal misuse,
    /// never caller-triggerable).
    pub fn max_str_len(self, limits: &Limits) -> usize {
        match self {
            Type::Str => limits.str_max,
            Type::FStr => limits.fstr_max,
            _ => unreachable!("max_str_len on non-string type"),
        }
    }

    /// Per-entry string pool slot size: one length-prefix byte (the
    /// actual payload length, which always fits a `u8` since
    /// `max_str_len` never exceeds 255) plus the max payload length.
    pub fn pool_slot_len(self, limits: &Limits) -> usize {
        self.max_str_len(limits) + 1
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A typed value: either a borrowed string (for `str`/`fstr` entries) or
/// one of the ten numeric payloads. Strings borrow from whatever buffer
/// the caller supplied them in (an argument to `set`, or the context's
/// string pool on `get`) rather than being copied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value<'a> {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(&'a str),
    FStr(&'a str),
}

impl<'a> Value<'a> {
    /// The type tag this value carries.
    pub fn ty(&self) -> Type {
        match self {
            Value::U8(_) => Type::U8,
            Value::U16(_) => Type::U16,
            Value::U32(_) => Type::U32,
            Value::U64(_) => Type::U64,
            Value::I8(_) => Type::I8,
            Value::I16(_) => Type::I16,
            Value::I32(_) => Type::I32,
            Value::I64(_) => Type::I64,
            Value::F32(_) => Type::F32,
            Value::F64(_) => Type::F64,
            Value::Str(_) => Type::Str,
            Value::FStr(_) => Type::FStr,
        }
    }

    /// The string payload, if this is a `Str` or `FStr` value.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::Str(s) | Value::FStr(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload widened to `u64`, if this is any integer
    /// variant regardless of signedness (the bit pattern is sign-extended
    /// for signed types, matching [`Value::as_raw_bits`]).
    pub fn as_u64_bits(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v as u64),
            Value::U16(v) => Some(v as u64),
            Value::U32(v) => Some(v as u64),
            Value::U64(v) => Some(v),
            Value::I8(v) => Some(v as i64 as u64),
            Value::I16(v) => Some(v as i64 as u64),
            Value::I32(v) => Some(v as i64 as u64),
            Value::I64(v) => Some(v as u64),
            _ => None,
        }
    }

    /// Encode this value's non-string payload as the raw `u64` stored in a
    /// context's value slot. Strings are stored via the string pool
    /// instead and don't use this path; see [`crate::context::Context`].
    pub fn as_raw_bits(&self) -> u64 {
        match *self {
            Value::F32(v) => v.to_bits() as u64,
            Value::F64(v) => v.to_bits(),
            other => other.as_u64_bits().unwrap_or(0),
        }
    }

    /// Reconstruct a numeric value from its raw slot bits and a type tag.
    /// Returns `None` for `Str`/`FStr` (those are reconstructed from the
    /// string pool, not the value slot, by the caller).
    pub fn from_raw_bits(ty: Type, bits: u64) -> Option<Value<'static>> {
        Some(match ty {
            Type::U8 => Value::U8(bits as u8),
            Type::U16 => Value::U16(bits as u16),
            Type::U32 => Value::U32(bits as u32),
            Type::U64 => Value::U64(bits),
            Type::I8 => Value::I8(bits as i64 as i8),
            Type::I16 => Value::I16(bits as i64 as i16),
            Type::I32 => Value::I32(bits as i64 as i32),
            Type::I64 => Value::I64(bits as i64),
            Type::F32 => Value::F32(f32::from_bits(bits as u32)),
            Type::F64 => Value::F64(f64::from_bits(bits)),
            Type::Str | Type::FStr => return None,
        })
    }

    /// Check that this value's string payload (if any) fits within the
    /// given type's length limit. Non-string types always pass.
    pub fn check_str_len(&self, limits: &Limits) -> Result<()> {
        if let Some(s) = self.as_str() {
            let max = self.ty().max_str_len(limits);
            if s.len() > max {
                return Err(Error::StrTooLong {
                    max,
                    actual: s.len(),
                });
            }
        }
        Ok(())
    }
}
