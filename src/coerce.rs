//! The type coercion matrix: which wire type may load into which schema
//! type, and the runtime conversion of an accepted pair's bits.
//!
//! Row and column order matches [`Type`]'s declaration order exactly, so
//! the matrix below can be read directly against the twelve-by-twelve
//! table it implements: unsigned widening is always permitted;
//! unsigned-to-signed is permitted when the value fits; signed-to-unsigned
//! is never permitted; floats widen `f32` -> `f64` only; `fstr` loads into
//! `str`, but `str` never narrows into `fstr`.

use crate::error::{Error, Result};
use crate::value::Type;

const N: usize = 12;

fn ord(ty: Type) -> usize {
    match ty {
        Type::U8 => 0,
        Type::U16 => 1,
        Type::U32 => 2,
        Type::U64 => 3,
        Type::I8 => 4,
        Type::I16 => 5,
        Type::I32 => 6,
        Type::I64 => 7,
        Type::F32 => 8,
        Type::F64 => 9,
        Type::Str => 10,
        Type::FStr => 11,
    }
}

#[rustfmt::skip]
const TABLE: [[bool; N]; N] = [
    // to:   u8     u16    u32    u64    i8     i16    i32    i64    f32    f64    str    fstr
    /*u8  */[true,  true,  true,  true,  true,  true,  true,  true,  false, false, false, false],
    /*u16 */[false, true,  true,  true,  false, true,  true,  true,  false, false, false, false],
    /*u32 */[false, false, true,  true,  false, false, true,  true,  false, false, false, false],
    /*u64 */[false, false, false, true,  false, false, false, true,  false, false, false, false],
    /*i8  */[false, false, false, false, true,  true,  true,  true,  false, false, false, false],
    /*i16 */[false, false, false, false, false, true,  true,  true,  false, false, false, false],
    /*i32 */[false, false, false, false, false, false, true,  true,  false, false, false, false],
    /*i64 */[false, false, false, false, false, false, false, true,  false, false, false, false],
    /*f32 */[false, false, false, false, false, false, false, false, true,  true,  false, false],
    /*f64 */[false, false, false, false, false, false, false, false, false, true,  false, false],
    /*str */[false, false, false, false, false, false, false, false, false, false, true,  false],
    /*fstr*/[false, false, false, false, false, false, false, false, false, false, true,  true ],
];

/// Whether a value whose wire type is `from` is permitted, at the type
/// level, to load into a schema entry of type `to`. Doesn't check
/// whether a specific value actually fits; see [`coerce_numeric`] for
/// the runtime bounds check unsigned-to-signed transitions still need.
pub fn type_coercible(from: Type, to: Type) -> bool {
    TABLE[ord(from)][ord(to)]
}

fn unsigned_rank(ty: Type) -> Option<u8> {
    match ty {
        Type::U8 => Some(1),
        Type::U16 => Some(2),
        Type::U32 => Some(3),
        Type::U64 => Some(4),
        _ => None,
    }
}

fn signed_rank(ty: Type) -> Option<u8> {
    match ty {
        Type::I8 => Some(1),
        Type::I16 => Some(2),
        Type::I32 => Some(3),
        Type::I64 => Some(4),
        _ => None,
    }
}

fn signed_max(ty: Type) -> u64 {
    match ty {
        Type::I8 => i8::MAX as u64,
        Type::I16 => i16::MAX as u64,
        Type::I32 => i32::MAX as u64,
        Type::I64 => i64::MAX as u64,
        _ => unreachable!("signed_max on non-signed type"),
    }
}

/// Convert a wire-decoded numeric bit pattern of type `from` into the
/// canonical bit pattern of type `to`, applying the same encoding
/// [`crate::value::Value::as_raw_bits`]/[`crate::value::Value::from_raw_bits`]
/// use. Fails with [`Error::TypeMismatch`] if the pair isn't permitted by
/// [`type_coercible`], and with [`Error::Decode`] if an otherwise-permitted
/// unsigned-to-signed transition carries a value that doesn't fit the
/// signed target's range.
pub fn coerce_numeric(from: Type, to: Type, bits: u64) -> Result<u64> {
    if !type_coercible(from, to) {
        return Err(Error::TypeMismatch {
            expected: to.tag(),
            found: from.tag(),
        });
    }
    if from == to {
        return Ok(bits);
    }
    if let (Some(_), Some(_)) = (unsigned_rank(from), unsigned_rank(to)) {
        return Ok(bits);
    }
    if let (Some(_), Some(_)) = (signed_rank(from), signed_rank(to)) {
        return Ok(bits);
    }
    if let (Some(_), Some(_)) = (unsigned_rank(from), signed_rank(to)) {
        if bits > signed_max(to) {
            return Err(Error::Decode {
                step: "unsigned value doesn't fit its coerced signed target",
            });
        }
        return Ok(bits);
    }
    if from == Type::F32 && to == Type::F64 {
        let widened = f32::from_bits(bits as u32) as f64;
        return Ok(widened.to_bits());
    }
    unreachable!("type_coercible permitted a pair coerce_numeric doesn't handle: {from:?} -> {to:?}")
}

/// Whether a wire string of type `from` (classified by length, see
/// [`crate::codec::decode::decode_value`]) may load into a schema entry
/// of string type `to`.
pub fn coerce_str(from: Type, to: Type) -> Result<()> {
    if type_coercible(from, to) {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            expected: to.tag(),
            found: from.tag(),
        })
    }
}
