//! Validation and literal parsing shared by the text and binary schema
//! front-ends, so the two never drift on what counts as a well-formed
//! schema.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::schema::Entry;
use crate::value::Type;

/// Validate a raw id value and narrow it to `u16`. Id `0` is a reserved
/// index, not merely out of range, so it gets its own error variant.
pub fn validate_id(raw: u32) -> Result<u16> {
    if raw == 0 {
        return Err(Error::ReservedIndex);
    }
    if raw > u16::MAX as u32 {
        return Err(Error::Bounds {
            what: "entry id",
            limit: u16::MAX as usize,
            actual: raw as usize,
        });
    }
    Ok(raw as u16)
}

/// Validate an entry's short name: non-empty, at most `limits.name_max`
/// bytes, no whitespace.
pub fn validate_name(name: &str, limits: &Limits) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Parse {
            context: "entry name must not be empty".into(),
        });
    }
    if name.len() > limits.name_max {
        return Err(Error::Bounds {
            what: "entry name",
            limit: limits.name_max,
            actual: name.len(),
        });
    }
    if name.chars().any(char::is_whitespace) {
        return Err(Error::Parse {
            context: "entry name must not contain whitespace".into(),
        });
    }
    Ok(())
}

/// Validate a schema's `map_name`: at most `limits.map_name_max` bytes.
pub fn validate_map_name(name: &str, limits: &Limits) -> Result<()> {
    if name.len() > limits.map_name_max {
        return Err(Error::Bounds {
            what: "map_name",
            limit: limits.map_name_max,
            actual: name.len(),
        });
    }
    Ok(())
}

/// Check the id-uniqueness, name-uniqueness, and entry-count-cap
/// invariants over a not-yet-sorted entry list.
pub fn check_entry_invariants(entries: &[Entry], limits: &Limits) -> Result<()> {
    if entries.len() > limits.max_entries {
        return Err(Error::Bounds {
            what: "entry count",
            limit: limits.max_entries,
            actual: entries.len(),
        });
    }
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            if entries[i].id == entries[j].id {
                return Err(Error::Duplicate {
                    kind: "id",
                    value: entries[i].id.to_string(),
                });
            }
            if entries[i].name == entries[j].name {
                return Err(Error::Duplicate {
                    kind: "name",
                    value: entries[i].name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// A parsed default, not yet written into a runtime buffer.
pub enum DefaultLiteral {
    /// The `NIL` token: no default, slot left zeroed.
    Nil,
    /// A numeric literal, already range-checked against `ty` and encoded
    /// as the same canonical bit pattern [`crate::value::Value::as_raw_bits`]
    /// produces.
    Num(u64),
    /// A string literal, already length-checked against `ty`'s max.
    Str(String),
}

fn parse_int_token(tok: &str) -> Result<i128> {
    let (neg, rest) = match tok.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, tok),
    };
    let magnitude = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i128::from_str_radix(hex, 16).map_err(|_| Error::Parse {
            context: format!("not a valid hex integer literal: {tok}"),
        })?
    } else {
        rest.parse::<i128>().map_err(|_| Error::Parse {
            context: format!("not a valid integer literal: {tok}"),
        })?
    };
    Ok(if neg { -magnitude } else { magnitude })
}

fn range_check_int(ty: Type, v: i128) -> Result<u64> {
    let (lo, hi): (i128, i128) = match ty {
        Type::U8 => (u8::MIN as i128, u8::MAX as i128),
        Type::U16 => (u16::MIN as i128, u16::MAX as i128),
        Type::U32 => (u32::MIN as i128, u32::MAX as i128),
        Type::U64 => (u64::MIN as i128, u64::MAX as i128),
        Type::I8 => (i8::MIN as i128, i8::MAX as i128),
        Type::I16 => (i16::MIN as i128, i16::MAX as i128),
        Type::I32 => (i32::MIN as i128, i32::MAX as i128),
        Type::I64 => (i64::MIN as i128, i64::MAX as i128),
        Type::F32 | Type::F64 | Type::Str | Type::FStr => {
            unreachable!("range_check_int on non-integer type")
        }
    };
    if v < lo || v > hi {
        return Err(Error::Bounds {
            what: "integer default",
            limit: hi as usize,
            actual: v as usize,
        });
    }
    Ok(match ty {
        Type::U8 | Type::U16 | Type::U32 | Type::U64 => v as u64,
        Type::I8 | Type::I16 | Type::I32 | Type::I64 => v as i64 as u64,
        _ => unreachable!(),
    })
}

/// Parse a default literal token (already isolated from its surrounding
/// grammar, with any quotes already stripped for strings) against the
/// entry's declared type.
pub fn parse_default(tok: &str, ty: Type, limits: &Limits) -> Result<DefaultLiteral> {
    if tok == "NIL" {
        return Ok(DefaultLiteral::Nil);
    }
    match ty {
        Type::U8 | Type::U16 | Type::U32 | Type::U64 | Type::I8 | Type::I16 | Type::I32 | Type::I64 => {
            let v = parse_int_token(tok)?;
            Ok(DefaultLiteral::Num(range_check_int(ty, v)?))
        }
        Type::F32 => {
            let v: f32 = tok.parse().map_err(|_| Error::Parse {
                context: format!("not a valid f32 literal: {tok}"),
            })?;
            Ok(DefaultLiteral::Num(v.to_bits() as u64))
        }
        Type::F64 => {
            let v: f64 = tok.parse().map_err(|_| Error::Parse {
                context: format!("not a valid f64 literal: {tok}"),
            })?;
            Ok(DefaultLiteral::Num(v.to_bits()))
        }
        Type::Str | Type::FStr => {
            if tok.len() > ty.max_str_len(limits) {
                return Err(Error::StrTooLong {
                    max: ty.max_str_len(limits),
                    actual: tok.len(),
                });
            }
            Ok(DefaultLiteral::Str(tok.to_string()))
        }
    }
}

/// Unescape a double-quoted string body (quotes already stripped) using
/// the grammar's escape set: `\n \t \r \\ \"`.
pub fn unescape_quoted(body: &str) -> Result<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            _ => {
                return Err(Error::Parse {
                    context: "invalid escape sequence in string literal".into(),
                })
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_zero_is_reserved_not_out_of_range() {
        assert!(matches!(validate_id(0), Err(Error::ReservedIndex)));
    }

    #[test]
    fn id_boundaries() {
        assert!(validate_id(1).is_ok());
        assert!(validate_id(65535).is_ok());
        assert!(validate_id(65536).is_err());
    }

    #[test]
    fn name_length_boundaries() {
        let limits = Limits::default();
        assert!(validate_name("x", &limits).is_ok());
        assert!(validate_name("abcde", &limits).is_ok());
        assert!(validate_name("abcdef", &limits).is_err());
        assert!(validate_name("", &limits).is_err());
    }

    #[test]
    fn integer_default_exact_bounds() {
        let limits = Limits::default();
        assert!(matches!(
            parse_default("255", Type::U8, &limits),
            Ok(DefaultLiteral::Num(255))
        ));
        assert!(parse_default("256", Type::U8, &limits).is_err());
        assert!(matches!(
            parse_default("-128", Type::I8, &limits),
            Ok(DefaultLiteral::Num(_))
        ));
        assert!(parse_default("-129", Type::I8, &limits).is_err());
    }

    #[test]
    fn hex_literal_parses() {
        let limits = Limits::default();
        assert!(matches!(
            parse_default("0xff", Type::U8, &limits),
            Ok(DefaultLiteral::Num(255))
        ));
    }

    #[test]
    fn unescape_handles_the_documented_escape_set() {
        assert_eq!(unescape_quoted(r"a\nb\t\"c\\").unwrap(), "a\nb\t\"c\\");
        assert!(unescape_quoted(r"\x").is_err());
    }
}
