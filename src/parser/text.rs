//! The text schema grammar: a line-oriented, UTF-8-agnostic format with
//! a header line and one entry per subsequent line.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::parser::common::{
    check_entry_invariants, parse_default, unescape_quoted, validate_id, validate_map_name,
    validate_name, DefaultLiteral,
};
use crate::schema::{Entry, Schema};
use crate::value::Type;

/// Result of the measure pass: exact buffer sizes a caller needs before
/// calling [`parse`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Measure {
    pub entry_count: usize,
    pub str_count: usize,
    pub fstr_count: usize,
    pub str_pool_bytes: usize,
}

fn is_ignored(line: &str) -> bool {
    let t = line.trim_start();
    t.is_empty() || t.starts_with('#')
}

/// Split a header line into `(map_name, version)`.
fn split_header(line: &str) -> Result<(&str, &str)> {
    let mut parts = line.split_whitespace();
    let name = parts.next().ok_or(Error::Parse {
        context: "missing schema header".into(),
    })?;
    let version = parts.next().ok_or(Error::Parse {
        context: "schema header missing version".into(),
    })?;
    Ok((name, version))
}

/// Split an entry line into `(id, name, type, default)`. The default
/// field is everything after the third token, trimmed, so a quoted
/// string default may itself contain spaces.
fn split_entry(line: &str) -> Result<(&str, &str, &str, &str)> {
    let trimmed = line.trim_start();
    let mut idx = 0;
    let mut fields = [""; 3];
    let mut rest = trimmed;
    for field in fields.iter_mut() {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if end == 0 {
            return Err(Error::Parse {
                context: format!("truncated entry line: {line}"),
            });
        }
        *field = &rest[..end];
        rest = &rest[end..];
        idx += 1;
    }
    let _ = idx;
    let default = rest.trim();
    if default.is_empty() {
        return Err(Error::Parse {
            context: format!("entry line missing default: {line}"),
        });
    }
    Ok((fields[0], fields[1], fields[2], default))
}

fn parse_id_token(tok: &str) -> Result<u32> {
    if let Some(hex) = tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|_| Error::Parse {
            context: format!("not a valid hex id: {tok}"),
        })
    } else {
        tok.parse::<u32>().map_err(|_| Error::Parse {
            context: format!("not a valid id: {tok}"),
        })
    }
}

/// Strip a default token's surrounding quotes and unescape it, for
/// string-typed entries. Fails if the token isn't a properly terminated
/// quoted string.
fn unquote(tok: &str) -> Result<String> {
    if tok.len() < 2 || !tok.starts_with('"') || !tok.ends_with('"') {
        return Err(Error::Parse {
            context: format!("string default must be double-quoted: {tok}"),
        });
    }
    unescape_quoted(&tok[1..tok.len() - 1])
}

/// Measure the buffers a [`parse`] call over `text` will need, without
/// writing anything. Uses only bounded stack: one pass over the lines.
pub fn measure(text: &str, limits: &Limits) -> Result<Measure> {
    let mut lines = text.lines().filter(|l| !is_ignored(l));
    lines.next().ok_or(Error::Parse {
        context: "empty schema text".into(),
    })?;

    let mut m = Measure::default();
    for line in lines {
        let (_, _, ty_tok, _) = split_entry(line)?;
        let ty = Type::from_tag(ty_tok).ok_or_else(|| Error::InvalidType {
            found: ty_tok.to_string(),
        })?;
        m.entry_count += 1;
        match ty {
            Type::Str => m.str_count += 1,
            Type::FStr => m.fstr_count += 1,
            _ => {}
        }
        if m.entry_count > limits.max_entries {
            return Err(Error::Bounds {
                what: "entry count",
                limit: limits.max_entries,
                actual: m.entry_count,
            });
        }
    }
    m.str_pool_bytes =
        m.str_count * Type::Str.pool_slot_len(limits) + m.fstr_count * Type::FStr.pool_slot_len(limits);
    Ok(m)
}

/// Parse `text` into a [`Schema`], writing default values and default
/// strings directly into `values`/`str_pool` at the positions the
/// schema's *sorted* entry order dictates. Both buffers must already be
/// sized per a prior [`measure`] call.
pub fn parse(text: &str, limits: &Limits, values: &mut [u64], str_pool: &mut [u8]) -> Result<Schema> {
    let mut lines = text.lines().filter(|l| !is_ignored(l));
    let header = lines.next().ok_or(Error::Parse {
        context: "empty schema text".into(),
    })?;
    let (map_name, version_tok) = split_header(header)?;
    validate_map_name(map_name, limits)?;
    let version: u32 = version_tok.parse().map_err(|_| Error::Parse {
        context: format!("not a valid version: {version_tok}"),
    })?;

    struct Pending {
        id: u16,
        name: String,
        ty: Type,
        default: DefaultLiteral,
    }

    let mut pending = Vec::new();
    for line in lines {
        let (id_tok, name_tok, ty_tok, default_tok) = split_entry(line)?;
        let id = validate_id(parse_id_token(id_tok)?)?;
        validate_name(name_tok, limits)?;
        let ty = Type::from_tag(ty_tok).ok_or_else(|| Error::InvalidType {
            found: ty_tok.to_string(),
        })?;
        let literal_tok = if ty.is_string() && default_tok != "NIL" {
            unquote(default_tok)?
        } else {
            default_tok.to_string()
        };
        let default = parse_default(&literal_tok, ty, limits)?;
        pending.push(Pending {
            id,
            name: name_tok.to_string(),
            ty,
            default,
        });
    }

    let entries: Vec<Entry> = pending
        .iter()
        .map(|p| Entry {
            id: p.id,
            name: p.name.clone(),
            ty: p.ty,
            has_default: !matches!(p.default, DefaultLiteral::Nil),
        })
        .collect();
    check_entry_invariants(&entries, limits)?;

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by_key(|&i| entries[i].id);
    let sorted_entries: Vec<Entry> = order.iter().map(|&i| entries[i].clone()).collect();
    let schema = Schema::new(map_name.to_string(), version, sorted_entries)?;

    if values.len() < schema.entries().len() {
        return Err(Error::Bounds {
            what: "values",
            limit: schema.entries().len(),
            actual: values.len(),
        });
    }

    for (sorted_idx, &orig_idx) in order.iter().enumerate() {
        let entry = &schema.entries()[sorted_idx];
        match &pending[orig_idx].default {
            DefaultLiteral::Nil => {}
            DefaultLiteral::Num(bits) => values[sorted_idx] = *bits,
            DefaultLiteral::Str(s) => {
                let off = schema.str_slot_offset(limits, sorted_idx);
                let slot_len = entry.ty.pool_slot_len(limits);
                if str_pool.len() < off + slot_len {
                    return Err(Error::Bounds {
                        what: "str_pool",
                        limit: off + slot_len,
                        actual: str_pool.len(),
                    });
                }
                let slot = &mut str_pool[off..off + slot_len];
                slot[0] = s.len() as u8;
                slot[1..1 + s.len()].copy_from_slice(s.as_bytes());
            }
        }
    }

    Ok(schema)
}
