//! The binary schema front-end: a MessagePack document with a fixed,
//! agreed layout mirroring the schema, exchanged between the build-time
//! packer (external collaborator) and this runtime parser. Shares
//! validation with the text front-end via [`crate::parser::common`].
//!
//! Layout (field tags are small integer map keys, not strings, so the
//! whole document stays within the scalar+map codec this crate already
//! has):
//!
//! ```text
//! { 0: map_name(str), 1: version(uint), 3: { idx: entry, ... } }
//! entry = { 0: id(uint), 1: name(str), 2: type_tag(str), 4: default(any) }
//! ```
//!
//! Field `4` (default) is present iff the entry has a default; its
//! absence is exactly `NIL` in the text grammar.

use crate::codec::decode::{decode_map_header, decode_value, WirePayload};
use crate::codec::skip::skip_value;
use crate::coerce::coerce_numeric;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::parser::common::{check_entry_invariants, validate_id, validate_map_name, validate_name, DefaultLiteral};
use crate::schema::{Entry, Schema};
use crate::value::Type;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Measure {
    pub entry_count: usize,
    pub str_count: usize,
    pub fstr_count: usize,
    pub str_pool_bytes: usize,
}

struct RawEntry {
    id: u16,
    name: String,
    ty: Type,
    default: DefaultLiteral,
}

fn expect_uint(payload: WirePayload) -> Result<u64> {
    match payload {
        WirePayload::Bits(b) => Ok(b),
        WirePayload::Str(_) => Err(Error::Decode {
            step: "expected an integer field",
        }),
    }
}

fn expect_str(payload: WirePayload) -> Result<String> {
    match payload {
        WirePayload::Str(s) => Ok(s.to_string()),
        WirePayload::Bits(_) => Err(Error::Decode {
            step: "expected a string field",
        }),
    }
}

fn read_entry(cursor: &mut &[u8], limits: &Limits) -> Result<RawEntry> {
    let field_count = decode_map_header(cursor)?;
    let mut id = None;
    let mut name = None;
    let mut ty = None;
    let mut default = DefaultLiteral::Nil;

    for _ in 0..field_count {
        let key = expect_uint(decode_value(cursor, limits)?.payload)?;
        match key {
            0 => id = Some(expect_uint(decode_value(cursor, limits)?.payload)?),
            1 => name = Some(expect_str(decode_value(cursor, limits)?.payload)?),
            2 => {
                let tag = expect_str(decode_value(cursor, limits)?.payload)?;
                ty = Some(Type::from_tag(&tag).ok_or(Error::InvalidType { found: tag })?);
            }
            4 => {
                // The default's type depends on field 2 having already
                // been read; the packer is required to emit fields in
                // ascending tag order, matching canonical map encoding.
                let declared_ty = ty.ok_or(Error::Parse {
                    context: "entry default precedes its type tag".into(),
                })?;
                let wire = decode_value(cursor, limits)?;
                default = match wire.payload {
                    WirePayload::Bits(bits) if !declared_ty.is_string() => {
                        DefaultLiteral::Num(coerce_numeric(wire.ty, declared_ty, bits)?)
                    }
                    WirePayload::Str(s) if declared_ty.is_string() => {
                        if s.len() > declared_ty.max_str_len(limits) {
                            return Err(Error::StrTooLong {
                                max: declared_ty.max_str_len(limits),
                                actual: s.len(),
                            });
                        }
                        DefaultLiteral::Str(s.to_string())
                    }
                    _ => {
                        return Err(Error::TypeMismatch {
                            expected: declared_ty.tag(),
                            found: "mismatched default encoding",
                        })
                    }
                };
            }
            _ => skip_value(cursor, limits)?,
        }
    }

    let id = validate_id(id.ok_or(Error::Parse {
        context: "entry missing id field".into(),
    })? as u32)?;
    let name = name.ok_or(Error::Parse {
        context: "entry missing name field".into(),
    })?;
    validate_name(&name, limits)?;
    let ty = ty.ok_or(Error::Parse {
        context: "entry missing type field".into(),
    })?;
    Ok(RawEntry { id, name, ty, default })
}

fn read_document(blob: &[u8], limits: &Limits) -> Result<(String, u32, Vec<RawEntry>)> {
    let mut cursor = blob;
    let top_count = decode_map_header(&mut cursor)?;
    let mut map_name = None;
    let mut version = None;
    let mut raw_entries = Vec::new();

    for _ in 0..top_count {
        let key = expect_uint(decode_value(&mut cursor, limits)?.payload)?;
        match key {
            0 => map_name = Some(expect_str(decode_value(&mut cursor, limits)?.payload)?),
            1 => version = Some(expect_uint(decode_value(&mut cursor, limits)?.payload)? as u32),
            3 => {
                let n = decode_map_header(&mut cursor)?;
                if n > limits.max_entries {
                    return Err(Error::Bounds {
                        what: "entry count",
                        limit: limits.max_entries,
                        actual: n,
                    });
                }
                for _ in 0..n {
                    let _index_key = decode_value(&mut cursor, limits)?;
                    raw_entries.push(read_entry(&mut cursor, limits)?);
                }
            }
            _ => skip_value(&mut cursor, limits)?,
        }
    }

    let map_name = map_name.ok_or(Error::Parse {
        context: "document missing map_name field".into(),
    })?;
    validate_map_name(&map_name, limits)?;
    let version = version.ok_or(Error::Parse {
        context: "document missing version field".into(),
    })?;
    Ok((map_name, version, raw_entries))
}

/// Scan one entry's fields, returning its declared type without building
/// an owned [`RawEntry`]: every field but the type tag is stepped over
/// with [`skip_value`], and the tag itself is classified from the
/// borrowed `&str` [`decode_value`] hands back.
fn measure_entry(cursor: &mut &[u8], limits: &Limits) -> Result<Type> {
    let field_count = decode_map_header(cursor)?;
    let mut ty = None;
    for _ in 0..field_count {
        let key = expect_uint(decode_value(cursor, limits)?.payload)?;
        if key == 2 {
            let wire = decode_value(cursor, limits)?;
            let tag = match wire.payload {
                WirePayload::Str(s) => s,
                WirePayload::Bits(_) => {
                    return Err(Error::Decode {
                        step: "expected a string field",
                    })
                }
            };
            ty = Some(Type::from_tag(tag).ok_or_else(|| Error::InvalidType { found: tag.to_string() })?);
        } else {
            skip_value(cursor, limits)?;
        }
    }
    ty.ok_or(Error::Parse {
        context: "entry missing type field".into(),
    })
}

/// Measure the buffers a [`parse`] call over `blob` will need, using only
/// a fixed set of stack-resident counters: no `Vec`, no owned `String`,
/// no intermediate [`RawEntry`] is ever built on this path.
pub fn measure(blob: &[u8], limits: &Limits) -> Result<Measure> {
    let mut cursor = blob;
    let top_count = decode_map_header(&mut cursor)?;
    let mut m = Measure::default();

    for _ in 0..top_count {
        let key = expect_uint(decode_value(&mut cursor, limits)?.payload)?;
        match key {
            3 => {
                let n = decode_map_header(&mut cursor)?;
                if n > limits.max_entries {
                    return Err(Error::Bounds {
                        what: "entry count",
                        limit: limits.max_entries,
                        actual: n,
                    });
                }
                m.entry_count = n;
                for _ in 0..n {
                    let _index_key = decode_value(&mut cursor, limits)?;
                    match measure_entry(&mut cursor, limits)? {
                        Type::Str => m.str_count += 1,
                        Type::FStr => m.fstr_count += 1,
                        _ => {}
                    }
                }
            }
            _ => skip_value(&mut cursor, limits)?,
        }
    }

    m.str_pool_bytes =
        m.str_count * Type::Str.pool_slot_len(limits) + m.fstr_count * Type::FStr.pool_slot_len(limits);
    Ok(m)
}

/// Parse `blob` into a [`Schema`], writing defaults into `values`/`str_pool`
/// at the positions the schema's sorted entry order dictates.
pub fn parse(blob: &[u8], limits: &Limits, values: &mut [u64], str_pool: &mut [u8]) -> Result<Schema> {
    let (map_name, version, raw_entries) = read_document(blob, limits)?;

    let entries: Vec<Entry> = raw_entries
        .iter()
        .map(|e| Entry {
            id: e.id,
            name: e.name.clone(),
            ty: e.ty,
            has_default: !matches!(e.default, DefaultLiteral::Nil),
        })
        .collect();
    check_entry_invariants(&entries, limits)?;

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by_key(|&i| entries[i].id);
    let sorted_entries: Vec<Entry> = order.iter().map(|&i| entries[i].clone()).collect();
    let schema = Schema::new(map_name, version, sorted_entries)?;

    if values.len() < schema.entries().len() {
        return Err(Error::Bounds {
            what: "values",
            limit: schema.entries().len(),
            actual: values.len(),
        });
    }

    for (sorted_idx, &orig_idx) in order.iter().enumerate() {
        let entry = &schema.entries()[sorted_idx];
        match &raw_entries[orig_idx].default {
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
