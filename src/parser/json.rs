//! Optional JSON schema front-end, behind the `json-schema` feature:
//! human-authored JSON in place of the text grammar, for tooling that
//! already speaks JSON (build scripts, web dashboards). Shares
//! validation with the other front-ends via [`crate::parser::common`].

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::parser::common::{
    check_entry_invariants, parse_default, validate_id, validate_map_name, validate_name, DefaultLiteral,
};
use crate::schema::{Entry, Schema};
use crate::value::Type;

#[derive(Deserialize)]
struct JsonEntry {
    id: u32,
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    default: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct JsonSchema {
    map_name: String,
    version: u32,
    entries: Vec<JsonEntry>,
}

fn decode(text: &str) -> Result<JsonSchema> {
    serde_json::from_str(text).map_err(|e| Error::Parse {
        context: format!("malformed JSON schema: {e}"),
    })
}

fn json_default_token(v: &serde_json::Value) -> Result<String> {
    match v {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::Parse {
            context: "default must be a JSON string or number".into(),
        }),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Measure {
    pub entry_count: usize,
    pub str_count: usize,
    pub fstr_count: usize,
    pub str_pool_bytes: usize,
}

/// Measure the buffers a [`parse`] call over `text` will need.
pub fn measure(text: &str, limits: &Limits) -> Result<Measure> {
    let doc = decode(text)?;
    if doc.entries.len() > limits.max_entries {
        return Err(Error::Bounds {
            what: "entry count",
            limit: limits.max_entries,
            actual: doc.entries.len(),
        });
    }
    let mut m = Measure {
        entry_count: doc.entries.len(),
        ..Measure::default()
    };
    for e in &doc.entries {
        match Type::from_tag(&e.ty) {
            Some(Type::Str) => m.str_count += 1,
            Some(Type::FStr) => m.fstr_count += 1,
            Some(_) => {}
            None => {
                return Err(Error::InvalidType {
                    found: e.ty.clone(),
                })
            }
        }
    }
    m.str_pool_bytes =
        m.str_count * Type::Str.pool_slot_len(limits) + m.fstr_count * Type::FStr.pool_slot_len(limits);
    Ok(m)
}

/// Parse `text` into a [`Schema`], writing defaults into `values`/`str_pool`
/// at the positions the schema's sorted entry order dictates.
pub fn parse(text: &str, limits: &Limits, values: &mut [u64], str_pool: &mut [u8]) -> Result<Schema> {
    let doc = decode(text)?;
    validate_map_name(&doc.map_name, limits)?;

    let mut defaults = Vec::with_capacity(doc.entries.len());
    let entries: Vec<Entry> = doc
        .entries
        .iter()
        .map(|e| -> Result<Entry> {
            let id = validate_id(e.id)?;
            validate_name(&e.name, limits)?;
            let ty = Type::from_tag(&e.ty).ok_or_else(|| Error::InvalidType {
                found: e.ty.clone(),
            })?;
            let default = match &e.default {
                None => DefaultLiteral::Nil,
                Some(v) => parse_default(&json_default_token(v)?, ty, limits)?,
            };
            defaults.push(default);
            Ok(Entry {
                id,
                name: e.name.clone(),
                ty,
                has_default: e.default.is_some(),
            })
        })
        .collect::<Result<_>>()?;
    check_entry_invariants(&entries, limits)?;

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by_key(|&i| entries[i].id);
    let sorted_entries: Vec<Entry> = order.iter().map(|&i| entries[i].clone()).collect();
    let schema = Schema::new(doc.map_name, doc.version, sorted_entries)?;

    if values.len() < schema.entries().len() {
        return Err(Error::Bounds {
            what: "values",
            limit: schema.entries().len(),
            actual: values.len(),
        });
    }

    for (sorted_idx, &orig_idx) in order.iter().enumerate() {
        let entry = &schema.entries()[sorted_idx];
        match &defaults[orig_idx] {
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
