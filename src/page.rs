//! Page I/O and migration (C5): encode a context's present entries into
//! a canonical msgpack map, peek its schema name without fully decoding
//! it, and decode + migrate such a map into a context bound to a
//! (possibly newer) schema.

use crate::codec::decode::{decode_map_header, decode_value, WirePayload};
use crate::codec::encode::{encode_map_header, encode_str, encode_uint, encode_value};
use crate::codec::skip::skip_value;
use crate::coerce::{coerce_numeric, coerce_str, type_coercible};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::external::Decompressor;
use crate::value::Type;

/// `(old_id, new_id)` pairs applied by [`pagein`] before looking an
/// incoming key up in the new schema. Ids not listed pass through
/// unchanged.
pub struct Remap<'a>(&'a [(u16, u16)]);

impl<'a> Remap<'a> {
    pub fn new(pairs: &'a [(u16, u16)]) -> Remap<'a> {
        Remap(pairs)
    }

    pub fn empty() -> Remap<'static> {
        Remap(&[])
    }

    fn apply(&self, old_id: u16) -> u16 {
        self.0
            .iter()
            .find(|(from, _)| *from == old_id)
            .map(|(_, to)| *to)
            .unwrap_or(old_id)
    }
}

/// Encode every present entry of `ctx` into `buf`, a caller-owned fixed
/// buffer: ascending id order, shortest integer form, reserved key `0`
/// holding the schema's `map_name`. Returns the number of bytes written;
/// an undersized `buf` fails with [`Error::Encode`] rather than growing.
pub fn pageout(ctx: &Context, buf: &mut [u8]) -> Result<usize> {
    let total_len = buf.len();
    let mut cursor: &mut [u8] = buf;
    let entry_count = ctx.entry_count();
    let present_count = (0..entry_count).filter(|&i| ctx.present_bit(i)).count();
    encode_map_header(&mut cursor, present_count + 1)?;
    encode_uint(&mut cursor, 0)?;
    encode_str(&mut cursor, ctx.schema().map_name())?;
    for idx in 0..entry_count {
        if !ctx.present_bit(idx) {
            continue;
        }
        let entry = &ctx.schema().entries()[idx];
        encode_uint(&mut cursor, entry.id as u64)?;
        encode_value(&mut cursor, ctx.read_value(idx))?;
    }
    Ok(total_len - cursor.len())
}

/// Decode just enough of `blob` to recover its schema name (reserved key
/// `0`), skipping every other key with the generic skipper.
pub fn peek_name<'a>(blob: &'a [u8], limits: &crate::limits::Limits) -> Result<&'a str> {
    let mut cursor = blob;
    let count = decode_map_header(&mut cursor)?;
    for _ in 0..count {
        let key = decode_value(&mut cursor, limits)?;
        let k = match key.payload {
            WirePayload::Bits(b) => b,
            WirePayload::Str(_) => {
                return Err(Error::Decode {
                    step: "map key must be an integer",
                })
            }
        };
        if k == 0 {
            let v = decode_value(&mut cursor, limits)?;
            return match v.payload {
                WirePayload::Str(s) => Ok(s),
                WirePayload::Bits(_) => Err(Error::Decode {
                    step: "schema name must be a string",
                }),
            };
        }
        skip_value(&mut cursor, limits)?;
    }
    Err(Error::Decode {
        step: "blob has no reserved key 0",
    })
}

/// Decode `blob` into `ctx`, applying `remap` and the coercion rules of
/// §4.5.4, then promote defaults for every entry the blob left absent.
pub fn pagein(ctx: &mut Context, blob: &[u8], remap: Remap) -> Result<()> {
    let limits = *ctx.limits();
    let mut cursor = blob;
    let count = decode_map_header(&mut cursor)?;
    ctx.clear_presence();

    for _ in 0..count {
        let key = decode_value(&mut cursor, &limits)?;
        let k = match key.payload {
            WirePayload::Bits(b) => b,
            WirePayload::Str(_) => {
                return Err(Error::Decode {
                    step: "map key must be an integer",
                })
            }
        };
        if k == 0 {
            skip_value(&mut cursor, &limits)?;
            continue;
        }
        if k > u16::MAX as u64 {
            skip_value(&mut cursor, &limits)?;
            continue;
        }
        let target = remap.apply(k as u16);
        let idx = match ctx.schema().entry_by_id(target) {
            Some((idx, _)) => idx,
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!("pagein: dropping entry {k} (remapped to {target}), absent from new schema");
                skip_value(&mut cursor, &limits)?;
                continue;
            }
        };
        let entry_ty = ctx.schema().entries()[idx].ty;

        let wire = decode_value(&mut cursor, &limits)?;
        match wire.payload {
            WirePayload::Bits(bits) => {
                if entry_ty.is_string() {
                    return Err(Error::TypeMismatch {
                        expected: entry_ty.tag(),
                        found: wire.ty.tag(),
                    });
                }
                let converted = coerce_numeric(wire.ty, entry_ty, bits).inspect_err(|_e| {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        "pagein: rejected value for entry {target}, {} doesn't coerce to {}",
                        wire.ty.tag(),
                        entry_ty.tag()
                    );
                })?;
                ctx.write_numeric_slot(idx, converted);
            }
            WirePayload::Str(s) => {
                if !entry_ty.is_string() {
                    return Err(Error::TypeMismatch {
                        expected: entry_ty.tag(),
                        found: wire.ty.tag(),
                    });
                }
                coerce_str(wire.ty, entry_ty)?;
                ctx.write_str_slot(idx, s)?;
            }
        }
        ctx.set_present_bit(idx, true);
    }

    for idx in 0..ctx.entry_count() {
        let entry = &ctx.schema().entries()[idx];
        if !ctx.present_bit(idx) && entry.has_default {
            ctx.set_present_bit(idx, true);
        }
    }
    Ok(())
}

/// Decompress `compressed` into `scratch` with the caller's
/// [`Decompressor`], then [`pagein`] the result. `scratch` is a
/// caller-owned buffer sized for the decompressed blob; an undersized
/// one surfaces whatever error the decompressor reports for it.
pub fn pagein_compressed(
    ctx: &mut Context,
    compressed: &[u8],
    scratch: &mut [u8],
    decompressor: &mut dyn Decompressor,
    remap: Remap,
) -> Result<()> {
    let written = decompressor.decompress(compressed, scratch)?;
    pagein(ctx, &scratch[..written], remap)
}

/// Whether a value's wire type, as classified by [`decode_value`], may
/// load into an entry declared as `to` without running the decoder.
/// Exposed for callers (e.g. a schema compatibility check) that want the
/// static permission without a live blob.
pub fn coercible(from: Type, to: Type) -> bool {
    type_coercible(from, to)
}
