//! The runtime context (C4): binds an immutable [`Schema`] to caller-owned
//! buffers (value slots, presence bitmap, string pool, string offsets)
//! and exposes `get`/`set` by id or name. A context never allocates; it
//! only borrows the buffers a caller sized via [`Schema::sizing`].

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::schema::{Entry, Schema};
use crate::value::{Type, Value};

/// A live configuration: a schema plus the four caller-owned buffers
/// [`Context::init`] validates and binds.
pub struct Context<'a> {
    schema: &'a Schema,
    limits: Limits,
    values: &'a mut [u64],
    present: &'a mut [u8],
    str_pool: &'a mut [u8],
    str_offsets: &'a mut [u32],
}

fn bit(present: &[u8], idx: usize) -> bool {
    present[idx / 8] & (1 << (idx % 8)) != 0
}

fn set_bit(present: &mut [u8], idx: usize, v: bool) {
    let mask = 1 << (idx % 8);
    if v {
        present[idx / 8] |= mask;
    } else {
        present[idx / 8] &= !mask;
    }
}

impl<'a> Context<'a> {
    /// Bind `schema` to caller buffers, each sized at least as large as
    /// [`Schema::sizing`] dictates. `values` and `str_pool` are left
    /// untouched (a parser is expected to have already populated
    /// defaults there); `str_offsets` is (re)computed here, and the
    /// presence bitmap is cleared and then set for every entry with a
    /// default.
    pub fn init(
        schema: &'a Schema,
        limits: Limits,
        values: &'a mut [u64],
        present: &'a mut [u8],
        str_pool: &'a mut [u8],
        str_offsets: &'a mut [u32],
    ) -> Result<Context<'a>> {
        let sizing = schema.sizing(&limits);
        if values.len() < sizing.entry_count {
            return Err(Error::Bounds {
                what: "values",
                limit: sizing.entry_count,
                actual: values.len(),
            });
        }
        if present.len() < sizing.presence_bitmap_bytes {
            return Err(Error::Bounds {
                what: "present",
                limit: sizing.presence_bitmap_bytes,
                actual: present.len(),
            });
        }
        if str_pool.len() < sizing.str_pool_bytes {
            return Err(Error::Bounds {
                what: "str_pool",
                limit: sizing.str_pool_bytes,
                actual: str_pool.len(),
            });
        }
        if str_offsets.len() < sizing.entry_count {
            return Err(Error::Bounds {
                what: "str_offsets",
                limit: sizing.entry_count,
                actual: str_offsets.len(),
            });
        }

        for (i, _) in schema.entries().iter().enumerate() {
            str_offsets[i] = schema.str_slot_offset(&limits, i) as u32;
        }
        for b in present.iter_mut() {
            *b = 0;
        }

        let mut ctx = Context {
            schema,
            limits,
            values,
            present,
            str_pool,
            str_offsets,
        };
        for (i, e) in ctx.schema.entries().iter().enumerate() {
            if e.has_default {
                set_bit(ctx.present, i, true);
            }
        }
        Ok(ctx)
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub(crate) fn str_offsets(&self) -> &[u32] {
        self.str_offsets
    }

    pub(crate) fn str_pool_mut(&mut self) -> &mut [u8] {
        self.str_pool
    }

    pub(crate) fn values_mut(&mut self) -> &mut [u64] {
        self.values
    }

    pub(crate) fn present_mut(&mut self) -> &mut [u8] {
        self.present
    }

    fn slot_len(&self, entry: &Entry) -> usize {
        entry.ty.pool_slot_len(&self.limits)
    }

    fn read_str(&self, idx: usize, entry: &Entry) -> &str {
        let off = self.str_offsets[idx] as usize;
        let len = self.slot_len(entry);
        // SAFETY-free: this is a plain slice reborrow, not unsafe code.
        // `init` already validated `str_pool.len() >= str_pool_bytes`, and
        // `off + len` never exceeds that by construction of `str_offsets`.
        let slot = &self.str_pool[off..off + len];
        let actual = slot[0] as usize;
        std::str::from_utf8(&slot[1..1 + actual]).unwrap_or("")
    }

    fn write_str(&mut self, idx: usize, entry: &Entry, s: &str) {
        let off = self.str_offsets[idx] as usize;
        let len = self.slot_len(entry);
        let slot = &mut self.str_pool[off..off + len];
        slot[0] = s.len() as u8;
        slot[1..1 + s.len()].copy_from_slice(s.as_bytes());
    }

    fn entry_at(&self, idx: usize) -> &Entry {
        &self.schema.entries()[idx]
    }

    pub(crate) fn read_value(&self, idx: usize) -> Value<'_> {
        let entry = self.entry_at(idx);
        if entry.ty.is_string() {
            let s = self.read_str(idx, entry);
            return if entry.ty == Type::FStr {
                Value::FStr(s)
            } else {
                Value::Str(s)
            };
        }
        Value::from_raw_bits(entry.ty, self.values[idx]).expect("numeric type always reconstructs")
    }

    fn write_value(&mut self, idx: usize, v: Value) -> Result<()> {
        let entry = self.entry_at(idx).clone();
        if entry.ty.is_string() {
            let s = v.as_str().ok_or(Error::TypeMismatch {
                expected: entry.ty.tag(),
                found: "non-string",
            })?;
            if s.len() > entry.ty.max_str_len(&self.limits) {
                return Err(Error::StrTooLong {
                    max: entry.ty.max_str_len(&self.limits),
                    actual: s.len(),
                });
            }
            self.write_str(idx, &entry, s);
        } else {
            self.values[idx] = v.as_raw_bits();
        }
        Ok(())
    }

    fn resolve(&self, id: u16) -> Result<usize> {
        if id == 0 {
            return Err(Error::ReservedIndex);
        }
        self.schema
            .entry_by_id(id)
            .map(|(idx, _)| idx)
            .ok_or(Error::Missing { id: id as u32 })
    }

    /// Set the entry `id` to `v`. No coercion: `v`'s type must exactly
    /// match the entry's declared type.
    pub fn set(&mut self, id: u16, v: Value) -> Result<()> {
        let idx = self.resolve(id)?;
        let entry_ty = self.entry_at(idx).ty;
        if v.ty() != entry_ty {
            return Err(Error::TypeMismatch {
                expected: entry_ty.tag(),
                found: v.ty().tag(),
            });
        }
        self.write_value(idx, v)?;
        set_bit(self.present, idx, true);
        Ok(())
    }

    /// Get the current value of entry `id`, or `Missing` if its presence
    /// bit is clear (even when the slot still holds a stale or default
    /// value).
    pub fn get(&self, id: u16) -> Result<Value<'_>> {
        let idx = self.resolve(id)?;
        if !bit(self.present, idx) {
            return Err(Error::Missing { id: id as u32 });
        }
        Ok(self.read_value(idx))
    }

    /// Same as [`Context::get`], resolving by short name instead of id.
    pub fn get_by_name(&self, name: &str) -> Result<Value<'_>> {
        let (idx, _) = self
            .schema
            .entry_by_name(name)
            .ok_or(Error::Missing { id: 0 })?;
        if !bit(self.present, idx) {
            return Err(Error::Missing { id: 0 });
        }
        Ok(self.read_value(idx))
    }

    /// Same as [`Context::set`], resolving by short name instead of id.
    pub fn set_by_name(&mut self, name: &str, v: Value) -> Result<()> {
        let (idx, entry) = self
            .schema
            .entry_by_name(name)
            .ok_or(Error::Missing { id: 0 })?;
        if v.ty() != entry.ty {
            return Err(Error::TypeMismatch {
                expected: entry.ty.tag(),
                found: v.ty().tag(),
            });
        }
        self.write_value(idx, v)?;
        set_bit(self.present, idx, true);
        Ok(())
    }

    pub(crate) fn entry_count(&self) -> usize {
        self.schema.entries().len()
    }

    /// Clear every presence bit. Used by [`crate::page::pagein`] before it
    /// replays the incoming blob's key/value pairs.
    pub(crate) fn clear_presence(&mut self) {
        for b in self.present.iter_mut() {
            *b = 0;
        }
    }

    pub(crate) fn present_bit(&self, idx: usize) -> bool {
        bit(self.present, idx)
    }

    pub(crate) fn set_present_bit(&mut self, idx: usize, v: bool) {
        set_bit(self.present, idx, v);
    }

    pub(crate) fn write_numeric_slot(&mut self, idx: usize, bits: u64) {
        self.values[idx] = bits;
    }

    pub(crate) fn write_str_slot(&mut self, idx: usize, s: &str) -> Result<()> {
        let entry = self.entry_at(idx).clone();
        if s.len() > entry.ty.max_str_len(&self.limits) {
            return Err(Error::StrTooLong {
                max: entry.ty.max_str_len(&self.limits),
                actual: s.len(),
            });
        }
        self.write_str(idx, &entry, s);
        Ok(())
    }
}

macro_rules! typed_accessors {
    ($get:ident, $set:ident, $variant:ident, $t:ty) => {
        impl<'a> Context<'a> {
            pub fn $get(&self, id: u16) -> Result<$t> {
                match self.get(id)? {
                    Value::$variant(v) => Ok(v),
                    other => Err(Error::TypeMismatch {
                        expected: stringify!($t),
                        found: other.ty().tag(),
                    }),
                }
            }

            pub fn $set(&mut self, id: u16, v: $t) -> Result<()> {
                self.set(id, Value::$variant(v))
            }
        }
    };
}

typed_accessors!(get_u8, set_u8, U8, u8);
typed_accessors!(get_u16, set_u16, U16, u16);
typed_accessors!(get_u32, set_u32, U32, u32);
typed_accessors!(get_u64, set_u64, U64, u64);
typed_accessors!(get_i8, set_i8, I8, i8);
typed_accessors!(get_i16, set_i16, I16, i16);
typed_accessors!(get_i32, set_i32, I32, i32);
typed_accessors!(get_i64, set_i64, I64, i64);
typed_accessors!(get_f32, set_f32, F32, f32);
typed_accessors!(get_f64, set_f64, F64, f64);

impl<'a> Context<'a> {
    pub fn get_str(&self, id: u16) -> Result<&str> {
        match self.get(id)? {
            Value::Str(s) => Ok(s),
            other => Err(Error::TypeMismatch {
                expected: "str",
                found: other.ty().tag(),
            }),
        }
    }

    pub fn set_str(&mut self, id: u16, v: &str) -> Result<()> {
        self.set(id, Value::Str(v))
    }

    pub fn get_fstr(&self, id: u16) -> Result<&str> {
        match self.get(id)? {
            Value::FStr(s) => Ok(s),
            other => Err(Error::TypeMismatch {
                expected: "fstr",
                found: other.ty().tag(),
            }),
        }
    }

    pub fn set_fstr(&mut self, id: u16, v: &str) -> Result<()> {
        self.set(id, Value::FStr(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Entry;

    fn small_schema() -> Schema {
        Schema::new(
            "cfg".into(),
            1,
            vec![
                Entry {
                    id: 1,
                    name: "a".into(),
                    ty: Type::U8,
                    has_default: true,
                },
                Entry {
                    id: 2,
                    name: "b".into(),
                    ty: Type::Str,
                    has_default: false,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn default_is_visible_immediately_after_init() {
        let schema = small_schema();
        let limits = Limits::default();
        let sizing = schema.sizing(&limits);
        let mut values = vec![7u64; sizing.entry_count];
        let mut present = vec![0u8; sizing.presence_bitmap_bytes];
        let mut str_pool = vec![0u8; sizing.str_pool_bytes];
        let mut str_offsets = vec![0u32; sizing.entry_count];
        let ctx = Context::init(
            &schema,
            limits,
            &mut values,
            &mut present,
            &mut str_pool,
            &mut str_offsets,
        )
        .unwrap();
        assert_eq!(ctx.get_u8(1).unwrap(), 7);
        assert!(ctx.get(2).is_err());
    }

    #[test]
    fn set_then_get_roundtrips_a_string() {
        let schema = small_schema();
        let limits = Limits::default();
        let sizing = schema.sizing(&limits);
        let mut values = vec![0u64; sizing.entry_count];
        let mut present = vec![0u8; sizing.presence_bitmap_bytes];
        let mut str_pool = vec![0u8; sizing.str_pool_bytes];
        let mut str_offsets = vec![0u32; sizing.entry_count];
        let mut ctx = Context::init(
            &schema,
            limits,
            &mut values,
            &mut present,
            &mut str_pool,
            &mut str_offsets,
        )
        .unwrap();
        ctx.set_str(2, "hello").unwrap();
        assert_eq!(ctx.get_str(2).unwrap(), "hello");
    }

    #[test]
    fn set_rejects_type_mismatch_without_coercion() {
        let schema = small_schema();
        let limits = Limits::default();
        let sizing = schema.sizing(&limits);
        let mut values = vec![0u64; sizing.entry_count];
        let mut present = vec![0u8; sizing.presence_bitmap_bytes];
        let mut str_pool = vec![0u8; sizing.str_pool_bytes];
        let mut str_offsets = vec![0u32; sizing.entry_count];
        let mut ctx = Context::init(
            &schema,
            limits,
            &mut values,
            &mut present,
            &mut str_pool,
            &mut str_offsets,
        )
        .unwrap();
        assert!(matches!(
            ctx.set(1, Value::U16(5)),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn reserved_id_zero_is_rejected() {
        let schema = small_schema();
        let limits = Limits::default();
        let sizing = schema.sizing(&limits);
        let mut values = vec![0u64; sizing.entry_count];
        let mut present = vec![0u8; sizing.presence_bitmap_bytes];
        let mut str_pool = vec![0u8; sizing.str_pool_bytes];
        let mut str_offsets = vec![0u32; sizing.entry_count];
        let ctx = Context::init(
            &schema,
            limits,
            &mut values,
            &mut present,
            &mut str_pool,
            &mut str_offsets,
        )
        .unwrap();
        assert!(matches!(ctx.get(0), Err(Error::ReservedIndex)));
    }
}
