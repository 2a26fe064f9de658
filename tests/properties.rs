//! Property-based invariants, checked against the public API with
//! `proptest` generating the inputs. Complements the example-driven
//! cases in `tests/scenarios.rs` and the unit tests alongside each
//! module.

use cfgpack::{pagein, pageout, text, Context, Error, Limits, Remap, Type, Value};
use proptest::prelude::*;

const ALL_TYPES: [Type; 12] = [
    Type::U8,
    Type::U16,
    Type::U32,
    Type::U64,
    Type::I8,
    Type::I16,
    Type::I32,
    Type::I64,
    Type::F32,
    Type::F64,
    Type::Str,
    Type::FStr,
];

/// Exhaustive check of the 12x12 coercion table against the rules as
/// stated: integer widening permitted same-signedness; unsigned->signed
/// permitted (value-fit is a runtime concern, not a static one); signed->
/// unsigned always forbidden; floats widen one direction only; fstr->str
/// permitted, str->fstr forbidden; every type coerces to itself.
#[test]
fn coercion_table_matches_the_documented_rules() {
    let unsigned = [Type::U8, Type::U16, Type::U32, Type::U64];
    let signed = [Type::I8, Type::I16, Type::I32, Type::I64];
    let rank = |t: Type| unsigned.iter().chain(signed.iter()).position(|&x| x == t);

    for &from in &ALL_TYPES {
        for &to in &ALL_TYPES {
            let expected = if from == to {
                true
            } else if unsigned.contains(&from) && unsigned.contains(&to) {
                rank(from) < rank(to)
            } else if signed.contains(&from) && signed.contains(&to) {
                rank(from) < rank(to)
            } else if unsigned.contains(&from) && signed.contains(&to) {
                true
            } else if signed.contains(&from) && unsigned.contains(&to) {
                false
            } else if from == Type::F32 && to == Type::F64 {
                true
            } else if from == Type::FStr && to == Type::Str {
                true
            } else {
                false
            };
            assert_eq!(
                cfgpack::coercible(from, to),
                expected,
                "coercible({from:?}, {to:?}) should be {expected}"
            );
        }
    }
}

fn default_literal(ty: Type) -> &'static str {
    match ty {
        Type::Str | Type::FStr => "\"\"",
        _ => "0",
    }
}

fn representative_value(ty: Type) -> Value<'static> {
    match ty {
        Type::U8 => Value::U8(1),
        Type::U16 => Value::U16(1),
        Type::U32 => Value::U32(1),
        Type::U64 => Value::U64(1),
        Type::I8 => Value::I8(1),
        Type::I16 => Value::I16(1),
        Type::I32 => Value::I32(1),
        Type::I64 => Value::I64(1),
        Type::F32 => Value::F32(1.0),
        Type::F64 => Value::F64(1.0),
        // Wire type is classified by decoded length, not the schema's
        // declared type, so the `str` case needs a payload longer than
        // `FSTR_MAX` to actually round-trip as a wire `Str` rather than
        // collapsing to `FStr` like the short case does.
        Type::Str => Value::Str("xxxxxxxxxxxxxxxxxxxx"),
        Type::FStr => Value::FStr("x"),
    }
}

/// Drives an actual `pagein` decode for every (from, to) pair in the
/// coercion table, rather than only checking the static `coercible()`
/// lookup: a page written by an entry of type `from` is loaded against a
/// schema declaring the same id as `to`, and success/failure must track
/// the table exactly.
#[test]
fn pagein_coercion_matches_the_table_for_every_pair() {
    let limits = Limits::default();
    for &from in &ALL_TYPES {
        for &to in &ALL_TYPES {
            let old_text = format!("demo 1\n1 a {} {}\n", from.tag(), default_literal(from));
            let m = text::measure(&old_text, &limits).unwrap();
            let mut ov = vec![0u64; m.entry_count];
            let mut osp = vec![0u8; m.str_pool_bytes];
            let old_schema = text::parse(&old_text, &limits, &mut ov, &mut osp).unwrap();
            let old_sizing = old_schema.sizing(&limits);
            let mut op = vec![0u8; old_sizing.presence_bitmap_bytes];
            let mut oso = vec![0u32; old_sizing.entry_count];
            let mut old_ctx = Context::init(&old_schema, limits, &mut ov, &mut op, &mut osp, &mut oso).unwrap();
            old_ctx.set_by_name("a", representative_value(from)).unwrap();

            let mut storage = [0u8; 64];
            let n = pageout(&old_ctx, &mut storage).unwrap();
            let blob = &storage[..n];

            let new_text = format!("demo 2\n1 a {} {}\n", to.tag(), default_literal(to));
            let m2 = text::measure(&new_text, &limits).unwrap();
            let mut nv = vec![0u64; m2.entry_count];
            let mut nsp = vec![0u8; m2.str_pool_bytes];
            let new_schema = text::parse(&new_text, &limits, &mut nv, &mut nsp).unwrap();
            let new_sizing = new_schema.sizing(&limits);
            let mut np = vec![0u8; new_sizing.presence_bitmap_bytes];
            let mut nso = vec![0u32; new_sizing.entry_count];
            let mut new_ctx =
                Context::init(&new_schema, limits, &mut nv, &mut np, &mut nsp, &mut nso).unwrap();

            let result = pagein(&mut new_ctx, blob, Remap::empty());
            assert_eq!(
                result.is_ok(),
                cfgpack::coercible(from, to),
                "pagein({from:?} -> {to:?}) was {result:?}"
            );
        }
    }
}

#[test]
fn entry_count_boundary_at_max_entries() {
    let limits = Limits::default();
    let ids: Vec<u16> = (1..=cfgpack::MAX_ENTRIES as u16).collect();
    let ok_text = build_schema_text(&ids);
    assert!(text::measure(&ok_text, &limits).is_ok());

    let mut over_ids = ids;
    over_ids.push(cfgpack::MAX_ENTRIES as u16 + 1);
    let bad_text = build_schema_text(&over_ids);
    assert!(matches!(
        text::measure(&bad_text, &limits),
        Err(Error::Bounds { .. })
    ));
}

#[test]
fn fstr_default_literal_boundary_at_fstr_max() {
    let limits = Limits::default();
    let at_max = "x".repeat(cfgpack::FSTR_MAX);
    let ok_text = format!("demo 1\n1 a fstr \"{at_max}\"\n");
    let m = text::measure(&ok_text, &limits).unwrap();
    let mut values = vec![0u64; m.entry_count];
    let mut str_pool = vec![0u8; m.str_pool_bytes];
    assert!(text::parse(&ok_text, &limits, &mut values, &mut str_pool).is_ok());

    let over_max = "x".repeat(cfgpack::FSTR_MAX + 1);
    let bad_text = format!("demo 1\n1 a fstr \"{over_max}\"\n");
    let mut values2 = vec![0u64; 1];
    let mut str_pool2 = vec![0u8; 64];
    assert!(matches!(
        text::parse(&bad_text, &limits, &mut values2, &mut str_pool2),
        Err(Error::StrTooLong { .. })
    ));
}

fn short_name(i: usize) -> String {
    // Stays within NAME_MAX (5 bytes) for any id below 100000.
    format!("n{i}")
}

fn build_schema_text(ids: &[u16]) -> String {
    let mut text = String::from("demo 1\n");
    for (i, id) in ids.iter().enumerate() {
        text.push_str(&format!("{id} {} u32 0\n", short_name(i)));
    }
    text
}

proptest! {
    #[test]
    fn entries_are_strictly_ascending_after_parse(
        mut ids in prop::collection::hash_set(1u16..=2000, 1..20)
    ) {
        let limits = Limits::default();
        let mut ids: Vec<u16> = ids.drain().collect();
        ids.sort_unstable();
        let schema_text = build_schema_text(&ids);
        let m = text::measure(&schema_text, &limits).unwrap();
        let mut values = vec![0u64; m.entry_count];
        let mut str_pool = vec![0u8; m.str_pool_bytes];
        let schema = text::parse(&schema_text, &limits, &mut values, &mut str_pool).unwrap();
        for w in schema.entries().windows(2) {
            prop_assert!(w[0].id < w[1].id);
        }
    }

    #[test]
    fn set_then_get_roundtrips_u32(v in any::<u32>()) {
        let limits = Limits::default();
        let schema_text = "demo 1\n1 a u32 0\n";
        let m = text::measure(schema_text, &limits).unwrap();
        let mut values = vec![0u64; m.entry_count];
        let mut str_pool = vec![0u8; m.str_pool_bytes];
        let schema = text::parse(schema_text, &limits, &mut values, &mut str_pool).unwrap();
        let sizing = schema.sizing(&limits);
        let mut present = vec![0u8; sizing.presence_bitmap_bytes];
        let mut str_offsets = vec![0u32; sizing.entry_count];
        let mut ctx = Context::init(&schema, limits, &mut values, &mut present, &mut str_pool, &mut str_offsets).unwrap();
        ctx.set_u32(1, v).unwrap();
        prop_assert_eq!(ctx.get_u32(1).unwrap(), v);
    }

    #[test]
    fn set_then_get_roundtrips_a_bounded_string(s in "[a-zA-Z0-9]{0,60}") {
        let limits = Limits::default();
        let schema_text = "demo 1\n1 a str \"\"\n";
        let m = text::measure(schema_text, &limits).unwrap();
        let mut values = vec![0u64; m.entry_count];
        let mut str_pool = vec![0u8; m.str_pool_bytes];
        let schema = text::parse(schema_text, &limits, &mut values, &mut str_pool).unwrap();
        let sizing = schema.sizing(&limits);
        let mut present = vec![0u8; sizing.presence_bitmap_bytes];
        let mut str_offsets = vec![0u32; sizing.entry_count];
        let mut ctx = Context::init(&schema, limits, &mut values, &mut present, &mut str_pool, &mut str_offsets).unwrap();
        ctx.set_str(1, &s).unwrap();
        prop_assert_eq!(ctx.get_str(1).unwrap(), s.as_str());
    }

    #[test]
    fn pageout_then_pagein_preserves_every_present_value(
        a in any::<u8>(), b in any::<u16>(), set_a in any::<bool>(), set_b in any::<bool>()
    ) {
        let limits = Limits::default();
        let schema_text = "demo 1\n1 a u8 0\n2 b u16 0\n";
        let m = text::measure(schema_text, &limits).unwrap();
        let mut values = vec![0u64; m.entry_count];
        let mut str_pool = vec![0u8; m.str_pool_bytes];
        let schema = text::parse(schema_text, &limits, &mut values, &mut str_pool).unwrap();
        let sizing = schema.sizing(&limits);
        let mut present = vec![0u8; sizing.presence_bitmap_bytes];
        let mut str_offsets = vec![0u32; sizing.entry_count];
        let mut ctx = Context::init(&schema, limits, &mut values, &mut present, &mut str_pool, &mut str_offsets).unwrap();
        if set_a { ctx.set_u8(1, a).unwrap(); }
        if set_b { ctx.set_u16(2, b).unwrap(); }

        let mut storage = [0u8; 64];
        let n = pageout(&ctx, &mut storage).unwrap();
        let blob = &storage[..n];

        let mut values2 = vec![0u64; m.entry_count];
        let mut str_pool2 = vec![0u8; m.str_pool_bytes];
        let mut present2 = vec![0u8; sizing.presence_bitmap_bytes];
        let mut str_offsets2 = vec![0u32; sizing.entry_count];
        let mut ctx2 = Context::init(&schema, limits, &mut values2, &mut present2, &mut str_pool2, &mut str_offsets2).unwrap();
        pagein(&mut ctx2, blob, Remap::empty()).unwrap();

        prop_assert_eq!(ctx2.get_u8(1).ok(), if set_a { Some(a) } else { None });
        prop_assert_eq!(ctx2.get_u16(2).ok(), if set_b { Some(b) } else { None });
    }

    #[test]
    fn peek_name_always_recovers_the_map_name(name in "[a-zA-Z][a-zA-Z0-9]{0,20}") {
        let limits = Limits::default();
        let schema_text = format!("{name} 1\n1 a u8 0\n");
        let m = text::measure(&schema_text, &limits).unwrap();
        let mut values = vec![0u64; m.entry_count];
        let mut str_pool = vec![0u8; m.str_pool_bytes];
        let schema = text::parse(&schema_text, &limits, &mut values, &mut str_pool).unwrap();
        let sizing = schema.sizing(&limits);
        let mut present = vec![0u8; sizing.presence_bitmap_bytes];
        let mut str_offsets = vec![0u32; sizing.entry_count];
        let ctx = Context::init(&schema, limits, &mut values, &mut present, &mut str_pool, &mut str_offsets).unwrap();

        let mut storage = [0u8; 64];
        let n = pageout(&ctx, &mut storage).unwrap();
        prop_assert_eq!(cfgpack::peek_name(&storage[..n], &limits).unwrap(), name.as_str());
    }

    #[test]
    fn value_as_raw_bits_roundtrips_every_integer_type(v in any::<u64>()) {
        // Every integer `Type` reconstructs the same truncated bit pattern
        // it was built from, regardless of signedness.
        for ty in [Type::U8, Type::U16, Type::U32, Type::U64, Type::I8, Type::I16, Type::I32, Type::I64] {
            let truncated = match ty {
                Type::U8 => v as u8 as u64,
                Type::U16 => v as u16 as u64,
                Type::U32 => v as u32 as u64,
                Type::U64 => v,
                Type::I8 => v as i64 as i8 as i64 as u64,
                Type::I16 => v as i64 as i16 as i64 as u64,
                Type::I32 => v as i64 as i32 as i64 as u64,
                Type::I64 => v,
                _ => unreachable!(),
            };
            let reconstructed = Value::from_raw_bits(ty, truncated).unwrap();
            prop_assert_eq!(reconstructed.as_raw_bits(), truncated);
        }
    }
}
