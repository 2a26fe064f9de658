//! End-to-end migration scenarios, exercised entirely through the public
//! API: parse a schema, bind a context, page it out, then page a blob
//! back in against a second (possibly different) schema.

use cfgpack::{pagein, pageout, text, Context, Error, Limits, Remap};

struct Bound {
    values: Vec<u64>,
    present: Vec<u8>,
    str_pool: Vec<u8>,
    str_offsets: Vec<u32>,
}

fn parse_and_bind(schema_text: &str, limits: &Limits) -> (cfgpack::Schema, Bound) {
    let m = text::measure(schema_text, limits).unwrap();
    let mut values = vec![0u64; m.entry_count];
    let mut str_pool = vec![0u8; m.str_pool_bytes];
    let schema = text::parse(schema_text, limits, &mut values, &mut str_pool).unwrap();
    let bound = Bound {
        values,
        present: vec![0u8; schema.sizing(limits).presence_bitmap_bytes],
        str_pool,
        str_offsets: vec![0u32; m.entry_count],
    };
    (schema, bound)
}

fn bind<'a>(schema: &'a cfgpack::Schema, limits: Limits, b: &'a mut Bound) -> Context<'a> {
    Context::init(
        schema,
        limits,
        &mut b.values,
        &mut b.present,
        &mut b.str_pool,
        &mut b.str_offsets,
    )
    .unwrap()
}

#[test]
fn basic_round_trip_preserves_every_field() {
    let limits = Limits::default();
    let schema_text = "demo 1\n1 a u8 0\n2 b str \"\"\n3 c fstr \"\"\n";
    let (schema, mut b) = parse_and_bind(schema_text, &limits);
    let mut ctx = bind(&schema, limits, &mut b);

    ctx.set_u8(1, 9).unwrap();
    ctx.set_str(2, "hello").unwrap();
    ctx.set_fstr(3, "hi").unwrap();

    let mut storage = [0u8; 256];
    let n = pageout(&ctx, &mut storage).unwrap();
    let blob = &storage[..n];

    let mut b2 = Bound {
        values: vec![0u64; b.values.len()],
        present: vec![0u8; b.present.len()],
        str_pool: vec![0u8; b.str_pool.len()],
        str_offsets: vec![0u32; b.str_offsets.len()],
    };
    let mut ctx2 = bind(&schema, limits, &mut b2);
    pagein(&mut ctx2, blob, Remap::empty()).unwrap();

    assert_eq!(ctx2.get_u8(1).unwrap(), 9);
    assert_eq!(ctx2.get_str(2).unwrap(), "hello");
    assert_eq!(ctx2.get_fstr(3).unwrap(), "hi");
}

#[test]
fn widening_u8_to_u32_across_a_schema_revision() {
    let limits = Limits::default();
    let (old_schema, mut ob) = parse_and_bind("demo 1\n1 a u8 0\n", &limits);
    let mut old_ctx = bind(&old_schema, limits, &mut ob);
    old_ctx.set_u8(1, 250).unwrap();
    let mut storage = [0u8; 256];
    let n = pageout(&old_ctx, &mut storage).unwrap();
    let blob = &storage[..n];

    let (new_schema, mut nb) = parse_and_bind("demo 2\n1 a u32 0\n", &limits);
    let mut new_ctx = bind(&new_schema, limits, &mut nb);
    pagein(&mut new_ctx, blob, Remap::empty()).unwrap();
    assert_eq!(new_ctx.get_u32(1).unwrap(), 250);
}

#[test]
fn moving_a_field_to_a_new_id_via_remap() {
    let limits = Limits::default();
    let (old_schema, mut ob) = parse_and_bind("demo 1\n10 old u8 0\n", &limits);
    let mut old_ctx = bind(&old_schema, limits, &mut ob);
    old_ctx.set_u8(10, 3).unwrap();
    let mut storage = [0u8; 256];
    let n = pageout(&old_ctx, &mut storage).unwrap();
    let blob = &storage[..n];

    let (new_schema, mut nb) = parse_and_bind("demo 2\n20 moved u8 0\n", &limits);
    let mut new_ctx = bind(&new_schema, limits, &mut nb);
    pagein(&mut new_ctx, blob, Remap::new(&[(10, 20)])).unwrap();
    assert_eq!(new_ctx.get_u8(20).unwrap(), 3);
}

#[test]
fn removed_field_is_silently_dropped() {
    let limits = Limits::default();
    let (old_schema, mut ob) = parse_and_bind("demo 1\n1 gone u8 0\n2 kept u8 0\n", &limits);
    let mut old_ctx = bind(&old_schema, limits, &mut ob);
    old_ctx.set_u8(1, 1).unwrap();
    old_ctx.set_u8(2, 2).unwrap();
    let mut storage = [0u8; 256];
    let n = pageout(&old_ctx, &mut storage).unwrap();
    let blob = &storage[..n];

    let (new_schema, mut nb) = parse_and_bind("demo 2\n2 kept u8 0\n", &limits);
    let mut new_ctx = bind(&new_schema, limits, &mut nb);
    pagein(&mut new_ctx, blob, Remap::empty()).unwrap();
    assert_eq!(new_ctx.get_u8(2).unwrap(), 2);
}

#[test]
fn added_field_falls_back_to_its_parsed_default() {
    let limits = Limits::default();
    let (old_schema, mut ob) = parse_and_bind("demo 1\n1 a u8 0\n", &limits);
    let mut old_ctx = bind(&old_schema, limits, &mut ob);
    old_ctx.set_u8(1, 1).unwrap();
    let mut storage = [0u8; 256];
    let n = pageout(&old_ctx, &mut storage).unwrap();
    let blob = &storage[..n];

    let (new_schema, mut nb) = parse_and_bind("demo 2\n1 a u8 0\n2 b u8 77\n", &limits);
    let mut new_ctx = bind(&new_schema, limits, &mut nb);
    pagein(&mut new_ctx, blob, Remap::empty()).unwrap();
    assert_eq!(new_ctx.get_u8(1).unwrap(), 1);
    assert_eq!(new_ctx.get_u8(2).unwrap(), 77);
}

#[test]
fn narrowing_conversion_is_rejected() {
    let limits = Limits::default();
    let (old_schema, mut ob) = parse_and_bind("demo 1\n1 a u16 0\n", &limits);
    let mut old_ctx = bind(&old_schema, limits, &mut ob);
    old_ctx.set_u16(1, 40_000).unwrap();
    let mut storage = [0u8; 256];
    let n = pageout(&old_ctx, &mut storage).unwrap();
    let blob = &storage[..n];

    let (new_schema, mut nb) = parse_and_bind("demo 2\n1 a u8 0\n", &limits);
    let mut new_ctx = bind(&new_schema, limits, &mut nb);
    assert!(matches!(
        pagein(&mut new_ctx, blob, Remap::empty()),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn peek_name_recovers_the_map_name_without_a_live_context() {
    let limits = Limits::default();
    let (schema, mut b) = parse_and_bind("demo 1\n1 a u8 0\n", &limits);
    let ctx = bind(&schema, limits, &mut b);
    let mut storage = [0u8; 256];
    let n = pageout(&ctx, &mut storage).unwrap();
    let blob = &storage[..n];
    assert_eq!(cfgpack::peek_name(blob, &limits).unwrap(), "demo");
}
