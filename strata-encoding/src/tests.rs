use std::ops::Range;
use std::sync::Arc;

use futures::executor::block_on;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;
use strata_array::Value;

use crate::{
    ColumnDescriptor, ColumnEncoding, ColumnReader, ColumnWriter, CompressionRegistry,
    DecodeContext, DecodeOptions, Decoder, EncodeOptions, EncodingPlan, InMemoryBuffers, Predicate,
    ZoneMapOptions, ZonePredicate,
};

fn writer(options: EncodeOptions) -> ColumnWriter {
    ColumnWriter::new(Arc::new(CompressionRegistry::default()), options)
}

fn reader(buffers: InMemoryBuffers) -> (Arc<InMemoryBuffers>, ColumnReader) {
    let buffers = Arc::new(buffers);
    let ctx = DecodeContext::new(buffers.clone())
        .with_options(DecodeOptions::default().with_concurrency(4));
    (buffers, ColumnReader::new(Decoder::new(ctx)))
}

fn rows(values: &[Value], rows: Range<u64>) -> Vec<Value> {
    values[rows.start as usize..rows.end as usize].to_vec()
}

fn maybe_null(rng: &mut StdRng, value: Value) -> Value {
    if rng.random_bool(0.15) {
        Value::Null
    } else {
        value
    }
}

const COLORS: [&str; 4] = ["red", "green", "blue", "cyan"];
const WORDS: [&str; 6] = ["", "a", "north", "south", "eastern", "westerly"];

fn random_struct(rng: &mut StdRng) -> Value {
    let id = Value::UInt(rng.random_range(0..1 << 20));
    let tags = Value::List(
        (0..rng.random_range(0..3))
            .map(|_| Value::from(WORDS[rng.random_range(0..WORDS.len())]))
            .collect(),
    );
    let embedding = Value::List(
        (0..3)
            .map(|_| {
                let item = Value::UInt(rng.random_range(0..256));
                maybe_null(rng, item)
            })
            .collect(),
    );
    let color = Value::from(COLORS[rng.random_range(0..COLORS.len())]);
    let url = Value::from(format!("https://example.com/{}/page", rng.random_range(0..20)).as_str());
    let big = Value::UInt(u64::from(rng.random::<u32>()));
    Value::Struct(vec![
        maybe_null(rng, id),
        maybe_null(rng, tags),
        maybe_null(rng, embedding),
        maybe_null(rng, color),
        maybe_null(rng, url),
        maybe_null(rng, big),
    ])
}

/// A list of structs holding one field of every kind of encoding.
fn nested_column(seed: u64, len: usize) -> (Vec<Value>, EncodingPlan) {
    let mut rng = StdRng::seed_from_u64(seed);
    let values = (0..len)
        .map(|_| {
            let row = Value::List((0..rng.random_range(0..4)).map(|_| random_struct(&mut rng)).collect());
            maybe_null(&mut rng, row)
        })
        .collect();
    let plan = EncodingPlan::list(EncodingPlan::structure(vec![
        EncodingPlan::flat(20),
        EncodingPlan::list(EncodingPlan::binary()),
        EncodingPlan::fixed_size_list(3, EncodingPlan::flat(8)),
        EncodingPlan::dictionary(2, EncodingPlan::binary()),
        EncodingPlan::fsst(),
        EncodingPlan::zstd(32),
    ]));
    (values, plan)
}

#[rstest]
#[case(0, EncodeOptions::default())]
#[case(1, EncodeOptions::default())]
#[case(
    2,
    EncodeOptions::default().with_zone_map(ZoneMapOptions::default().with_rows_per_zone(4))
)]
fn nested_round_trip(#[case] seed: u64, #[case] options: EncodeOptions) {
    let (values, plan) = nested_column(seed, 24);
    let mut buffers = InMemoryBuffers::new();
    let column = writer(options).write(&values, &plan, &mut buffers).unwrap();
    assert_eq!(column.num_rows, 24);
    let (_, reader) = reader(buffers);

    for start in 0..=24 {
        for end in start..=24 {
            assert_eq!(
                block_on(reader.read_values(&column, start..end)).unwrap(),
                rows(&values, start..end),
                "rows {start}..{end}"
            );
        }
    }
}

#[test]
fn out_of_range_read() {
    let (values, plan) = nested_column(3, 10);
    let mut buffers = InMemoryBuffers::new();
    let column = writer(EncodeOptions::default())
        .write(&values, &plan, &mut buffers)
        .unwrap();
    let (_, reader) = reader(buffers);
    assert!(
        block_on(reader.read_values(&column, 5..11))
            .unwrap_err()
            .is_range_error()
    );
}

#[test]
fn list_items_column_shorter_than_declared() {
    let values = vec![
        Value::List(vec![Value::UInt(1), Value::UInt(2)]),
        Value::List(vec![Value::UInt(3)]),
    ];
    let mut buffers = InMemoryBuffers::new();
    let mut column = writer(EncodeOptions::default())
        .write(&values, &EncodingPlan::list(EncodingPlan::flat(8)), &mut buffers)
        .unwrap();
    column.children[0].num_rows = 2;
    let (buffers, reader) = reader(buffers);
    assert!(
        block_on(reader.read_values(&column, 1..2))
            .unwrap_err()
            .is_corrupt_data()
    );
    assert_eq!(buffers.request_count(), 0);
}

fn wire_round_trip(column: &ColumnDescriptor) -> ColumnDescriptor {
    let encoding = ColumnEncoding::try_from_bytes(&column.encoding.to_bytes()).unwrap();
    ColumnDescriptor::new(encoding, column.num_rows)
        .with_children(column.children.iter().map(wire_round_trip).collect())
}

#[test]
fn descriptors_survive_serialization() {
    let (values, plan) = nested_column(4, 16);
    let mut buffers = InMemoryBuffers::new();
    let options = EncodeOptions::default().with_zone_map(ZoneMapOptions::default());
    let column = writer(options).write(&values, &plan, &mut buffers).unwrap();

    let restored = wire_round_trip(&column);
    assert_eq!(restored, column);
    let (_, reader) = reader(buffers);
    assert_eq!(block_on(reader.read_values(&restored, 0..16)).unwrap(), values);
}

#[test]
fn paged_reads_match_values() {
    let (values, plan) = nested_column(5, 40);
    let mut buffers = InMemoryBuffers::new();
    let paged = writer(EncodeOptions::default().with_rows_per_page(7))
        .write_pages(&values, &plan, &mut buffers)
        .unwrap();
    assert_eq!(paged.pages().len(), 6);
    assert_eq!(paged.num_rows(), 40);
    let (_, reader) = reader(buffers);

    for (start, end) in [(0, 40), (0, 7), (3, 4), (6, 8), (13, 29), (39, 40), (21, 21)] {
        assert_eq!(
            block_on(paged.read_values(&reader, start..end)).unwrap(),
            rows(&values, start..end),
            "rows {start}..{end}"
        );
    }
    assert!(
        block_on(paged.read_values(&reader, 30..41))
            .unwrap_err()
            .is_range_error()
    );
}

#[test]
fn paged_spans_use_global_rows() {
    let values = (0..30u64).map(Value::UInt).collect::<Vec<_>>();
    let mut buffers = InMemoryBuffers::new();
    let options = EncodeOptions::default()
        .with_rows_per_page(10)
        .with_zone_map(ZoneMapOptions::default().with_rows_per_zone(5));
    let paged = writer(options)
        .write_pages(&values, &EncodingPlan::flat(8), &mut buffers)
        .unwrap();
    let (_, reader) = reader(buffers);

    let predicate: Arc<dyn ZonePredicate> = Arc::new(Predicate::between(12u64, 23u64));
    let spans = block_on(paged.read(&reader, 3..28, Some(predicate))).unwrap();
    let rows = spans.iter().map(|s| s.rows.clone()).collect::<Vec<_>>();
    assert_eq!(rows, vec![10..20, 20..25]);
}

fn zoned_integers() -> Vec<Value> {
    (0..1000u64)
        .map(|i| if i % 17 == 0 { Value::Null } else { Value::UInt(i) })
        .chain(std::iter::repeat_n(Value::Null, 100))
        .collect()
}

fn zoned_strings() -> Vec<Value> {
    (0..600u64)
        .map(|i| match i % 11 {
            0 => Value::Null,
            _ => Value::from(format!("prefix-shared-{:04}", i / 3).as_str()),
        })
        .collect()
}

#[rstest]
#[case(zoned_integers(), EncodingPlan::flat(16), Predicate::between(250u64, 320u64))]
#[case(zoned_integers(), EncodingPlan::zstd(16), Predicate::Eq(Value::UInt(999)))]
#[case(zoned_integers(), EncodingPlan::flat(16), Predicate::at_least(940u64))]
#[case(zoned_integers(), EncodingPlan::flat(16), Predicate::at_most(10u64).or(Predicate::Eq(Value::UInt(700))))]
#[case(zoned_integers(), EncodingPlan::flat(16), Predicate::IsNotNull.and(Predicate::at_most(150u64)))]
#[case(zoned_integers(), EncodingPlan::dictionary(16, EncodingPlan::flat(16)), Predicate::Eq(Value::UInt(400)))]
#[case(zoned_strings(), EncodingPlan::binary(), Predicate::Eq(Value::from("prefix-shared-0042")))]
#[case(zoned_strings(), EncodingPlan::fsst(), Predicate::between("prefix-shared-0100", "prefix-shared-0110"))]
fn zone_pruning_is_sound(
    #[case] values: Vec<Value>,
    #[case] plan: EncodingPlan,
    #[case] predicate: Predicate,
) {
    let zone_map = ZoneMapOptions::default()
        .with_rows_per_zone(50)
        .with_max_binary_stat_len(16);
    let mut buffers = InMemoryBuffers::new();
    let column = writer(EncodeOptions::default().with_zone_map(zone_map))
        .write(&values, &plan, &mut buffers)
        .unwrap();
    assert!(matches!(column.encoding, ColumnEncoding::ZoneIndex(_)));
    let (buffers, reader) = reader(buffers);
    let num_rows = values.len() as u64;

    let expected = values
        .iter()
        .enumerate()
        .filter(|(_, v)| predicate.matches(v))
        .map(|(row, v)| (row as u64, v.clone()))
        .collect::<Vec<_>>();
    let predicate: Arc<dyn ZonePredicate> = Arc::new(predicate);
    let scanned = block_on(reader.scan(&column, 0..num_rows, predicate.clone())).unwrap();
    assert_eq!(scanned, expected);

    let spans = block_on(reader.read(&column, 0..num_rows, Some(predicate))).unwrap();
    let read_rows = spans.iter().map(|s| s.rows.end - s.rows.start).sum::<u64>();
    assert!(read_rows < num_rows, "read {read_rows} of {num_rows} rows");
    assert!(spans.windows(2).all(|w| w[0].rows.end < w[1].rows.start));
    assert!(buffers.request_count() > 0);
}

#[test]
fn pruning_skips_zone_fetches() {
    let values = zoned_integers();
    let zone_map = ZoneMapOptions::default().with_rows_per_zone(100);
    let mut buffers = InMemoryBuffers::new();
    let column = writer(EncodeOptions::default().with_zone_map(zone_map))
        .write(&values, &EncodingPlan::flat(16), &mut buffers)
        .unwrap();
    let (buffers, reader) = reader(buffers);

    let predicate: Arc<dyn ZonePredicate> = Arc::new(Predicate::between(250u64, 320u64));
    let spans = block_on(reader.read(&column, 0..1100, Some(predicate))).unwrap();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].rows, 200..400);

    // 16-bit values of rows 200..400
    let value_bytes = buffers
        .requests()
        .into_iter()
        .filter_map(|r| r.range)
        .map(|r| r.end - r.start)
        .max();
    assert_eq!(value_bytes, Some(400));
}

#[test]
fn empty_selection_fetches_only_zone_map() {
    let values = zoned_integers();
    let mut buffers = InMemoryBuffers::new();
    let column = writer(
        EncodeOptions::default().with_zone_map(ZoneMapOptions::default().with_rows_per_zone(100)),
    )
    .write(&values, &EncodingPlan::flat(16), &mut buffers)
    .unwrap();
    let (buffers, reader) = reader(buffers);

    let predicate: Arc<dyn ZonePredicate> = Arc::new(Predicate::Eq(Value::UInt(5000)));
    assert!(block_on(reader.scan(&column, 0..1100, predicate)).unwrap().is_empty());
    assert_eq!(buffers.request_count(), 1);
}
