use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::{fixture, rstest};
use strata_array::{BinaryArray, Value};

use crate::{FsstArray, fsst_compress, fsst_train_compressor};

#[fixture]
fn input_array() -> BinaryArray {
    BinaryArray::from_iter_opt([
        Some(&b"The Greeks never said that the limit could not be overstepped"[..]),
        None,
        Some(&b"They said it existed and that whoever dared to exceed it was mercilessly struck down"[..]),
        Some(&b"Nothing in present history can contradict them"[..]),
    ])
}

#[rstest]
fn round_trip(input_array: BinaryArray) {
    let compressor = fsst_train_compressor(&input_array).unwrap();
    let fsst = fsst_compress(&input_array, &compressor).unwrap();
    assert_eq!(fsst.len(), 4);
    assert_eq!(
        fsst.decompress().unwrap().to_values().unwrap(),
        input_array.to_values().unwrap()
    );
}

#[rstest]
fn symbol_table_survives_serialization(input_array: BinaryArray) {
    let compressor = fsst_train_compressor(&input_array).unwrap();
    let fsst = fsst_compress(&input_array, &compressor).unwrap();
    let table = fsst.symbol_table();
    assert_eq!(table.len(), 1 + fsst.symbols().len() * 9);

    let rebuilt = FsstArray::from_symbol_table(&table, fsst.codes().clone()).unwrap();
    assert_eq!(rebuilt.symbols(), fsst.symbols());
    assert_eq!(
        rebuilt.decompress().unwrap().value(3).unwrap(),
        Some(&b"Nothing in present history can contradict them"[..])
    );
}

#[rstest]
#[case(&[][..])]
#[case(&[3u8, 1, 2][..])]
fn truncated_symbol_table_is_corrupt(#[case] table: &[u8]) {
    let codes = BinaryArray::from_iter_opt([Some(&b"x"[..])]);
    let err = FsstArray::from_symbol_table(table, codes).unwrap_err();
    assert!(err.is_corrupt_data());
}

#[test]
fn random_strings() {
    let mut rng = StdRng::seed_from_u64(0);
    let words = ["alpha", "beta", "gamma", "delta", "epsilon"];
    let strings = (0..200)
        .map(|_| {
            if rng.random_bool(0.1) {
                None
            } else {
                let n = rng.random_range(0..6);
                Some(
                    (0..n)
                        .map(|_| words[rng.random_range(0..words.len())])
                        .collect::<Vec<_>>()
                        .join(" "),
                )
            }
        })
        .collect::<Vec<_>>();
    let array = BinaryArray::from_iter_opt(strings.iter().map(|s| s.as_deref().map(str::as_bytes)));
    let compressor = fsst_train_compressor(&array).unwrap();
    let decompressed = fsst_compress(&array, &compressor)
        .unwrap()
        .decompress()
        .unwrap();
    let expected = strings
        .iter()
        .map(|s| Value::from(s.as_deref()))
        .collect::<Vec<_>>();
    assert_eq!(decompressed.to_values().unwrap(), expected);
}
