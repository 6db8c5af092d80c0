// Compress a set of values into an FsstArray.

use fsst::Compressor;
use strata_array::BinaryArray;
use strata_error::StrataResult;

use crate::FsstArray;

/// Train a [compressor][Compressor] on the non-null values of an array.
pub fn fsst_train_compressor(array: &BinaryArray) -> StrataResult<Compressor> {
    let mut lines = Vec::with_capacity(array.len());
    for value in array.iter() {
        if let Some(b) = value? {
            lines.push(b);
        }
    }
    Ok(Compressor::train(&lines))
}

/// Compress every value of `strings` independently with `compressor`.
pub fn fsst_compress(strings: &BinaryArray, compressor: &Compressor) -> StrataResult<FsstArray> {
    let compressed = strings
        .iter()
        .map(|value| Ok(value?.map(|s| compressor.compress(s))))
        .collect::<StrataResult<Vec<_>>>()?;
    let codes = BinaryArray::from_iter_opt(compressed.iter().map(|v| v.as_deref()))
        .with_validity(strings.validity().clone())?;
    let symbols = compressor
        .symbol_table()
        .iter()
        .map(|s| s.to_u64())
        .collect();
    FsstArray::try_new(symbols, compressor.symbol_lengths().to_vec(), codes)
        .map_err(|err| err.with_context("Failed to compress BinaryArray with FSST"))
}
