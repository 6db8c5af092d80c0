use fsst::{Decompressor, Symbol};
use strata_array::BinaryArray;
use strata_error::{StrataResult, strata_bail};

const SYMBOL_SIZE_BYTES: usize = 8;

/// Binary values compressed with a shared FSST symbol table.
#[derive(Clone, Debug)]
pub struct FsstArray {
    symbols: Vec<u64>,
    symbol_lengths: Vec<u8>,
    codes: BinaryArray,
}

impl FsstArray {
    /// Build an FSST array from its symbol table and compressed codes.
    ///
    /// Symbols are 8-byte little-endian words; `symbol_lengths[i]` is the number of meaningful
    /// bytes of `symbols[i]`.
    pub fn try_new(symbols: Vec<u64>, symbol_lengths: Vec<u8>, codes: BinaryArray) -> StrataResult<Self> {
        if symbols.len() > 255 {
            strata_bail!(CorruptData: "symbols array must have length <= 255")
        }
        if symbols.len() != symbol_lengths.len() {
            strata_bail!(CorruptData: "symbols and symbol_lengths arrays must have same length")
        }
        if let Some(len) = symbol_lengths.iter().find(|&&l| l == 0 || l as usize > SYMBOL_SIZE_BYTES) {
            strata_bail!(CorruptData: "symbol length {} outside 1..=8", len)
        }
        Ok(Self {
            symbols,
            symbol_lengths,
            codes,
        })
    }

    /// Rebuild an array from a serialized symbol table, see [`FsstArray::symbol_table`].
    pub fn from_symbol_table(table: &[u8], codes: BinaryArray) -> StrataResult<Self> {
        let Some((&count, rest)) = table.split_first() else {
            strata_bail!(CorruptData: "Empty FSST symbol table")
        };
        let count = count as usize;
        if rest.len() != count * (1 + SYMBOL_SIZE_BYTES) {
            strata_bail!(
                CorruptData: "FSST symbol table of {} symbols has {} bytes",
                count,
                table.len()
            )
        }
        let (lengths, symbols) = rest.split_at(count);
        let symbols = symbols
            .chunks_exact(SYMBOL_SIZE_BYTES)
            .map(|chunk| {
                let mut word = [0u8; SYMBOL_SIZE_BYTES];
                word.copy_from_slice(chunk);
                u64::from_le_bytes(word)
            })
            .collect();
        Self::try_new(symbols, lengths.to_vec(), codes)
    }

    /// Serialize the symbol table as `[count][count lengths][count little-endian symbols]`.
    pub fn symbol_table(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(1 + self.symbols.len() * (1 + SYMBOL_SIZE_BYTES));
        #[allow(clippy::cast_possible_truncation)]
        buffer.push(self.symbols.len() as u8);
        buffer.extend_from_slice(&self.symbol_lengths);
        for sym in &self.symbols {
            buffer.extend_from_slice(&sym.to_le_bytes());
        }
        buffer
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// The compressed values, one per row, with the original validity.
    pub fn codes(&self) -> &BinaryArray {
        &self.codes
    }

    pub fn symbols(&self) -> &[u64] {
        &self.symbols
    }

    pub fn symbol_lengths(&self) -> &[u8] {
        &self.symbol_lengths
    }

    /// Build a [`Decompressor`] that can be used to decompress values from this array, and pass
    /// it to the given function.
    pub fn with_decompressor<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Decompressor) -> R,
    {
        let symbols = self
            .symbols
            .iter()
            .map(|s| Symbol::from_slice(&s.to_le_bytes()))
            .collect::<Vec<_>>();
        f(Decompressor::new(&symbols, &self.symbol_lengths))
    }

    /// Decompress every value. Null rows stay null.
    pub fn decompress(&self) -> StrataResult<BinaryArray> {
        self.with_decompressor(|decompressor| {
            let values = self
                .codes
                .iter()
                .map(|v| Ok(v?.map(|compressed| decompressor.decompress(compressed))))
                .collect::<StrataResult<Vec<_>>>()?;
            BinaryArray::from_iter_opt(values.iter().map(|v| v.as_deref()))
                .with_validity(self.codes.validity().clone())
        })
    }
}
