use strata_array::{Array, NullArray, PrimitiveArray};
use strata_error::{StrataResult, strata_bail, strata_err};

/// Rows stored as codes into a table of distinct values.
///
/// Every valid code is checked against the number of values on construction, so
/// [`DictArray::canonicalize`] never reads outside the dictionary.
#[derive(Clone, Debug)]
pub struct DictArray {
    codes: PrimitiveArray,
    values: Array,
}

impl DictArray {
    pub fn try_new(codes: PrimitiveArray, values: Array) -> StrataResult<Self> {
        let num_values = values.len() as u64;
        for (idx, code) in codes.u64_values()?.into_iter().enumerate() {
            if codes.validity().is_valid(idx) && code >= num_values {
                strata_bail!(
                    CorruptData: "Dictionary code {} at row {} exceeds dictionary of {} items",
                    code,
                    idx,
                    num_values
                )
            }
        }
        Ok(Self { codes, values })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> &PrimitiveArray {
        &self.codes
    }

    pub fn values(&self) -> &Array {
        &self.values
    }

    /// Gather the dictionary values addressed by the codes.
    ///
    /// Null codes gather the first dictionary entry and are masked by the codes' validity.
    pub fn canonicalize(&self) -> StrataResult<Array> {
        // Only null codes can address an empty dictionary.
        if self.values.is_empty() {
            return Ok(NullArray::new(self.len()).into());
        }
        let validity = self.codes.validity().clone();
        let indices = self
            .codes
            .u64_values()?
            .into_iter()
            .enumerate()
            .map(|(row, code)| {
                if validity.is_valid(row) {
                    usize::try_from(code)
                        .map_err(|_| strata_err!(CorruptData: "Dictionary code {} overflows usize", code))
                } else {
                    Ok(0)
                }
            })
            .collect::<StrataResult<Vec<_>>>()?;
        let gathered = self.values.take(&indices)?;
        if validity.is_nullable() {
            gathered.with_validity(validity)
        } else {
            Ok(gathered)
        }
    }
}
