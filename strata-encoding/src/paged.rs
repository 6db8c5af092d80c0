use std::ops::Range;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt, TryFutureExt, TryStreamExt, future, stream};
use itertools::Itertools;
use strata_array::Value;
use strata_error::StrataResult;

use crate::column::{ColumnDescriptor, ColumnReader, RowSpan};
use crate::decoder::check_rows;
use crate::zoned::ZonePredicate;

/// A column split into independently encoded pages of consecutive rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PagedColumn {
    pages: Vec<ColumnDescriptor>,
}

impl PagedColumn {
    pub fn new(pages: Vec<ColumnDescriptor>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &[ColumnDescriptor] {
        &self.pages
    }

    pub fn num_rows(&self) -> u64 {
        self.pages.iter().map(|p| p.num_rows).sum()
    }

    /// The pages intersecting `rows`, each with the page-local rows to read and the global row of
    /// the page's first row.
    fn plan(&self, rows: &Range<u64>) -> Vec<(ColumnDescriptor, Range<u64>, u64)> {
        let mut first_row = 0;
        let mut planned = Vec::new();
        for page in &self.pages {
            let page_rows = first_row..first_row + page.num_rows;
            let start = rows.start.max(page_rows.start);
            let end = rows.end.min(page_rows.end);
            if start < end {
                planned.push((page.clone(), start - first_row..end - first_row, first_row));
            }
            first_row = page_rows.end;
        }
        planned
    }

    /// Read the global row range `rows`, decoding the pages it spans concurrently. Spans are
    /// returned in row order with global row numbers.
    pub fn read(
        &self,
        reader: &ColumnReader,
        rows: Range<u64>,
        predicate: Option<Arc<dyn ZonePredicate>>,
    ) -> BoxFuture<'static, StrataResult<Vec<RowSpan>>> {
        if let Err(e) = check_rows(&rows, self.num_rows()) {
            return future::ready(Err(e)).boxed();
        }
        let planned = self.plan(&rows);
        log::debug!(
            "Reading rows {:?} from {} of {} pages",
            rows,
            planned.len(),
            self.pages.len()
        );
        let concurrency = reader.decoder().context().options().concurrency();
        let reader = reader.clone();
        stream::iter(planned.into_iter().map(move |(page, local, first_row)| {
            reader
                .read(&page, local, predicate.clone())
                .map_ok(move |spans| {
                    spans
                        .into_iter()
                        .map(|span| RowSpan {
                            rows: span.rows.start + first_row..span.rows.end + first_row,
                            array: span.array,
                        })
                        .collect::<Vec<_>>()
                })
        }))
        .buffered(concurrency)
        .try_collect::<Vec<_>>()
        .map_ok(|pages| pages.into_iter().flatten().collect::<Vec<_>>())
        .boxed()
    }

    /// Read the global row range `rows` as logical values, in row order.
    pub fn read_values(
        &self,
        reader: &ColumnReader,
        rows: Range<u64>,
    ) -> BoxFuture<'static, StrataResult<Vec<Value>>> {
        self.read(reader, rows, None)
            .and_then(|spans| {
                future::ready(
                    spans
                        .iter()
                        .map(|span| span.array.to_values())
                        .flatten_ok()
                        .collect::<StrataResult<Vec<_>>>(),
                )
            })
            .boxed()
    }
}
