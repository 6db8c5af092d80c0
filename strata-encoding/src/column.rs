//! Nested columns: a column's own encoding plus the columns holding its list items or struct
//! fields.

use std::ops::Range;
use std::sync::Arc;

use futures::future::{BoxFuture, try_join_all};
use futures::{FutureExt, StreamExt, TryFutureExt, TryStreamExt, future, stream};
use strata_array::{Array, StructArray, Value};
use strata_error::{StrataResult, strata_bail};

use crate::buffer::BufferLocation;
use crate::compression::CompressionRegistry;
use crate::decoder::{ArrayFuture, Decoder, check_rows, row_count};
use crate::encoder::{ArrayEncoder, EncodingPlan, NestedValues};
use crate::node::{ArrayEncoding, ColumnEncoding, ZoneIndex};
use crate::options::EncodeOptions;
use crate::paged::PagedColumn;
use crate::store::BufferAllocator;
use crate::zoned::{ZoneMap, ZonePredicate};

/// A column's root encoding, its row count, and its child columns: one items column for a list,
/// one column per field for a struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub encoding: ColumnEncoding,
    pub num_rows: u64,
    pub children: Vec<ColumnDescriptor>,
}

impl ColumnDescriptor {
    pub fn new(encoding: ColumnEncoding, num_rows: u64) -> Self {
        Self {
            encoding,
            num_rows,
            children: vec![],
        }
    }

    pub fn with_children(mut self, children: Vec<ColumnDescriptor>) -> Self {
        self.children = children;
        self
    }
}

/// A decoded range of rows.
#[derive(Clone, Debug)]
pub struct RowSpan {
    pub rows: Range<u64>,
    pub array: Array,
}

/// Reads nested columns, attaching list items and struct fields to the arrays of their parents.
#[derive(Clone)]
pub struct ColumnReader {
    decoder: Decoder,
}

impl ColumnReader {
    pub fn new(decoder: Decoder) -> Self {
        Self { decoder }
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Read `rows` of a column, skipping the zones `predicate` rules out.
    ///
    /// The surviving row ranges are decoded concurrently and returned in row order. Rows of a
    /// returned span are not filtered: a span may still hold rows that do not match.
    pub fn read(
        &self,
        column: &ColumnDescriptor,
        rows: Range<u64>,
        predicate: Option<Arc<dyn ZonePredicate>>,
    ) -> BoxFuture<'static, StrataResult<Vec<RowSpan>>> {
        let ranges = self
            .decoder
            .prune(&column.encoding, rows, column.num_rows, predicate);
        let reader = self.clone();
        let column = column.clone();
        async move {
            let ranges = ranges.await?;
            let concurrency = reader.decoder.context().options().concurrency();
            stream::iter(ranges.into_iter().map(|rows| {
                reader
                    .read_array(&column, rows.clone())
                    .map_ok(move |array| RowSpan { rows, array })
            }))
            .buffered(concurrency)
            .try_collect::<Vec<_>>()
            .await
        }
        .boxed()
    }

    /// Read `rows` of a column as logical values.
    pub fn read_values(
        &self,
        column: &ColumnDescriptor,
        rows: Range<u64>,
    ) -> BoxFuture<'static, StrataResult<Vec<Value>>> {
        self.read_array(column, rows)
            .and_then(|array| future::ready(array.to_values()))
            .boxed()
    }

    /// The rows in `rows` matching `predicate`, with their values.
    pub fn scan(
        &self,
        column: &ColumnDescriptor,
        rows: Range<u64>,
        predicate: Arc<dyn ZonePredicate>,
    ) -> BoxFuture<'static, StrataResult<Vec<(u64, Value)>>> {
        let spans = self.read(column, rows, Some(predicate.clone()));
        async move {
            let mut matches = Vec::new();
            for span in spans.await? {
                for (row, value) in span.rows.zip(span.array.to_values()?) {
                    if predicate.matches(&value) {
                        matches.push((row, value));
                    }
                }
            }
            Ok(matches)
        }
        .boxed()
    }

    /// Decode `rows` of a column and, recursively, the matching rows of its children.
    pub fn read_array(&self, column: &ColumnDescriptor, rows: Range<u64>) -> ArrayFuture {
        self.try_read_array(column, rows)
            .unwrap_or_else(|e| future::ready(Err(e)).boxed())
    }

    fn try_read_array(&self, column: &ColumnDescriptor, rows: Range<u64>) -> StrataResult<ArrayFuture> {
        check_rows(&rows, column.num_rows)?;
        let node = column.encoding.values();
        Ok(match node.values() {
            ArrayEncoding::List(list) => {
                let [items] = column.children.as_slice() else {
                    strata_bail!(
                        CorruptData: "List column has {} child columns, expected one",
                        column.children.len()
                    )
                };
                if items.num_rows != list.num_items {
                    strata_bail!(
                        CorruptData: "List declares {} items, its item column has {} rows",
                        list.num_items,
                        items.num_rows
                    )
                }
                let list = self.decoder.decode(node, rows, column.num_rows);
                let reader = self.clone();
                let items = items.clone();
                async move {
                    let Array::List(list) = list.await? else {
                        strata_bail!(CorruptData: "List node decoded to a different array")
                    };
                    let item_range = list.item_range().clone();
                    let items = reader.read_array(&items, item_range).await?;
                    Ok(Array::List(list.with_items(items)?))
                }
                .boxed()
            }
            ArrayEncoding::Struct => {
                if let Some(field) = column.children.iter().find(|c| c.num_rows != column.num_rows) {
                    strata_bail!(
                        CorruptData: "Struct field has {} rows, struct has {}",
                        field.num_rows,
                        column.num_rows
                    )
                }
                let len = row_count(&rows)?;
                let fields = try_join_all(
                    column
                        .children
                        .iter()
                        .map(|field| self.read_array(field, rows.clone())),
                );
                async move { Ok(Array::from(StructArray::try_new(len, fields.await?)?)) }.boxed()
            }
            _ => self.decoder.decode(node, rows, column.num_rows),
        })
    }
}

/// Encodes nested columns.
#[derive(Clone, Debug, Default)]
pub struct ColumnWriter {
    encoder: ArrayEncoder,
    options: EncodeOptions,
}

impl ColumnWriter {
    pub fn new(compression: Arc<CompressionRegistry>, options: EncodeOptions) -> Self {
        Self {
            encoder: ArrayEncoder::new(compression),
            options,
        }
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Encode `values` and, recursively, the list items or struct fields they hold.
    pub fn write(
        &self,
        values: &[Value],
        plan: &EncodingPlan,
        allocator: &mut dyn BufferAllocator,
    ) -> StrataResult<ColumnDescriptor> {
        let encoded = self.encoder.encode(values, plan, allocator)?;
        let children = match (encoded.nested, plan) {
            (NestedValues::Leaf, _) => vec![],
            (NestedValues::ListItems(items), EncodingPlan::List { items: plan, .. }) => {
                vec![self.write(&items, plan, allocator)?]
            }
            (NestedValues::StructFields(fields), EncodingPlan::Struct { fields: plans }) => fields
                .iter()
                .zip(plans)
                .map(|(values, plan)| self.write(values, plan, allocator))
                .collect::<StrataResult<Vec<_>>>()?,
            (_, plan) => strata_bail!("Unexpected child values for a {} plan", plan.name()),
        };

        let mut encoding = ColumnEncoding::Values(encoded.node);
        if let Some(options) = self.options.zone_map() {
            if has_zone_statistics(plan) {
                let zone_map = ZoneMap::build(values, options);
                let zone_map_buffer = allocator.put(BufferLocation::Column, zone_map.to_bytes());
                log::debug!(
                    "Wrote {} zones of {} rows to {}",
                    zone_map.len(),
                    options.rows_per_zone(),
                    zone_map_buffer
                );
                encoding = ColumnEncoding::ZoneIndex(ZoneIndex {
                    rows_per_zone: options.rows_per_zone(),
                    zone_map_buffer,
                    inner: Arc::new(encoding),
                });
            }
        }

        Ok(ColumnDescriptor::new(encoding, encoded.num_rows).with_children(children))
    }

    /// Split `values` into pages of [`EncodeOptions::rows_per_page`] rows and encode each page.
    pub fn write_pages(
        &self,
        values: &[Value],
        plan: &EncodingPlan,
        allocator: &mut dyn BufferAllocator,
    ) -> StrataResult<PagedColumn> {
        let pages = values
            .chunks(self.options.rows_per_page())
            .map(|page| self.write(page, plan, allocator))
            .collect::<StrataResult<Vec<_>>>()?;
        Ok(PagedColumn::new(pages))
    }
}

/// Zone maps summarize integers and byte strings.
fn has_zone_statistics(plan: &EncodingPlan) -> bool {
    matches!(
        plan,
        EncodingPlan::Flat { .. }
            | EncodingPlan::Binary { .. }
            | EncodingPlan::Dictionary { .. }
            | EncodingPlan::Fsst { .. }
    )
}
