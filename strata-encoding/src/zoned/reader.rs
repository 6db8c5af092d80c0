use std::ops::Range;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::{FutureExt, TryFutureExt, future};
use strata_error::StrataResult;

use crate::buffer::BufferRef;
use crate::decoder::{Decoder, check_rows};
use crate::node::ColumnEncoding;
use crate::zoned::predicate::{ZoneDecision, ZonePredicate};
use crate::zoned::zone_map::ZoneMap;
use crate::zoned::SharedZoneMap;

impl Decoder {
    /// Get or fetch the zone map stored in `buffer`.
    ///
    /// Only the first caller fetches and parses the buffer, all other callers resolve to the same
    /// result.
    pub(crate) fn zone_map(&self, buffer: BufferRef) -> SharedZoneMap {
        self.context()
            .zone_maps
            .write()
            .entry(buffer)
            .or_insert_with(|| {
                let fetch = self.context().store().request(buffer, None);
                async move { ZoneMap::try_from_bytes(&fetch.await?) }
                    .map_err(Arc::new)
                    .boxed()
                    .shared()
            })
            .clone()
    }

    /// Narrow `rows` of a column to the row ranges that may hold values matching `predicate`.
    ///
    /// Zone indexes are evaluated outermost-first, each one narrowing the ranges left by the
    /// previous one. Without a predicate no zone map is read and `rows` is returned unchanged.
    pub fn prune(
        &self,
        column: &ColumnEncoding,
        rows: Range<u64>,
        num_rows: u64,
        predicate: Option<Arc<dyn ZonePredicate>>,
    ) -> BoxFuture<'static, StrataResult<Vec<Range<u64>>>> {
        if let Err(e) = check_rows(&rows, num_rows) {
            return future::ready(Err(e)).boxed();
        }
        let ranges = if rows.is_empty() { vec![] } else { vec![rows] };
        let Some(predicate) = predicate else {
            return future::ready(Ok(ranges)).boxed();
        };

        let decoder = self.clone();
        let mut column = column.clone();
        async move {
            let mut ranges = ranges;
            while let ColumnEncoding::ZoneIndex(zoned) = column {
                if ranges.is_empty() {
                    break;
                }
                let zone_map = decoder.zone_map(zoned.zone_map_buffer).await?;
                zone_map.check(num_rows, zoned.rows_per_zone)?;
                ranges = prune_ranges(&ranges, &zone_map, zoned.rows_per_zone, predicate.as_ref());
                column = zoned.inner.as_ref().clone();
            }
            Ok(ranges)
        }
        .boxed()
    }
}

/// Intersect `ranges` with the zones that must be scanned, merging adjacent survivors.
fn prune_ranges(
    ranges: &[Range<u64>],
    zone_map: &ZoneMap,
    rows_per_zone: u32,
    predicate: &dyn ZonePredicate,
) -> Vec<Range<u64>> {
    let rows_per_zone = u64::from(rows_per_zone);
    let mut survivors: Vec<Range<u64>> = Vec::new();
    let mut skipped = 0;
    for range in ranges {
        let first = range.start / rows_per_zone;
        let last = range.end.div_ceil(rows_per_zone);
        for (zone_idx, zone) in zone_map
            .zones()
            .iter()
            .enumerate()
            .take(usize::try_from(last).unwrap_or(usize::MAX))
            .skip(usize::try_from(first).unwrap_or(usize::MAX))
        {
            if predicate.evaluate(zone) == ZoneDecision::SkipZone {
                skipped += 1;
                continue;
            }
            let zone_start = zone_idx as u64 * rows_per_zone;
            let start = range.start.max(zone_start);
            let end = range.end.min(zone_start + rows_per_zone);
            match survivors.last_mut() {
                Some(prev) if prev.end == start => prev.end = end,
                _ => survivors.push(start..end),
            }
        }
    }
    log::debug!(
        "Zone pruning with {:?} skipped {} zones, scanning {:?}",
        predicate,
        skipped,
        survivors
    );
    survivors
}

#[cfg(test)]
mod tests {
    use strata_array::Value;

    use crate::options::ZoneMapOptions;
    use crate::zoned::predicate::Predicate;
    use crate::zoned::reader::prune_ranges;
    use crate::zoned::zone_map::ZoneMap;

    #[test]
    fn surviving_zones_merge() {
        // zones [0, 4) [4, 8) [8, 12) [12, 14) with values equal to the zone number
        let values = (0..14u64).map(|v| Value::UInt(v / 4)).collect::<Vec<_>>();
        let zone_map = ZoneMap::build(&values, &ZoneMapOptions::default().with_rows_per_zone(4));
        let predicate = Predicate::between(1u64, 2u64);
        assert_eq!(prune_ranges(&[0..14], &zone_map, 4, &predicate), vec![4..12]);
        assert_eq!(prune_ranges(&[6..9], &zone_map, 4, &predicate), vec![6..9]);
        assert_eq!(
            prune_ranges(&[0..14], &zone_map, 4, &Predicate::Eq(Value::UInt(3))),
            vec![12..14]
        );
        assert!(prune_ranges(&[0..3], &zone_map, 4, &predicate).is_empty());
    }
}
