use std::cmp::Ordering;

use bytes::Bytes;
use prost::Message;
use strata_array::Value;
use strata_error::{StrataResult, strata_bail};
use strata_proto::encodings as pb;

use crate::options::ZoneMapOptions;

/// Summary of the values of one zone of rows.
///
/// `min` is `None` only when every row of the zone is null. `max` is also `None` when the
/// largest value could not be bounded after truncation, in which case it is unbounded above.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneStatistics {
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub null_count: u64,
    pub row_count: u64,
}

impl ZoneStatistics {
    /// Compute the statistics of a zone, truncating binary bounds to `max_binary_len` bytes.
    pub fn compute(values: &[Value], max_binary_len: usize) -> Self {
        let null_count = values.iter().filter(|v| v.is_null()).count() as u64;
        let non_null = values.iter().filter(|v| !v.is_null());
        let min = non_null.clone().min().cloned();
        let max = non_null.max().cloned();
        Self {
            min: min.map(|v| lower_bound(v, max_binary_len)),
            max: max.and_then(|v| upper_bound(v, max_binary_len)),
            null_count,
            row_count: values.len() as u64,
        }
    }

    pub fn all_null(&self) -> bool {
        self.null_count == self.row_count
    }
}

/// A truncated prefix sorts before the value it was taken from.
fn lower_bound(value: Value, max_len: usize) -> Value {
    match value {
        Value::Bytes(b) if b.len() > max_len => Value::Bytes(b.slice(..max_len)),
        other => other,
    }
}

/// The smallest value of at most `max_len` bytes that sorts after every value with the same
/// prefix, or `None` if the prefix is all `0xFF`.
fn upper_bound(value: Value, max_len: usize) -> Option<Value> {
    match value {
        Value::Bytes(b) if b.len() > max_len => {
            let mut prefix = b[..max_len].to_vec();
            while prefix.last() == Some(&u8::MAX) {
                prefix.pop();
            }
            let last = prefix.last_mut()?;
            *last += 1;
            Some(Value::Bytes(Bytes::from(prefix)))
        }
        other => Some(other),
    }
}

/// Compare two statistics values. Values of different kinds are incomparable.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::UInt(a), Value::UInt(b)) => Some(a.cmp(b)),
        (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Per-zone statistics of a column, in row order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoneMap {
    zones: Vec<ZoneStatistics>,
}

impl ZoneMap {
    pub fn new(zones: Vec<ZoneStatistics>) -> Self {
        Self { zones }
    }

    /// Summarize `values` in zones of `options.rows_per_zone()` rows.
    pub fn build(values: &[Value], options: &ZoneMapOptions) -> Self {
        let rows_per_zone = options.rows_per_zone() as usize;
        Self::new(
            values
                .chunks(rows_per_zone)
                .map(|zone| ZoneStatistics::compute(zone, options.max_binary_stat_len()))
                .collect(),
        )
    }

    pub fn zones(&self) -> &[ZoneStatistics] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Check the zone map covers exactly `num_rows` rows in zones of `rows_per_zone`, every zone
    /// but the last holding a full zone of rows.
    pub fn check(&self, num_rows: u64, rows_per_zone: u32) -> StrataResult<()> {
        let rows_per_zone = u64::from(rows_per_zone);
        let expected = num_rows.div_ceil(rows_per_zone);
        if self.zones.len() as u64 != expected {
            strata_bail!(
                CorruptData: "Zone map holds {} zones, {} rows in zones of {} need {}",
                self.zones.len(),
                num_rows,
                rows_per_zone,
                expected
            )
        }
        for (idx, zone) in self.zones.iter().enumerate() {
            let start = idx as u64 * rows_per_zone;
            let rows = rows_per_zone.min(num_rows - start);
            if zone.row_count != rows {
                strata_bail!(
                    CorruptData: "Zone {} declares {} rows, expected {}",
                    idx,
                    zone.row_count,
                    rows
                )
            }
            if zone.null_count > zone.row_count {
                strata_bail!(
                    CorruptData: "Zone {} declares {} nulls in {} rows",
                    idx,
                    zone.null_count,
                    zone.row_count
                )
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(pb::ZoneMap::from(self).encode_to_vec())
    }

    pub fn try_from_bytes(bytes: &[u8]) -> StrataResult<Self> {
        Self::try_from(&pb::ZoneMap::decode(bytes)?)
    }
}

fn scalar_to_proto(value: &Value) -> Option<pb::Scalar> {
    let kind = match value {
        Value::UInt(v) => pb::scalar::Kind::Uint(*v),
        Value::Bytes(b) => pb::scalar::Kind::Binary(b.to_vec()),
        _ => return None,
    };
    Some(pb::Scalar { kind: Some(kind) })
}

fn scalar_from_proto(scalar: &pb::Scalar) -> StrataResult<Value> {
    match &scalar.kind {
        Some(pb::scalar::Kind::Uint(v)) => Ok(Value::UInt(*v)),
        Some(pb::scalar::Kind::Binary(b)) => Ok(Value::Bytes(Bytes::copy_from_slice(b))),
        None => strata_bail!(UnsupportedEncoding: "Zone statistic without a value"),
    }
}

impl From<&ZoneMap> for pb::ZoneMap {
    fn from(value: &ZoneMap) -> Self {
        Self {
            zones: value
                .zones
                .iter()
                .map(|zone| pb::ZoneStatistics {
                    min: zone.min.as_ref().and_then(scalar_to_proto),
                    max: zone.max.as_ref().and_then(scalar_to_proto),
                    null_count: zone.null_count,
                    row_count: zone.row_count,
                })
                .collect(),
        }
    }
}

impl TryFrom<&pb::ZoneMap> for ZoneMap {
    type Error = strata_error::StrataError;

    fn try_from(value: &pb::ZoneMap) -> StrataResult<Self> {
        let zones = value
            .zones
            .iter()
            .map(|zone| {
                if zone.null_count > zone.row_count {
                    strata_bail!(
                        CorruptData: "Zone with {} rows cannot hold {} nulls",
                        zone.row_count,
                        zone.null_count
                    )
                }
                Ok(ZoneStatistics {
                    min: zone.min.as_ref().map(scalar_from_proto).transpose()?,
                    max: zone.max.as_ref().map(scalar_from_proto).transpose()?,
                    null_count: zone.null_count,
                    row_count: zone.row_count,
                })
            })
            .collect::<StrataResult<Vec<_>>>()?;
        Ok(Self { zones })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strata_array::Value;

    use crate::options::ZoneMapOptions;
    use crate::zoned::zone_map::{ZoneMap, ZoneStatistics, upper_bound};

    #[test]
    fn statistics_skip_nulls() {
        let stats = ZoneStatistics::compute(
            &[Value::UInt(7), Value::Null, Value::UInt(3), Value::UInt(9)],
            8,
        );
        assert_eq!(stats.min, Some(Value::UInt(3)));
        assert_eq!(stats.max, Some(Value::UInt(9)));
        assert_eq!(stats.null_count, 1);
        assert_eq!(stats.row_count, 4);
    }

    #[test]
    fn truncated_bounds_stay_sound() {
        let values = [Value::from("banana"), Value::from("apricot")];
        let stats = ZoneStatistics::compute(&values, 3);
        assert_eq!(stats.min, Some(Value::from("apr")));
        assert_eq!(stats.max, Some(Value::from("bao")));
        assert!(values.iter().all(|v| stats.min.as_ref() <= Some(v)));
        assert!(values.iter().all(|v| stats.max.as_ref() > Some(v)));
    }

    #[rstest]
    #[case(&[0x61, 0xff, 0xff, 0x01], 3, Some(&[0x62][..]))]
    #[case(&[0xff, 0xff, 0xff], 2, None)]
    #[case(&[0x01, 0x02], 4, Some(&[0x01, 0x02][..]))]
    fn upper_bounds(#[case] input: &[u8], #[case] max_len: usize, #[case] expected: Option<&[u8]>) {
        let bound = upper_bound(Value::Bytes(bytes::Bytes::copy_from_slice(input)), max_len);
        assert_eq!(bound.as_ref().and_then(Value::as_bytes), expected);
    }

    #[test]
    fn zone_map_bytes() {
        let values = (0..10u64)
            .map(|v| if v % 4 == 0 { Value::Null } else { Value::UInt(v) })
            .collect::<Vec<_>>();
        let zone_map = ZoneMap::build(&values, &ZoneMapOptions::default().with_rows_per_zone(4));
        assert_eq!(zone_map.len(), 3);
        zone_map.check(10, 4).unwrap();
        assert!(zone_map.check(13, 4).unwrap_err().is_corrupt_data());
        assert_eq!(ZoneMap::try_from_bytes(&zone_map.to_bytes()).unwrap(), zone_map);
    }

    fn zone(null_count: u64, row_count: u64) -> ZoneStatistics {
        ZoneStatistics {
            min: Some(Value::UInt(1)),
            max: Some(Value::UInt(9)),
            null_count,
            row_count,
        }
    }

    #[rstest]
    #[case::empty_zone(vec![zone(0, 0)], 4)]
    #[case::short_full_zone(vec![zone(0, 3), zone(0, 3)], 7)]
    #[case::long_last_zone(vec![zone(0, 4), zone(0, 4)], 7)]
    #[case::more_nulls_than_rows(vec![zone(5, 4)], 4)]
    fn inconsistent_zone_rows(#[case] zones: Vec<ZoneStatistics>, #[case] num_rows: u64) {
        assert!(
            ZoneMap::new(zones)
                .check(num_rows, 4)
                .unwrap_err()
                .is_corrupt_data()
        );
    }

    #[test]
    fn consistent_zone_rows() {
        ZoneMap::new(vec![zone(0, 4), zone(3, 3)]).check(7, 4).unwrap();
    }
}
