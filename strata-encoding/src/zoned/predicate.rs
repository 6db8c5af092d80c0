use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};

use strata_array::Value;

use crate::zoned::zone_map::{ZoneStatistics, compare};

/// Whether a zone may contain rows matching a predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneDecision {
    MustScan,
    SkipZone,
}

impl ZoneDecision {
    pub fn from_skip(skip: bool) -> Self {
        if skip {
            ZoneDecision::SkipZone
        } else {
            ZoneDecision::MustScan
        }
    }

    pub fn is_skip(self) -> bool {
        self == ZoneDecision::SkipZone
    }
}

/// A predicate evaluated against zone statistics.
///
/// Pruning must be sound: a zone may only be skipped when [`ZonePredicate::matches`] is false
/// for every value in it.
pub trait ZonePredicate: Debug + Send + Sync {
    fn evaluate(&self, zone: &ZoneStatistics) -> ZoneDecision;

    fn matches(&self, value: &Value) -> bool;
}

/// Built-in predicates over a single column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    Eq(Value),
    /// Inclusive bounds; a missing bound is unbounded.
    Range {
        low: Option<Value>,
        high: Option<Value>,
    },
    IsNull,
    IsNotNull,
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn between(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Predicate::Range {
            low: Some(low.into()),
            high: Some(high.into()),
        }
    }

    pub fn at_least(low: impl Into<Value>) -> Self {
        Predicate::Range {
            low: Some(low.into()),
            high: None,
        }
    }

    pub fn at_most(high: impl Into<Value>) -> Self {
        Predicate::Range {
            low: None,
            high: Some(high.into()),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    fn skips(&self, zone: &ZoneStatistics) -> bool {
        match self {
            Predicate::Eq(value) => {
                zone.all_null()
                    || is(zone.min.as_ref(), value, Ordering::Greater)
                    || is(zone.max.as_ref(), value, Ordering::Less)
            }
            Predicate::Range { low, high } => {
                zone.all_null()
                    || low
                        .as_ref()
                        .is_some_and(|low| is(zone.max.as_ref(), low, Ordering::Less))
                    || high
                        .as_ref()
                        .is_some_and(|high| is(zone.min.as_ref(), high, Ordering::Greater))
            }
            Predicate::IsNull => zone.null_count == 0,
            Predicate::IsNotNull => zone.all_null(),
            Predicate::And(lhs, rhs) => lhs.skips(zone) || rhs.skips(zone),
            Predicate::Or(lhs, rhs) => lhs.skips(zone) && rhs.skips(zone),
        }
    }
}

/// Whether a known bound compares to `value` as `ordering`. Unknown bounds and incomparable
/// values never allow a skip.
fn is(bound: Option<&Value>, value: &Value, ordering: Ordering) -> bool {
    bound.and_then(|b| compare(b, value)) == Some(ordering)
}

impl ZonePredicate for Predicate {
    fn evaluate(&self, zone: &ZoneStatistics) -> ZoneDecision {
        ZoneDecision::from_skip(self.skips(zone))
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Predicate::Eq(expected) => !value.is_null() && value == expected,
            Predicate::Range { low, high } => {
                !value.is_null()
                    && low
                        .as_ref()
                        .is_none_or(|low| matches!(compare(value, low), Some(Ordering::Greater | Ordering::Equal)))
                    && high
                        .as_ref()
                        .is_none_or(|high| matches!(compare(value, high), Some(Ordering::Less | Ordering::Equal)))
            }
            Predicate::IsNull => value.is_null(),
            Predicate::IsNotNull => !value.is_null(),
            Predicate::And(lhs, rhs) => lhs.matches(value) && rhs.matches(value),
            Predicate::Or(lhs, rhs) => lhs.matches(value) || rhs.matches(value),
        }
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Eq(value) => write!(f, "= {value}"),
            Predicate::Range { low, high } => {
                let low = low.as_ref().map(ToString::to_string).unwrap_or_default();
                let high = high.as_ref().map(ToString::to_string).unwrap_or_default();
                write!(f, "in [{low}, {high}]")
            }
            Predicate::IsNull => write!(f, "is null"),
            Predicate::IsNotNull => write!(f, "is not null"),
            Predicate::And(lhs, rhs) => write!(f, "({lhs}) and ({rhs})"),
            Predicate::Or(lhs, rhs) => write!(f, "({lhs}) or ({rhs})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strata_array::Value;

    use crate::zoned::predicate::{Predicate, ZoneDecision, ZonePredicate};
    use crate::zoned::zone_map::ZoneStatistics;

    fn zone(min: u64, max: u64, null_count: u64) -> ZoneStatistics {
        ZoneStatistics {
            min: Some(Value::UInt(min)),
            max: Some(Value::UInt(max)),
            null_count,
            row_count: 10,
        }
    }

    #[rstest]
    #[case(Predicate::Eq(Value::UInt(5)), ZoneDecision::MustScan)]
    #[case(Predicate::Eq(Value::UInt(11)), ZoneDecision::SkipZone)]
    #[case(Predicate::Eq(Value::UInt(1)), ZoneDecision::SkipZone)]
    #[case(Predicate::between(12u64, 20u64), ZoneDecision::SkipZone)]
    #[case(Predicate::between(0u64, 2u64), ZoneDecision::MustScan)]
    #[case(Predicate::at_most(1u64), ZoneDecision::SkipZone)]
    #[case(Predicate::IsNull, ZoneDecision::SkipZone)]
    #[case(Predicate::IsNotNull, ZoneDecision::MustScan)]
    #[case(Predicate::Eq(Value::UInt(1)).or(Predicate::Eq(Value::UInt(4))), ZoneDecision::MustScan)]
    #[case(Predicate::IsNotNull.and(Predicate::at_least(11u64)), ZoneDecision::SkipZone)]
    #[case(Predicate::Eq(Value::from("x")), ZoneDecision::MustScan)]
    fn decisions(#[case] predicate: Predicate, #[case] expected: ZoneDecision) {
        assert_eq!(predicate.evaluate(&zone(2, 10, 0)), expected);
    }

    #[test]
    fn unbounded_max_never_skips_above() {
        let zone = ZoneStatistics {
            min: Some(Value::from("ab")),
            max: None,
            null_count: 0,
            row_count: 3,
        };
        assert_eq!(
            Predicate::Eq(Value::from("zz")).evaluate(&zone),
            ZoneDecision::MustScan
        );
        assert_eq!(
            Predicate::Eq(Value::from("aa")).evaluate(&zone),
            ZoneDecision::SkipZone
        );
    }

    #[test]
    fn all_null_zone() {
        let zone = ZoneStatistics {
            min: None,
            max: None,
            null_count: 4,
            row_count: 4,
        };
        assert!(Predicate::Eq(Value::UInt(0)).evaluate(&zone).is_skip());
        assert!(!Predicate::IsNull.evaluate(&zone).is_skip());
    }

    #[test]
    fn matches_values() {
        let predicate = Predicate::between(3u64, 5u64);
        assert!(predicate.matches(&Value::UInt(3)));
        assert!(predicate.matches(&Value::UInt(5)));
        assert!(!predicate.matches(&Value::UInt(6)));
        assert!(!predicate.matches(&Value::Null));
        assert!(Predicate::IsNull.matches(&Value::Null));
    }
}
