use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::store::RegistrationRecord;

/// A calendar month. Ordering is chronological, so a `BTreeMap` keyed by
/// `MonthKey` is already a time-sorted series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    fn ordinal(self) -> i32 {
        self.year * 12 + self.month as i32 - 1
    }

    /// The calendar month `n` months earlier. Growth references are always
    /// resolved this way, never by array offset, so gaps in a series cannot
    /// shift the comparison window.
    pub fn months_back(self, n: u32) -> Self {
        let ordinal = self.ordinal() - n as i32;
        Self {
            year: ordinal.div_euclid(12),
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }
}

/// Registrations per calendar month, chronologically ordered.
pub type Series = BTreeMap<MonthKey, u64>;

/// One month of a growth table. `None` marks an undefined metric: the
/// reference month is absent or zero. Undefined is never rendered as ±∞ or
/// as a zero pretending to be "no change".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub key: MonthKey,
    pub registrations: u64,
    pub yoy_pct: Option<f64>,
    pub qoq_pct: Option<f64>,
}

fn key_of(record: &RegistrationRecord) -> Option<MonthKey> {
    match record.month_number() {
        Some(month) => MonthKey::new(record.year, month),
        None => {
            warn!(month = %record.month, group = %record.group, "unknown month code; record ignored");
            None
        }
    }
}

/// Collapse records into a single monthly-total series. Records sharing a
/// (group, year, month) key, and records from different groups, sum.
pub fn monthly_series<'a, I>(records: I) -> Series
where
    I: IntoIterator<Item = &'a RegistrationRecord>,
{
    let mut series = Series::new();
    for record in records {
        if let Some(key) = key_of(record) {
            *series.entry(key).or_insert(0) += record.registrations;
        }
    }
    series
}

/// One series per group, each independently summed by month.
pub fn per_group_series(records: &[RegistrationRecord]) -> BTreeMap<String, Series> {
    let mut groups: BTreeMap<String, Series> = BTreeMap::new();
    for record in records {
        if let Some(key) = key_of(record) {
            *groups
                .entry(record.group.clone())
                .or_default()
                .entry(key)
                .or_insert(0) += record.registrations;
        }
    }
    groups
}

fn pct_change(current: u64, reference: Option<u64>) -> Option<f64> {
    match reference {
        Some(base) if base > 0 => {
            Some((current as f64 - base as f64) / base as f64 * 100.0)
        }
        _ => None,
    }
}

/// Trailing growth per month of a series:
/// YoY% against the same calendar month a year earlier, QoQ% against the
/// calendar month three months earlier.
pub fn growth_series(series: &Series) -> Vec<GrowthPoint> {
    series
        .iter()
        .map(|(&key, &registrations)| GrowthPoint {
            key,
            registrations,
            yoy_pct: pct_change(registrations, series.get(&key.months_back(12)).copied()),
            qoq_pct: pct_change(registrations, series.get(&key.months_back(3)).copied()),
        })
        .collect()
}

/// Growth of the aggregate: sum first, then grow the single summed series.
/// Growth values are never averaged across groups.
pub fn aggregate_growth(records: &[RegistrationRecord]) -> Vec<GrowthPoint> {
    growth_series(&monthly_series(records))
}

/// "—" for undefined, two decimals otherwise.
pub fn fmt_pct(pct: Option<f64>) -> String {
    match pct {
        Some(v) => format!("{v:.2}%"),
        None => "—".to_string(),
    }
}
