use anyhow::Result;
use tracing::info;

use crate::{
    extract::RawRow,
    normalize::BucketTotals,
    store::{FactStore, RegistrationRecord},
};

/// Long-format records for the vehicle-type pipeline: one per
/// (bucket, month), zipping the month columns with each bucket's sums.
pub fn bucket_records(
    year: i32,
    months: &[String],
    buckets: &[BucketTotals],
) -> Vec<RegistrationRecord> {
    let mut records = Vec::with_capacity(buckets.len() * months.len());
    for bucket in buckets {
        for (month, &registrations) in months.iter().zip(&bucket.totals) {
            records.push(RegistrationRecord {
                group: bucket.bucket.to_string(),
                year,
                month: month.clone(),
                registrations,
            });
        }
    }
    records
}

/// Long-format records for the manufacturer pipeline: one per (row, month).
/// Duplicate labels produce independent record runs, as extracted.
pub fn row_records(year: i32, months: &[String], rows: &[RawRow]) -> Vec<RegistrationRecord> {
    let mut records = Vec::with_capacity(rows.len() * months.len());
    for row in rows {
        for (month, &registrations) in months.iter().zip(&row.values) {
            records.push(RegistrationRecord {
                group: row.label.clone(),
                year,
                month: month.clone(),
                registrations,
            });
        }
    }
    records
}

/// Persist one completed year before the run moves on, so a crash mid-run
/// loses at most the in-progress year.
pub fn append_year(store: &FactStore, year: i32, records: &[RegistrationRecord]) -> Result<()> {
    let written = store.append_year(records)?;
    info!(year, written, path = %store.path().display(), "year appended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn months(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn bucket_records_cover_every_bucket_month_pair() {
        let buckets = vec![
            BucketTotals {
                bucket: "2W",
                totals: vec![10, 20],
            },
            BucketTotals {
                bucket: "3W",
                totals: vec![1, 2],
            },
        ];
        let records = bucket_records(2020, &months(&["JAN", "FEB"]), &buckets);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].group, "2W");
        assert_eq!(records[0].month, "JAN");
        assert_eq!(records[0].registrations, 10);
        assert_eq!(records[3].group, "3W");
        assert_eq!(records[3].month, "FEB");
        assert_eq!(records[3].registrations, 2);
        assert!(records.iter().all(|r| r.year == 2020));
    }

    #[test]
    fn row_records_preserve_duplicate_labels() {
        let rows = vec![
            RawRow {
                label: "HERO MOTOCORP LTD".to_string(),
                values: vec![5],
            },
            RawRow {
                label: "HERO MOTOCORP LTD".to_string(),
                values: vec![7],
            },
        ];
        let records = row_records(2021, &months(&["JAN"]), &rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].registrations, 5);
        assert_eq!(records[1].registrations, 7);
    }
}
