use std::{
    collections::{BTreeMap, BTreeSet},
    fs::OpenOptions,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::month;

/// One long-format fact: (group, year, month, registrations).
/// The month is kept as its three-letter uppercase code, exactly as
/// persisted; `month_number` converts it for chronological work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationRecord {
    pub group: String,
    pub year: i32,
    pub month: String,
    pub registrations: u64,
}

impl RegistrationRecord {
    pub fn month_number(&self) -> Option<u32> {
        month::number(&self.month)
    }
}

/// Append-only CSV store, one file per pipeline. The header row is written
/// once, on the first append; every later append only adds data rows, so the
/// file accumulates across years and across runs.
///
/// The store is written by a single run thread only; concurrent runs against
/// the same file are not supported.
pub struct FactStore {
    path: PathBuf,
    group_column: &'static str,
}

impl FactStore {
    pub fn new(path: impl Into<PathBuf>, group_column: &'static str) -> Self {
        Self {
            path: path.into(),
            group_column,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one completed year's records. Returns the number written.
    pub fn append_year(&self, records: &[RegistrationRecord]) -> Result<usize> {
        let write_header = match self.path.metadata() {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {} for append", self.path.display()))?;
        let mut writer = csv::Writer::from_writer(file);

        if write_header {
            writer.write_record([self.group_column, "Year", "Month", "Registrations"])?;
        }
        for record in records {
            let year = record.year.to_string();
            let registrations = record.registrations.to_string();
            writer.write_record([
                record.group.as_str(),
                year.as_str(),
                record.month.as_str(),
                registrations.as_str(),
            ])?;
        }
        writer
            .flush()
            .with_context(|| format!("flushing {}", self.path.display()))?;
        Ok(records.len())
    }

    /// Read every persisted record back, in file order.
    pub fn load(&self) -> Result<Vec<RegistrationRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;

        let mut records = Vec::new();
        for (idx, row) in reader.records().enumerate() {
            let row = row?;
            // +2: 1-based, after the header line
            let line = idx + 2;
            if row.len() < 4 {
                bail!(
                    "{} line {}: expected 4 fields, found {}",
                    self.path.display(),
                    line,
                    row.len()
                );
            }
            records.push(RegistrationRecord {
                group: row[0].trim().to_string(),
                year: row[1]
                    .trim()
                    .parse()
                    .with_context(|| format!("{} line {}: bad year", self.path.display(), line))?,
                month: row[2].trim().to_uppercase(),
                registrations: row[3].trim().parse().with_context(|| {
                    format!("{} line {}: bad registrations", self.path.display(), line)
                })?,
            });
        }
        Ok(records)
    }

    /// Years with at least one persisted record. Missing file reads as empty.
    pub fn years_present(&self) -> Result<BTreeSet<i32>> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }
        Ok(self.load()?.into_iter().map(|r| r.year).collect())
    }

    /// (Year → month codes present) map backing the completeness check: a
    /// failed year shows up here as a missing or partially covered key.
    pub fn coverage(&self) -> Result<BTreeMap<i32, BTreeSet<String>>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let mut map: BTreeMap<i32, BTreeSet<String>> = BTreeMap::new();
        for record in self.load()? {
            map.entry(record.year).or_default().insert(record.month);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn record(group: &str, year: i32, month: &str, registrations: u64) -> RegistrationRecord {
        RegistrationRecord {
            group: group.to_string(),
            year,
            month: month.to_string(),
            registrations,
        }
    }

    #[test]
    fn round_trip_preserves_the_fact_set() -> Result<()> {
        let tmp = tempdir()?;
        let store = FactStore::new(tmp.path().join("facts.csv"), "Category");

        let year_one = vec![record("2W", 2020, "JAN", 100), record("3W", 2020, "FEB", 5)];
        let year_two = vec![record("2W", 2021, "JAN", 130)];
        store.append_year(&year_one)?;
        store.append_year(&year_two)?;

        let loaded = store.load()?;
        let expected: Vec<RegistrationRecord> =
            year_one.into_iter().chain(year_two).collect();
        assert_eq!(loaded, expected);
        Ok(())
    }

    #[test]
    fn header_is_written_exactly_once() -> Result<()> {
        let tmp = tempdir()?;
        let store = FactStore::new(tmp.path().join("facts.csv"), "Manufacturer");

        store.append_year(&[record("HERO", 2020, "JAN", 1)])?;
        store.append_year(&[record("HERO", 2021, "JAN", 2)])?;

        let content = std::fs::read_to_string(store.path())?;
        let header_lines = content
            .lines()
            .filter(|l| l.starts_with("Manufacturer,"))
            .count();
        assert_eq!(header_lines, 1);
        assert!(content.starts_with("Manufacturer,Year,Month,Registrations"));
        Ok(())
    }

    #[test]
    fn years_present_tracks_appended_years() -> Result<()> {
        let tmp = tempdir()?;
        let store = FactStore::new(tmp.path().join("facts.csv"), "Category");
        assert!(store.years_present()?.is_empty());

        store.append_year(&[record("2W", 2020, "JAN", 1)])?;
        store.append_year(&[record("2W", 2022, "JAN", 1)])?;
        let years: Vec<i32> = store.years_present()?.into_iter().collect();
        assert_eq!(years, vec![2020, 2022]);
        Ok(())
    }

    #[test]
    fn coverage_exposes_missing_months() -> Result<()> {
        let tmp = tempdir()?;
        let store = FactStore::new(tmp.path().join("facts.csv"), "Category");
        store.append_year(&[
            record("2W", 2020, "JAN", 1),
            record("2W", 2020, "FEB", 2),
            record("3W", 2020, "JAN", 3),
        ])?;

        let coverage = store.coverage()?;
        let months: &BTreeSet<String> = &coverage[&2020];
        assert_eq!(months.len(), 2);
        assert!(months.contains("JAN") && months.contains("FEB"));
        Ok(())
    }

    #[test]
    fn quoted_group_names_survive_the_trip() -> Result<()> {
        let tmp = tempdir()?;
        let store = FactStore::new(tmp.path().join("facts.csv"), "Manufacturer");
        let original = record("FOO MOTORS, LTD", 2020, "JAN", 9);
        store.append_year(std::slice::from_ref(&original))?;
        assert_eq!(store.load()?, vec![original]);
        Ok(())
    }
}
