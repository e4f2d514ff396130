// Reporting consumer of the persisted fact stores: reconstructs each series
// chronologically, computes YoY/QoQ, and prints the latest figures per group
// plus the aggregate (growth of the summed series, never a mean of growths).

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::{collections::BTreeMap, env, path::PathBuf};
use vahanscraper::{
    growth::{self, GrowthPoint},
    month, pipeline,
    store::FactStore,
};

#[derive(Serialize)]
struct ReportSection {
    dataset: &'static str,
    aggregate: Vec<GrowthPoint>,
    groups: BTreeMap<String, Vec<GrowthPoint>>,
}

fn main() -> Result<()> {
    let json = env::args().any(|a| a == "--json");
    let data_dir = PathBuf::from(env::var("VAHAN_DATA_DIR").unwrap_or_else(|_| "data".into()));

    let datasets = [
        ("vehicle categories", pipeline::VEHICLE_FACTS, "Category"),
        ("manufacturers", pipeline::MANUFACTURER_FACTS, "Manufacturer"),
    ];

    let mut sections = Vec::new();
    for (dataset, file, group_column) in datasets {
        let store = FactStore::new(data_dir.join(file), group_column);
        if !store.path().exists() {
            eprintln!("missing {}; run the scraper first", store.path().display());
            continue;
        }

        // Completeness check: a year a failed extraction left short shows up
        // as partial (Year, Month) coverage.
        for (year, months) in store.coverage()? {
            if months.len() < 12 {
                let missing: Vec<&str> = month::MONTH_CODES
                    .iter()
                    .copied()
                    .filter(|code| !months.contains(*code))
                    .collect();
                eprintln!(
                    "note: {} year {} covers {}/12 months (missing {})",
                    file,
                    year,
                    months.len(),
                    missing.join(", ")
                );
            }
        }

        let records = store.load()?;
        let aggregate = growth::aggregate_growth(&records);
        let groups: BTreeMap<String, Vec<GrowthPoint>> = growth::per_group_series(&records)
            .into_iter()
            .map(|(group, series)| (group, growth::growth_series(&series)))
            .collect();
        sections.push(ReportSection {
            dataset,
            aggregate,
            groups,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    println!(
        "vehicle registration growth — generated {}",
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    );
    for section in &sections {
        println!("\n== {} ==", section.dataset);
        if let Some(latest) = section.aggregate.last() {
            print_line("aggregate", latest);
        }
        for (group, points) in &section.groups {
            if let Some(latest) = points.last() {
                print_line(group, latest);
            }
        }
    }
    Ok(())
}

fn print_line(label: &str, point: &GrowthPoint) {
    println!(
        "{:<40} {} {:>4}  registrations {:>10}  YoY {:>9}  QoQ {:>9}",
        label,
        month::code(point.key.month).unwrap_or("?"),
        point.key.year,
        point.registrations,
        growth::fmt_pct(point.yoy_pct),
        growth::fmt_pct(point.qoq_pct),
    );
}
