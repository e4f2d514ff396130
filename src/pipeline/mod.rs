use std::ops::RangeInclusive;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use tracing::{error, info, warn};

use crate::{
    emit,
    extract::{self, CellPolicy, YearTable},
    navigate::{Axis, Navigator},
    normalize,
    store::FactStore,
};

/// Batch window of the scrape. Each year is one dropdown → refresh →
/// extract cycle.
pub const YEARS: RangeInclusive<i32> = 2020..=2025;

pub const VEHICLE_FACTS: &str = "vehicle_type_wise_data_2020_2025.csv";
pub const MANUFACTURER_FACTS: &str = "manufacturer_wise_data_2020_2025.csv";

const Y_AXIS_VEHICLE: &str = "Vehicle Category";
const Y_AXIS_MAKER: &str = "Maker";
const X_AXIS_MONTH: &str = "Month Wise";

/// Vehicle-type pipeline: extract per-category rows, collapse them into the
/// 2W/3W/4W buckets, and persist the bucketed months year by year.
pub async fn run_vehicle_pipeline(
    page: &Page,
    store: &FactStore,
    years: RangeInclusive<i32>,
    policy: CellPolicy,
) -> Result<()> {
    info!(axis = Y_AXIS_VEHICLE, "vehicle-type pipeline start");
    run_pipeline(page, store, years, policy, Y_AXIS_VEHICLE, |year, table| {
        let buckets = normalize::bucket_totals(&table.rows, table.months.len());
        emit::bucket_records(year, &table.months, &buckets)
    })
    .await
}

/// Manufacturer pipeline: persist the raw per-manufacturer rows directly.
pub async fn run_manufacturer_pipeline(
    page: &Page,
    store: &FactStore,
    years: RangeInclusive<i32>,
    policy: CellPolicy,
) -> Result<()> {
    info!(axis = Y_AXIS_MAKER, "manufacturer pipeline start");
    run_pipeline(page, store, years, policy, Y_AXIS_MAKER, |year, table| {
        emit::row_records(year, &table.months, &table.rows)
    })
    .await
}

async fn run_pipeline<F>(
    page: &Page,
    store: &FactStore,
    years: RangeInclusive<i32>,
    policy: CellPolicy,
    y_axis: &'static str,
    to_records: F,
) -> Result<()>
where
    F: Fn(i32, &YearTable) -> Vec<crate::store::RegistrationRecord>,
{
    let mut nav = Navigator::new(page);
    set_axes(&mut nav, y_axis).await?;

    // Years already persisted are skipped up front: a restarted run neither
    // re-drives the grid for them nor appends duplicate rows.
    let done = store
        .years_present()
        .with_context(|| format!("scanning {}", store.path().display()))?;

    for year in years {
        if done.contains(&year) {
            warn!(year, "already present in store; skipping");
            continue;
        }
        match scrape_one_year(&mut nav, page, year, policy).await {
            Ok(table) => {
                let records = to_records(year, &table);
                emit::append_year(store, year, &records)?;
            }
            Err(err) => {
                // Fatal to this year only. Prior years are already durable;
                // the store simply stays short this year, which the
                // coverage check surfaces downstream.
                error!(year, %err, "year extraction failed; store left short this year");
                nav.reset();
                set_axes(&mut nav, y_axis).await?;
            }
        }
    }
    Ok(())
}

async fn set_axes(nav: &mut Navigator<'_>, y_axis: &'static str) -> Result<()> {
    nav.select_axis(Axis::Y, y_axis)
        .await
        .with_context(|| format!("setting Y-axis to {y_axis:?}"))?;
    nav.select_axis(Axis::X, X_AXIS_MONTH)
        .await
        .with_context(|| format!("setting X-axis to {X_AXIS_MONTH:?}"))?;
    Ok(())
}

async fn scrape_one_year(
    nav: &mut Navigator<'_>,
    page: &Page,
    year: i32,
    policy: CellPolicy,
) -> Result<YearTable, crate::error::ScrapeError> {
    nav.select_year(year).await?;
    nav.refresh().await?;
    extract::scrape_year(page, year, policy).await
}
