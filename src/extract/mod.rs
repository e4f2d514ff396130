use std::time::Duration;

use chromiumoxide::Page;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{browser, error::ScrapeError, navigate::WAIT_TIMEOUT};

pub mod cell;

pub use cell::{CellPolicy, Parsed};

// The grid renders a fixed structure per report view: a scrollable body
// table, a three-row header whose last row carries the month columns, and a
// paginator whose "next" anchor flags the last page via ui-state-disabled.
pub const GRID_BODY: &str = "div.ui-datatable-scrollable-body table";
pub const MONTH_HEADER_CELLS: &str = "#groupingTable_head tr:nth-child(3) th";
pub const DATA_ROWS: &str = "#groupingTable_data tr";
const NEXT_PAGE: &str = "a.ui-paginator-next";
const DISABLED_MARKER: &str = "ui-state-disabled";

const PAGE_SETTLE: Duration = Duration::from_secs(1);

/// Safety net against a paginator that never reports its last page.
pub const PAGE_CEILING: usize = 200;

/// One data row: the group label plus one count per detected month column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub label: String,
    pub values: Vec<u64>,
}

/// A fully extracted year: the month columns and every valid row from every
/// page, in encounter order. Duplicate labels are preserved as-is.
#[derive(Debug, Clone)]
pub struct YearTable {
    pub months: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RowOutcome {
    Row(RawRow),
    /// Cell count below the label + months + trailing-total minimum, or the
    /// value slice does not line up with the month columns.
    BadShape { cells: usize },
    /// Unparsable cell under `CellPolicy::FailRow`.
    BadCell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorStatus {
    Active,
    LastPage,
}

/// Normalize the raw header cells into the month column set: trimmed,
/// uppercased, with empty cells and the trailing "TOTAL" column dropped.
pub fn month_columns(headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .map(|h| h.trim().to_uppercase())
        .filter(|h| !h.is_empty() && h != "TOTAL")
        .collect()
}

/// Classify one data row. The label sits at cell index 1; month values are
/// the contiguous cells between the label and the trailing aggregate column.
pub fn parse_row(cells: &[String], months: usize, policy: CellPolicy) -> RowOutcome {
    if cells.len() < months + 2 {
        return RowOutcome::BadShape { cells: cells.len() };
    }
    let label = cells[1].trim().to_uppercase();
    let value_cells = &cells[2..cells.len() - 1];
    if value_cells.len() != months {
        return RowOutcome::BadShape { cells: cells.len() };
    }
    match cell::resolve_cells(&label, value_cells, policy) {
        Some(values) => RowOutcome::Row(RawRow { label, values }),
        None => RowOutcome::BadCell,
    }
}

/// Decide the paginator state from the "next" anchor's class attribute.
pub fn paginator_status(class_attr: Option<&str>) -> PaginatorStatus {
    match class_attr {
        Some(class) if class.contains(DISABLED_MARKER) => PaginatorStatus::LastPage,
        _ => PaginatorStatus::Active,
    }
}

/// Refuse to advance past the page ceiling.
pub fn check_ceiling(next_page: usize, ceiling: usize) -> Result<(), ScrapeError> {
    if next_page > ceiling {
        Err(ScrapeError::PageCeiling(ceiling))
    } else {
        Ok(())
    }
}

/// Read the month header row once for the current year.
pub async fn read_month_columns(page: &Page) -> Result<Vec<String>, ScrapeError> {
    let cells = browser::wait_for_all(page, MONTH_HEADER_CELLS, "month header row", WAIT_TIMEOUT)
        .await?;
    let mut headers = Vec::with_capacity(cells.len());
    for cell in &cells {
        headers.push(browser::text_of(cell).await?);
    }
    Ok(month_columns(&headers))
}

/// Walk every page of the grid for the current year and collect all valid
/// rows. The navigator must have reported the grid ready before this runs.
pub async fn scrape_year(
    page: &Page,
    year: i32,
    policy: CellPolicy,
) -> Result<YearTable, ScrapeError> {
    let months = read_month_columns(page).await?;
    info!(year, months = ?months, "month columns detected");

    let mut rows: Vec<RawRow> = Vec::new();
    let mut page_num = 1usize;
    loop {
        let row_elements =
            browser::wait_for_all(page, DATA_ROWS, "data rows", WAIT_TIMEOUT).await?;
        debug!(year, page = page_num, rows = row_elements.len(), "scraping page");

        for (idx, row_element) in row_elements.iter().enumerate() {
            let mut cells = Vec::new();
            for td in row_element.find_elements("td").await? {
                cells.push(browser::text_of(&td).await?);
            }
            match parse_row(&cells, months.len(), policy) {
                RowOutcome::Row(row) => rows.push(row),
                RowOutcome::BadShape { cells: cell_count } => {
                    warn!(
                        year,
                        page = page_num,
                        row = idx + 1,
                        cells = cell_count,
                        "row skipped (invalid column count)"
                    );
                }
                RowOutcome::BadCell => {
                    warn!(
                        year,
                        page = page_num,
                        row = idx + 1,
                        "row dropped (unparsable cell)"
                    );
                }
            }
        }

        let next = match page.find_element(NEXT_PAGE).await {
            Ok(anchor) => anchor,
            Err(_) => {
                debug!(year, pages = page_num, "no pagination control; no further pages");
                break;
            }
        };
        match paginator_status(next.attribute("class").await?.as_deref()) {
            PaginatorStatus::LastPage => {
                debug!(year, pages = page_num, "last page reached");
                break;
            }
            PaginatorStatus::Active => {
                check_ceiling(page_num + 1, PAGE_CEILING)?;
                next.click().await?;
                sleep(PAGE_SETTLE).await;
                page_num += 1;
            }
        }
    }

    info!(year, rows = rows.len(), "extraction complete");
    Ok(YearTable { months, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn month_columns_drop_total_and_blanks() {
        let headers = cells(&["", "jan", "Feb", "TOTAL", "MAR"]);
        assert_eq!(month_columns(&headers), vec!["JAN", "FEB", "MAR"]);
    }

    #[test]
    fn valid_row_slices_between_label_and_trailing_total() {
        // serial, label, 3 months, trailing total
        let row = cells(&["1", "two wheeler(t)", "100", "1,200", "130", "1,430"]);
        match parse_row(&row, 3, CellPolicy::CoerceZero) {
            RowOutcome::Row(r) => {
                assert_eq!(r.label, "TWO WHEELER(T)");
                assert_eq!(r.values, vec![100, 1200, 130]);
            }
            other => panic!("expected valid row, got {other:?}"),
        }
    }

    #[test]
    fn short_rows_are_invalid() {
        let row = cells(&["1", "TWO WHEELER(T)", "100"]);
        assert_eq!(
            parse_row(&row, 3, CellPolicy::CoerceZero),
            RowOutcome::BadShape { cells: 3 }
        );
    }

    #[test]
    fn value_slice_must_match_month_count() {
        // 6 cells → 3 value cells, but 4 months detected
        let row = cells(&["1", "X", "1", "2", "3", "9"]);
        assert_eq!(
            parse_row(&row, 4, CellPolicy::CoerceZero),
            RowOutcome::BadShape { cells: 6 }
        );
    }

    #[test]
    fn unparsable_cell_policy_decides_row_fate() {
        let row = cells(&["1", "X", "10", "-", "30", "40"]);
        match parse_row(&row, 3, CellPolicy::CoerceZero) {
            RowOutcome::Row(r) => assert_eq!(r.values, vec![10, 0, 30]),
            other => panic!("expected coerced row, got {other:?}"),
        }
        assert_eq!(parse_row(&row, 3, CellPolicy::FailRow), RowOutcome::BadCell);
    }

    #[test]
    fn paginator_disabled_class_means_last_page() {
        assert_eq!(
            paginator_status(Some("ui-paginator-next ui-state-default ui-state-disabled")),
            PaginatorStatus::LastPage
        );
        assert_eq!(
            paginator_status(Some("ui-paginator-next ui-state-default")),
            PaginatorStatus::Active
        );
        assert_eq!(paginator_status(None), PaginatorStatus::Active);
    }

    #[test]
    fn ceiling_stops_a_paginator_that_never_disables() {
        // Simulate the page loop against a paginator that always reports
        // Active: the ceiling must end it.
        let mut page_num = 1usize;
        let pages_visited = loop {
            match check_ceiling(page_num + 1, PAGE_CEILING) {
                Ok(()) => page_num += 1,
                Err(ScrapeError::PageCeiling(n)) => {
                    assert_eq!(n, PAGE_CEILING);
                    break page_num;
                }
                Err(e) => panic!("unexpected error {e}"),
            }
        };
        assert_eq!(pages_visited, PAGE_CEILING);
    }
}
