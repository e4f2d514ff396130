use std::time::Duration;

use chromiumoxide::Page;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::{
    browser::{self, POLL_INTERVAL},
    error::ScrapeError,
    extract,
};

pub const DASHBOARD_URL: &str =
    "https://vahan.parivahan.gov.in/vahan4dashboard/vahan/view/reportview.xhtml";

/// Bounded wait applied to every single interaction step.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(20);

// Settle delays between steps tolerate the grid's asynchronous re-render.
// They are heuristics, not correctness guarantees; readiness is always
// re-checked with a bounded wait before the next read.
const MENU_SETTLE: Duration = Duration::from_secs(1);
const COMMIT_SETTLE: Duration = Duration::from_millis(500);
const AXIS_SETTLE: Duration = Duration::from_secs(2);
const REFRESH_SETTLE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Idle,
    AxisSet,
    YearSet,
    Refreshing,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Y,
    X,
}

impl Axis {
    pub fn control_id(self) -> &'static str {
        match self {
            Axis::Y => "yaxisVar",
            Axis::X => "xaxisVar",
        }
    }
}

const YEAR_CONTROL_ID: &str = "selectedYear";

/// Which states each operation may be driven from. Axis selection is legal
/// from Ready so a finished year (or a whole finished pipeline) can be
/// followed by a reconfiguration without restarting the session.
pub(crate) fn permits(state: NavState, operation: &'static str) -> bool {
    match operation {
        "select_axis" => matches!(state, NavState::Idle | NavState::AxisSet | NavState::Ready),
        "select_year" => matches!(state, NavState::AxisSet | NavState::YearSet | NavState::Ready),
        "refresh" => matches!(state, NavState::YearSet),
        _ => false,
    }
}

/// Drives the grid's filter controls through their dropdown → refresh → wait
/// cycle as an explicit state machine. Any failed interaction parks the
/// navigator in `Failed`; `reset` returns it to `Idle` so the caller can
/// re-drive the axes and continue with the next year.
pub struct Navigator<'a> {
    page: &'a Page,
    state: NavState,
}

impl<'a> Navigator<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self {
            page,
            state: NavState::Idle,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn reset(&mut self) {
        debug!(from = ?self.state, "navigator reset");
        self.state = NavState::Idle;
    }

    fn guard(&self, operation: &'static str) -> Result<(), ScrapeError> {
        if self.state == NavState::Failed {
            return Err(ScrapeError::NavigatorFailed { operation });
        }
        if !permits(self.state, operation) {
            return Err(ScrapeError::InvalidTransition {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    pub async fn select_axis(&mut self, axis: Axis, option: &str) -> Result<(), ScrapeError> {
        self.guard("select_axis")?;
        match self.drive_dropdown(axis.control_id(), option).await {
            Ok(()) => {
                sleep(AXIS_SETTLE).await;
                info!(axis = ?axis, option, "axis selected");
                self.state = NavState::AxisSet;
                Ok(())
            }
            Err(e) => {
                self.state = NavState::Failed;
                Err(e)
            }
        }
    }

    pub async fn select_year(&mut self, year: i32) -> Result<(), ScrapeError> {
        self.guard("select_year")?;
        match self.drive_dropdown(YEAR_CONTROL_ID, &year.to_string()).await {
            Ok(()) => {
                info!(year, "year selected");
                self.state = NavState::YearSet;
                Ok(())
            }
            Err(e) => {
                self.state = NavState::Failed;
                Err(e)
            }
        }
    }

    /// Trigger a data refresh and block until the grid is readable again:
    /// scrollable body present, month header present, first page of rows
    /// present.
    pub async fn refresh(&mut self) -> Result<(), ScrapeError> {
        self.guard("refresh")?;
        self.state = NavState::Refreshing;
        match self.do_refresh().await {
            Ok(()) => {
                debug!("grid ready");
                self.state = NavState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = NavState::Failed;
                Err(e)
            }
        }
    }

    /// Open a single-select menu, pick the option whose text matches
    /// exactly, then click the page body to commit and close the menu.
    async fn drive_dropdown(&self, control_id: &str, option: &str) -> Result<(), ScrapeError> {
        let trigger = browser::wait_for(
            self.page,
            &format!("#{control_id}"),
            &format!("dropdown #{control_id}"),
            WAIT_TIMEOUT,
        )
        .await?;
        trigger.click().await?;
        sleep(MENU_SETTLE).await;

        let item = browser::wait_for_text(
            self.page,
            "li",
            option,
            &format!("option {option:?} of #{control_id}"),
            WAIT_TIMEOUT,
        )
        .await?;
        item.click().await?;
        sleep(MENU_SETTLE).await;

        let body = browser::wait_for(self.page, "body", "page body", WAIT_TIMEOUT).await?;
        body.click().await?;
        sleep(COMMIT_SETTLE).await;
        Ok(())
    }

    async fn do_refresh(&self) -> Result<(), ScrapeError> {
        let refresh = self.find_refresh_control().await?;
        refresh.click().await?;
        sleep(REFRESH_SETTLE).await;

        browser::wait_for(self.page, extract::GRID_BODY, "grid body table", WAIT_TIMEOUT).await?;
        browser::wait_for_all(
            self.page,
            extract::MONTH_HEADER_CELLS,
            "month header row",
            WAIT_TIMEOUT,
        )
        .await?;
        browser::wait_for_all(
            self.page,
            extract::DATA_ROWS,
            "first page of data rows",
            WAIT_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    /// The refresh trigger is a button labelled "Refresh" on some report
    /// views and an `<input value="Refresh">` on others.
    async fn find_refresh_control(&self) -> Result<chromiumoxide::Element, ScrapeError> {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        loop {
            if let Ok(buttons) = self.page.find_elements("button").await {
                for button in buttons {
                    if let Ok(Some(text)) = button.inner_text().await {
                        if text.trim() == "Refresh" {
                            return Ok(button);
                        }
                    }
                }
            }
            if let Ok(input) = self.page.find_element("input[value='Refresh']").await {
                return Ok(input);
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::timeout("refresh control", WAIT_TIMEOUT));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_controls_map_to_grid_ids() {
        assert_eq!(Axis::Y.control_id(), "yaxisVar");
        assert_eq!(Axis::X.control_id(), "xaxisVar");
    }

    #[test]
    fn refresh_only_runs_with_a_year_committed() {
        assert!(permits(NavState::YearSet, "refresh"));
        for state in [
            NavState::Idle,
            NavState::AxisSet,
            NavState::Refreshing,
            NavState::Ready,
            NavState::Failed,
        ] {
            assert!(!permits(state, "refresh"), "{state:?}");
        }
    }

    #[test]
    fn year_requires_axes_first() {
        assert!(!permits(NavState::Idle, "select_year"));
        assert!(permits(NavState::AxisSet, "select_year"));
        assert!(permits(NavState::Ready, "select_year"));
    }

    #[test]
    fn ready_allows_reconfiguring_axes() {
        assert!(permits(NavState::Ready, "select_axis"));
        assert!(!permits(NavState::YearSet, "select_axis"));
    }
}
