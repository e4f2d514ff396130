use std::time::Duration;

use thiserror::Error;

/// Failure modes of the UI-driven extraction.
///
/// Row-level anomalies (bad shape, unparsable cells) are absorbed and logged
/// where they occur and never surface here; everything in this enum is fatal
/// to the year being extracted, but must leave previously emitted years
/// untouched.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("timed out after {timeout:?} waiting for {what}")]
    NavigationTimeout { what: String, timeout: Duration },

    #[error("paginator still active after {0} pages; aborting year")]
    PageCeiling(usize),

    #[error("navigator is in the Failed state; reset before driving {operation}")]
    NavigatorFailed { operation: &'static str },

    #[error("{operation} not allowed from navigator state {state:?}")]
    InvalidTransition {
        operation: &'static str,
        state: crate::navigate::NavState,
    },

    #[error(transparent)]
    Browser(#[from] chromiumoxide::error::CdpError),
}

impl ScrapeError {
    pub(crate) fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        Self::NavigationTimeout {
            what: what.into(),
            timeout,
        }
    }
}
