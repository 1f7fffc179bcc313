// ============================================================
// Layer 4: Chronological Train/Test Splitter
// ============================================================
// Holds out the most recent months as the test set.
//
//   cutoff = max(date) - test_window_months
//   train  = rows with date <  cutoff
//   test   = rows with date >= cutoff
//
// No shuffling: the model is scored on days it has never seen
// and that come after everything it was trained on.
//
// Month arithmetic clamps to the end of the month, so
// 2024-08-31 minus 6 months is 2024-02-29.

use chrono::{Months, NaiveDate};

use crate::domain::prepared_row::PreparedRow;
use crate::error::{PipelineError, PipelineResult};

/// Months held out for testing unless configured otherwise
pub const DEFAULT_TEST_WINDOW_MONTHS: u32 = 6;

/// A chronological partition of prepared rows
#[derive(Debug, Clone)]
pub struct Split {
    pub train:  Vec<PreparedRow>,
    pub test:   Vec<PreparedRow>,
    pub cutoff: NaiveDate,
}

/// Split `prepared` at `max(date) - test_window_months`.
/// Row order is preserved inside each half.
pub fn split_by_months(prepared: Vec<PreparedRow>, test_window_months: u32) -> PipelineResult<Split> {
    let max_date = prepared
        .iter()
        .map(|r| r.date)
        .max()
        .ok_or_else(|| PipelineError::InsufficientData("no prepared rows to split".into()))?;

    let cutoff = max_date
        .checked_sub_months(Months::new(test_window_months))
        .ok_or_else(|| {
            PipelineError::InvalidConfig(format!(
                "test window of {test_window_months} months reaches before the calendar start"
            ))
        })?;

    let (train, test): (Vec<_>, Vec<_>) = prepared.into_iter().partition(|r| r.date < cutoff);

    tracing::debug!(
        "Split at {}: {} train rows, {} test rows",
        cutoff,
        train.len(),
        test.len()
    );

    Ok(Split { train, test, cutoff })
}
