// ============================================================
// Layer 3: Prepared Row Domain Type
// ============================================================
// One aggregated (date, cycle) observation with its calendar
// features. This is the unit the splitter and trainer consume.
//
// Feature vector order is fixed and shared with the inference
// request format:
//   [file_count, day_of_week, month, is_weekday]

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names of the feature vector, in order
pub const FEATURE_NAMES: [&str; 4] = ["file_count", "day_of_week", "month", "is_weekday"];

/// Name of the regression target
pub const TARGET_NAME: &str = "total_records";

/// Half of a day. `Am` sorts before `Pm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Cycle {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

impl Cycle {
    /// Hours 0..=11 are AM, 12..=23 are PM
    pub fn from_hour(hour: u32) -> Self {
        if hour < 12 { Cycle::Am } else { Cycle::Pm }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cycle::Am => "AM",
            Cycle::Pm => "PM",
        }
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate of every raw record sharing a (date, cycle) bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedRow {
    pub date:          NaiveDate,
    pub cycle:         Cycle,
    /// Number of raw records in the bucket
    pub file_count:    u64,
    /// Sum of `record_count` over the bucket
    pub total_records: u64,
    /// Monday = 0 .. Sunday = 6
    pub day_of_week:   u32,
    /// 1..=12
    pub month:         u32,
    pub is_weekday:    bool,
}

impl PreparedRow {
    /// Feature vector in `FEATURE_NAMES` order
    pub fn features(&self) -> Vec<f64> {
        vec![
            self.file_count as f64,
            self.day_of_week as f64,
            self.month as f64,
            if self.is_weekday { 1.0 } else { 0.0 },
        ]
    }

    pub fn target(&self) -> f64 {
        self.total_records as f64
    }
}

impl fmt::Display for PreparedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} file_count={} total_records={} day_of_week={} month={} is_weekday={}",
            self.date,
            self.cycle,
            self.file_count,
            self.total_records,
            self.day_of_week,
            self.month,
            self.is_weekday as u8,
        )
    }
}
