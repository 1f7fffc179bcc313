// ============================================================
// Layer 4: Feature Builder
// ============================================================
// Turns raw audit records into one row per (date, cycle).
//
// Steps (applied in order):
//   1. Normalise creation time "HH.MM.SS" → "HH:MM:SS"
//   2. Combine date + time into a NaiveDateTime
//   3. Keep only the last five calendar years
//   4. Label each record AM or PM
//   5. Group by (date, cycle): count records, sum record counts
//   6. Derive day_of_week, month, is_weekday
//   7. Sort by (date, cycle)
//
// Grouping goes through a BTreeMap keyed by (date, cycle), so
// the output comes out unique and sorted without a separate
// sort pass.

use std::collections::BTreeMap;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};

use crate::domain::prepared_row::{Cycle, PreparedRow};
use crate::domain::record::RawRecord;
use crate::error::{PipelineError, PipelineResult};

/// Records older than `current_year - RETENTION_YEARS` are dropped
pub const RETENTION_YEARS: i32 = 5;

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

pub struct FeatureBuilder {
    current_year: i32,
}

impl FeatureBuilder {
    /// Builder anchored at an explicit year (tests, replays)
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    /// Builder anchored at the local clock's year
    pub fn for_today() -> Self {
        Self::new(Local::now().year())
    }

    pub fn earliest_year(&self) -> i32 {
        self.current_year - RETENTION_YEARS
    }

    pub fn build(&self, records: &[RawRecord]) -> PipelineResult<Vec<PreparedRow>> {
        tracing::debug!("Processing dates and times for {} records", records.len());
        let stamps = records
            .iter()
            .map(|r| {
                parse_datetime(&r.creation_date, &normalize_time(&r.creation_time))
                    .map(|dt| (dt, r.record_count))
            })
            .collect::<PipelineResult<Vec<_>>>()?;

        let earliest = self.earliest_year();
        let mut buckets: BTreeMap<(NaiveDate, Cycle), (u64, u64)> = BTreeMap::new();
        let mut kept = 0usize;

        for (dt, count) in stamps.into_iter().filter(|(dt, _)| dt.year() >= earliest) {
            let key = (dt.date(), Cycle::from_hour(dt.hour()));
            let (files, total) = buckets.entry(key).or_insert((0, 0));
            *files += 1;
            *total = total.checked_add(count).ok_or_else(|| {
                PipelineError::Overflow(format!(
                    "record total for {} {} exceeds {}",
                    key.0,
                    key.1,
                    u64::MAX
                ))
            })?;
            kept += 1;
        }

        tracing::info!(
            "Kept {} of {} records from {} onwards, {} (date, cycle) buckets",
            kept,
            records.len(),
            earliest,
            buckets.len()
        );

        let rows = buckets
            .into_iter()
            .map(|((date, cycle), (file_count, total_records))| {
                let day_of_week = date.weekday().num_days_from_monday();
                PreparedRow {
                    date,
                    cycle,
                    file_count,
                    total_records,
                    day_of_week,
                    month: date.month(),
                    is_weekday: day_of_week < 5,
                }
            })
            .collect();

        Ok(rows)
    }
}

/// "13.05.09" → "13:05:09". Every dot is replaced.
pub fn normalize_time(raw: &str) -> String {
    raw.replace('.', ":")
}

/// Combine an already-normalised time with its date
pub fn parse_datetime(date: &str, time: &str) -> PipelineResult<NaiveDateTime> {
    let combined = format!("{} {}", date.trim(), time.trim());
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&combined, fmt).ok())
        .ok_or(PipelineError::Parse(combined))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn rec(date: &str, time: &str, count: u64) -> RawRecord {
        RawRecord::new(date, time, "f", count)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_time() {
        assert_eq!(normalize_time("13.05.09"), "13:05:09");
    }

    #[test]
    fn test_parse_combined_datetime() {
        let dt = parse_datetime("2024-01-15", &normalize_time("13.05.09")).unwrap();
        assert_eq!(dt, ymd(2024, 1, 15).and_hms_opt(13, 5, 9).unwrap());
        assert_eq!(dt.to_string(), "2024-01-15 13:05:09");
    }

    #[test]
    fn test_unparseable_datetime() {
        let err = parse_datetime("2024-13-45", "99:00:00").unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));

        let builder = FeatureBuilder::new(2024);
        let err = builder.build(&[rec("not-a-date", "08.00.00", 1)]).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn test_cycle_labels() {
        let rows = FeatureBuilder::new(2024)
            .build(&[rec("2024-01-15", "08.00.00", 1), rec("2024-01-15", "20.00.00", 1)])
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cycle, Cycle::Am);
        assert_eq!(rows[1].cycle, Cycle::Pm);
    }

    #[test]
    fn test_same_bucket_aggregates() {
        let rows = FeatureBuilder::new(2024)
            .build(&[rec("2024-01-15", "08.00.00", 10), rec("2024-01-15", "09.30.00", 15)])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].file_count, 2);
        assert_eq!(rows[0].total_records, 25);
    }

    #[test]
    fn test_calendar_features() {
        let rows = FeatureBuilder::new(2024)
            .build(&[rec("2024-01-20", "10.00.00", 1), rec("2024-01-15", "10.00.00", 1)])
            .unwrap();

        // Monday
        assert_eq!(rows[0].date, ymd(2024, 1, 15));
        assert_eq!(rows[0].day_of_week, 0);
        assert!(rows[0].is_weekday);
        assert_eq!(rows[0].month, 1);

        // Saturday
        assert_eq!(rows[1].date, ymd(2024, 1, 20));
        assert_eq!(rows[1].day_of_week, 5);
        assert!(!rows[1].is_weekday);
    }

    #[test]
    fn test_bucket_total_overflow_is_an_error() {
        let err = FeatureBuilder::new(2024)
            .build(&[rec("2024-01-15", "08.00.00", u64::MAX), rec("2024-01-15", "09.00.00", 1)])
            .unwrap_err();
        assert!(matches!(err, PipelineError::Overflow(_)));

        // Separate buckets never add up
        let rows = FeatureBuilder::new(2024)
            .build(&[rec("2024-01-15", "08.00.00", u64::MAX), rec("2024-01-15", "20.00.00", 1)])
            .unwrap();
        assert_eq!(rows[0].total_records, u64::MAX);
    }

    #[test]
    fn test_five_year_boundary() {
        let rows = FeatureBuilder::new(2026)
            .build(&[rec("2021-06-01", "08.00.00", 1), rec("2020-12-31", "23.59.59", 1)])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date.year(), 2021);
    }

    #[test]
    fn test_all_filtered_gives_empty() {
        let rows = FeatureBuilder::new(2026).build(&[rec("2001-01-01", "08.00.00", 1)]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_rows_unique_and_sorted() {
        let records: Vec<RawRecord> = (0..60)
            .map(|i| {
                let day = 1 + (i * 7) % 28;
                let hour = (i * 5) % 24;
                rec(&format!("2024-03-{day:02}"), &format!("{hour:02}.15.00"), i as u64)
            })
            .collect();
        let rows = FeatureBuilder::new(2024).build(&records).unwrap();

        let keys: Vec<(NaiveDate, Cycle)> = rows.iter().map(|r| (r.date, r.cycle)).collect();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());

        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        let total_files: u64 = rows.iter().map(|r| r.file_count).sum();
        assert_eq!(total_files, 60);
    }
}
