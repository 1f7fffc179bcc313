// ============================================================
// Layer 4: Record Loader
// ============================================================
// Reads the file-audit log: one JSON object per line.
//
// Lines are pulled in batches of `batch_size`. A batch is first
// decoded as a whole (every line must be valid JSON), then each
// value is projected down to the four columns we keep:
//
//   fil_creatn_dt, fil_creatn_time, fil_id, in_tot_rec_cnt
//
// Batches are appended in read order, and the trailing partial
// batch goes through the exact same path. Batching only bounds
// the decode step; the full dataset ends up in memory.
//
// Any bad line aborts the whole load. There is no skipping.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::domain::record::RawRecord;
use crate::domain::traits::RecordSource;
use crate::error::{PipelineError, PipelineResult};

/// Lines decoded together per batch
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

const KEY_DATE:  &str = "fil_creatn_dt";
const KEY_TIME:  &str = "fil_creatn_time";
const KEY_ID:    &str = "fil_id";
const KEY_COUNT: &str = "in_tot_rec_cnt";

/// Loads raw audit records from a newline-delimited JSON file.
pub struct JsonlLoader {
    path:       PathBuf,
    batch_size: usize,
}

impl JsonlLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path:       path.as_ref().to_path_buf(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

impl RecordSource for JsonlLoader {
    fn load_all(&self) -> PipelineResult<Vec<RawRecord>> {
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidConfig("batch size must be at least 1".into()));
        }

        let file = File::open(&self.path).map_err(|e| PipelineError::io(&self.path, e))?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        let mut batch: Vec<(usize, String)> = Vec::with_capacity(self.batch_size);
        let mut batches = 0usize;

        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| PipelineError::io(&self.path, e))?;
            batch.push((i + 1, line));

            if batch.len() == self.batch_size {
                records.extend(decode_batch(&batch)?);
                batch.clear();
                batches += 1;
                tracing::debug!("Decoded batch {} ({} records so far)", batches, records.len());
            }
        }

        // Remaining lines that did not fill a whole batch
        if !batch.is_empty() {
            records.extend(decode_batch(&batch)?);
            batches += 1;
        }

        tracing::info!(
            "Read {} records from '{}' in {} batches",
            records.len(),
            self.path.display(),
            batches
        );
        Ok(records)
    }
}

/// Decode every line of a batch, then project each value.
/// Takes `(line_number, text)` pairs so errors point at the file line.
pub fn decode_batch(lines: &[(usize, String)]) -> PipelineResult<Vec<RawRecord>> {
    let values = lines
        .iter()
        .map(|(n, text)| {
            serde_json::from_str::<Value>(text)
                .map(|v| (*n, v))
                .map_err(|e| PipelineError::Decode(format!("line {n}: {e}")))
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    values.iter().map(|(n, v)| project(*n, v)).collect()
}

/// Keep only the four columns of interest
fn project(line: usize, value: &Value) -> PipelineResult<RawRecord> {
    let obj = value.as_object().ok_or_else(|| PipelineError::Schema {
        line,
        reason: "expected a JSON object".into(),
    })?;

    let creation_date = string_field(line, obj, KEY_DATE)?;
    let creation_time = string_field(line, obj, KEY_TIME)?;

    // Identifiers show up both as strings and as bare numbers
    let file_id = match required(line, obj, KEY_ID)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => {
            return Err(PipelineError::Schema {
                line,
                reason: format!("'{KEY_ID}' must be a string or number"),
            })
        }
    };

    let record_count = required(line, obj, KEY_COUNT)?
        .as_u64()
        .ok_or_else(|| PipelineError::Schema {
            line,
            reason: format!("'{KEY_COUNT}' must be a non-negative integer"),
        })?;

    Ok(RawRecord::new(creation_date, creation_time, file_id, record_count))
}

fn required<'a>(line: usize, obj: &'a Map<String, Value>, key: &str) -> PipelineResult<&'a Value> {
    obj.get(key).ok_or_else(|| PipelineError::Schema {
        line,
        reason: format!("missing key '{key}'"),
    })
}

fn string_field(line: usize, obj: &Map<String, Value>, key: &str) -> PipelineResult<String> {
    required(line, obj, key)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| PipelineError::Schema {
            line,
            reason: format!("'{key}' must be a string"),
        })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn line(date: &str, time: &str, id: &str, count: u64) -> String {
        format!(
            r#"{{"fil_creatn_dt":"{date}","fil_creatn_time":"{time}","fil_id":"{id}","in_tot_rec_cnt":{count},"extra":"ignored"}}"#
        )
    }

    fn write_lines(lines: &[String]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        for l in lines {
            writeln!(f, "{l}").unwrap();
        }
        f
    }

    #[test]
    fn test_reads_all_records_in_order() {
        let lines: Vec<String> = (0..7)
            .map(|i| line("2024-01-15", "08.00.00", &format!("f{i}"), i))
            .collect();
        let f = write_lines(&lines);

        // Batch of 3 → two full batches plus a partial one
        let records = JsonlLoader::new(f.path()).with_batch_size(3).load_all().unwrap();

        assert_eq!(records.len(), 7);
        let ids: Vec<&str> = records.iter().map(|r| r.file_id.as_str()).collect();
        assert_eq!(ids, ["f0", "f1", "f2", "f3", "f4", "f5", "f6"]);
        assert_eq!(records[6].record_count, 6);
    }

    #[test]
    fn test_projects_four_fields() {
        let f = write_lines(&[line("2024-01-15", "13.05.09", "abc", 42)]);
        let records = JsonlLoader::new(f.path()).load_all().unwrap();
        assert_eq!(records, vec![RawRecord::new("2024-01-15", "13.05.09", "abc", 42)]);
    }

    #[test]
    fn test_numeric_file_id_is_stringified() {
        let f = write_lines(&[
            r#"{"fil_creatn_dt":"2024-01-15","fil_creatn_time":"08.00.00","fil_id":991,"in_tot_rec_cnt":1}"#.to_string(),
        ]);
        let records = JsonlLoader::new(f.path()).load_all().unwrap();
        assert_eq!(records[0].file_id, "991");
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        let f = write_lines(&[line("2024-01-15", "08.00.00", "a", 1), "{not json".to_string()]);
        let err = JsonlLoader::new(f.path()).load_all().unwrap_err();
        match err {
            PipelineError::Decode(msg) => assert!(msg.starts_with("line 2")),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_key_is_schema_error() {
        let f = write_lines(&[
            r#"{"fil_creatn_dt":"2024-01-15","fil_creatn_time":"08.00.00","in_tot_rec_cnt":1}"#.to_string(),
        ]);
        let err = JsonlLoader::new(f.path()).load_all().unwrap_err();
        match err {
            PipelineError::Schema { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("fil_id"));
            }
            other => panic!("expected Schema, got {other:?}"),
        }
    }

    #[test]
    fn test_non_object_line_is_schema_error() {
        for body in ["[1,2]", "\"text\"", "7", "null"] {
            let f = write_lines(&[line("2024-01-15", "08.00.00", "a", 1), body.to_string()]);
            let err = JsonlLoader::new(f.path()).load_all().unwrap_err();
            match err {
                PipelineError::Schema { line, reason } => {
                    assert_eq!(line, 2, "{body}");
                    assert!(reason.contains("object"), "{body}");
                }
                other => panic!("expected Schema for {body}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_negative_count_is_schema_error() {
        let f = write_lines(&[line("2024-01-15", "08.00.00", "a", 1).replace(":1,", ":-1,")]);
        let err = JsonlLoader::new(f.path()).load_all().unwrap_err();
        assert!(matches!(err, PipelineError::Schema { .. }));
    }

    #[test]
    fn test_empty_file_yields_no_records() {
        let f = NamedTempFile::new().unwrap();
        assert!(JsonlLoader::new(f.path()).load_all().unwrap().is_empty());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let f = NamedTempFile::new().unwrap();
        let err = JsonlLoader::new(f.path()).with_batch_size(0).load_all().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = JsonlLoader::new("/definitely/not/here.json").load_all().unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
