//! Forecasts daily file-audit record volumes.
//!
//! Audit records are read from NDJSON and bucketed into (date, AM/PM)
//! rows. A random forest is fitted on all but the most recent months
//! and scored on those. Models are saved as `<name>_model.json` and
//! served through a decode → predict → encode handler.

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ml;
