// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// From the raw audit log to train/test rows:
//
//   file_audit.json
//       │
//       ▼
//   JsonlLoader       → batched NDJSON read, four columns kept
//       │
//       ▼
//   FeatureBuilder    → (date, cycle) aggregates + calendar features
//       │
//       ▼
//   split_by_months   → chronological train / test
//
// Each step is its own module and is tested on its own.

/// Reads newline-delimited JSON audit records in batches
pub mod loader;

/// Aggregates records into prepared (date, cycle) rows
pub mod features;

/// Chronological train/test split
pub mod splitter;
