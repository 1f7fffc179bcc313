// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Everything that touches disk or a hosting service:
//
//   artifact_store.rs : writes `<name>_model.json` + train_config.json,
//                       and finds models again for serving
//
//   metrics.rs        : appends one CSV row per training run
//
//   deploy.rs         : upload / deploy / predict against a
//                       filesystem-backed model host

/// Model artifact and run-config persistence
pub mod artifact_store;

/// Per-run evaluation CSV
pub mod metrics;

/// Local implementation of the ModelHost / Endpoint traits
pub mod deploy;
