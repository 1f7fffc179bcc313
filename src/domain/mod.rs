// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain structs, enums and traits describing what the pipeline
// works with. No file I/O and no model internals here.

/// One file-audit event read from the input file
pub mod record;

/// One aggregated (date, cycle) observation with calendar features
pub mod prepared_row;

/// Rectangular f64 matrix used for features and predictions
pub mod matrix;

/// Values exchanged with a hosting service
pub mod deployment;

/// Abstractions the other layers implement
pub mod traits;
