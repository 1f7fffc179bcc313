// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// Orchestrates the data, ml and infra layers into whole workflows.
//
// Rules for this layer:
//   - No tree/forest math here
//   - No printing here (that's Layer 1)
//   - No direct file parsing (that's Layer 4 and 6)
//
// Errors from the lower layers are typed PipelineErrors; here they
// are wrapped with anyhow context and passed up to the CLI.

/// Read → prepare → split, and report what came out
pub mod prepare_use_case;

/// The full training workflow, with optional deployment
pub mod train_use_case;

/// One request against a directory of saved models
pub mod predict_use_case;
