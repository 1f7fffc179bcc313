// ============================================================
// Layer 5: ML / Model Layer
// ============================================================
// Everything that knows how a model is built or run.
//
//   tree.rs       : CART regression tree (SSE splits, flat node arena)
//   forest.rs     : bootstrap-bagged forest of trees, seeded
//   trainer.rs    : prepared rows → features/target → fit, plus MSE scoring
//   inferencer.rs : load / decode / predict / encode serving hooks
//
// Nothing outside this layer touches tree or forest internals;
// callers only see the Regressor trait.

/// Single regression tree
pub mod tree;

/// Random forest regressor built from trees
pub mod forest;

/// Training and evaluation wiring
pub mod trainer;

/// Serving-time adapter over a loaded ModelSet
pub mod inferencer;
