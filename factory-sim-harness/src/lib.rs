// factory-sim-harness/src/lib.rs
// ============================================================================
// Module: Factory Sim Eval Harness
// Description: Fixed-corpus runner that replays fixtures through the
//              pipeline and checks the quantified invariants.
// Purpose: Let a fixture corpus grow without the invariant-checking logic
//          caring where the fixtures came from.
// Dependencies: factory-sim-core, factory-sim-providers, serde_json
// ============================================================================

//! ## Overview
//! Grounded in the teacher's source/sink composition: a pluggable *source*
//! of inputs feeds a fixed processing step (`run_pipeline`), and the result
//! is reported through a fixed-shape `HarnessReport` rather than a sink,
//! since a harness run has exactly one observer — the caller.

pub mod invariants;
pub mod report;
pub mod runner;
pub mod source;

pub use invariants::Invariant;
pub use report::FixtureOutcome;
pub use report::HarnessReport;
pub use runner::run_harness;
pub use source::Fixture;
pub use source::FixtureSource;
pub use source::InMemoryFixtureSource;
