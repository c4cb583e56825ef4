// factory-sim-contract/src/lib.rs
// ============================================================================
// Module: Factory Sim Contract Library
// Description: Canonical wire types and JSON schemas for the pipeline's
//              HTTP and CLI bindings.
// Purpose: Give the HTTP and CLI crates one shared, versioned shape for
//          requests, responses, and the schemas stage functions validate
//          against, instead of each binding hand-rolling its own.
// Dependencies: factory-sim-core, serde, serde_json
// ============================================================================

//! ## Overview
//! This crate holds no pipeline logic. It mirrors [`factory_sim_core`]'s
//! onboarding and decision schema builders under one roof, and defines the
//! request/response envelopes the HTTP and CLI crates serialize.

pub mod requests;
pub mod schemas;

pub use requests::DebugQuery;
pub use requests::OnboardRequest;
pub use requests::OnboardResponse;
pub use requests::SimulateRequest;
pub use requests::SimulateResponse;
