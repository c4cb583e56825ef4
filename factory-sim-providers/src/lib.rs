// factory-sim-providers/src/lib.rs
// ============================================================================
// Module: Factory Sim Providers
// Description: Concrete `ModelGateway` implementations.
// Purpose: Keep the one place model I/O actually happens outside the
//          backend-agnostic core crate, so swapping providers never touches
//          pipeline logic.
// Dependencies: factory-sim-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! Two implementations of [`factory_sim_core::ModelGateway`] live here: an
//! [`http::HttpModelGateway`] that speaks an OpenAI-compatible JSON-mode
//! chat completion endpoint, and a [`mock::MockModelGateway`] used by the
//! harness and by binding-crate tests that need a gateway without a network.

pub mod http;
pub mod mock;

pub use http::HttpModelGateway;
pub use http::HttpModelGatewayConfig;
pub use mock::MockModelGateway;
pub use mock::ScriptedResponse;
