// factory-sim-http/src/state.rs
// ============================================================================
// Module: Application State
// Description: Shared axum handler state: the gateway and the per-call
//              timeout.
// Purpose: Give handlers the one thing they need without reaching into
//          config directly.
// Dependencies: factory-sim-core, std::sync
// ============================================================================

//! ## Overview
//! `AppState` is cheap to clone (an `Arc` and a `Duration`); axum clones it
//! once per request.

use std::sync::Arc;
use std::time::Duration;

use factory_sim_core::ModelGateway;

/// Shared state every handler receives.
#[derive(Clone)]
pub struct AppState {
    /// The gateway used for every LLM-backed stage.
    pub gateway: Arc<dyn ModelGateway>,
    /// Per-call timeout passed through to the orchestrator.
    pub timeout: Duration,
}

impl AppState {
    /// Builds state from a gateway and a timeout.
    #[must_use]
    pub fn new(gateway: Arc<dyn ModelGateway>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }
}
