// factory-sim-contract/src/requests.rs
// ============================================================================
// Module: Request/Response Envelopes
// Description: Wire shapes for the `/api/simulate` endpoint and CLI output.
// Purpose: One canonical serde shape instead of duplicating it per binding.
// Dependencies: factory-sim-core, serde, serde_json
// ============================================================================

//! ## Overview
//! `SimulateRequest`/`SimulateResponse` are the public contract of §6's HTTP
//! surface; the CLI builds the same response shape so both bindings stay in
//! lockstep.

use factory_sim_core::FactoryConfig;
use factory_sim_core::OnboardingMeta;
use factory_sim_core::PipelineDebugPayload;
use factory_sim_core::ScenarioMetrics;
use factory_sim_core::ScenarioSpec;
use serde::Deserialize;
use serde::Serialize;

/// Request body for a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateRequest {
    /// Free-form factory description text.
    pub factory_description: String,
    /// Operator's situation text.
    pub situation_text: String,
}

/// Request body for an onboarding-only run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardRequest {
    /// Free-form factory description text.
    pub factory_description: String,
}

/// Query parameters controlling whether the debug payload is included.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DebugQuery {
    /// When `true`, `debug` is populated on the response.
    #[serde(default)]
    pub debug: bool,
}

/// Response body for a completed simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateResponse {
    /// The factory the decision pipeline ran against.
    pub factory: FactoryConfig,
    /// Scenario specs simulated, in order.
    pub specs: Vec<ScenarioSpec>,
    /// Metrics for each spec, in the same order as `specs`.
    pub metrics: Vec<ScenarioMetrics>,
    /// Narrative feasibility briefing; always non-empty.
    pub briefing: String,
    /// Onboarding summary (fallback flag, errors, assumptions).
    pub meta: OnboardingMeta,
    /// Present only when the caller asked for it via [`DebugQuery`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<PipelineDebugPayload>,
}

/// Response body for an onboarding-only run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardResponse {
    /// The factory onboarding produced (or the toy-factory fallback).
    pub factory: FactoryConfig,
    /// Onboarding summary (fallback flag, errors, assumptions).
    pub meta: OnboardingMeta,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]
mod tests {
    use super::*;

    #[test]
    fn debug_query_defaults_to_false() {
        let query = DebugQuery::default();
        assert!(!query.debug);
    }

    #[test]
    fn simulate_response_omits_debug_field_when_none() {
        let response = SimulateResponse {
            factory: FactoryConfig { machines: Vec::new(), jobs: Vec::new() },
            specs: Vec::new(),
            metrics: Vec::new(),
            briefing: "all clear".to_owned(),
            meta: OnboardingMeta::default(),
            debug: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("debug").is_none());
    }
}
