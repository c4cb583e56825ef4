// factory-sim-contract/src/schemas.rs
// ============================================================================
// Module: Contract Schemas
// Description: JSON schema catalog for the LLM-backed pipeline stages.
// Purpose: Give HTTP/CLI bindings and eval harnesses one place to look up a
//          stage's input/output schema by stage id, instead of reaching
//          into factory-sim-core's stage modules directly.
// Dependencies: factory-sim-core, serde_json
// ============================================================================

//! ## Overview
//! Each `*_schema` function here simply re-exports the JSON Schema builder a
//! stage function in `factory_sim_core` already validates gateway output
//! against, so the schema used to drive an eval harness or a tool-calling
//! provider is always the one the pipeline itself enforces.

use factory_sim_core::StageId;
use serde_json::Value;

/// Returns the schema for the O1 coarse-structure extraction stage.
#[must_use]
pub fn o1_schema() -> Value {
    factory_sim_core::onboarding::o1_schema()
}

/// Returns the schema for the O2 fine-grained extraction stage.
#[must_use]
pub fn o2_schema() -> Value {
    factory_sim_core::onboarding::o2_schema()
}

/// Returns the schema for the D1 intent classification stage.
#[must_use]
pub fn d1_schema() -> Value {
    factory_sim_core::decision::d1_schema()
}

/// Returns the schema for the D2 futures/scenario expansion stage.
#[must_use]
pub fn d2_schema() -> Value {
    factory_sim_core::decision::d2_schema()
}

/// Looks up the JSON schema an LLM-backed stage validates its output
/// against, or `None` for a pure stage that never calls the gateway.
#[must_use]
pub fn schema_for_stage(stage: StageId) -> Option<Value> {
    match stage {
        StageId::O1 => Some(o1_schema()),
        StageId::O2 => Some(o2_schema()),
        StageId::D1 => Some(d1_schema()),
        StageId::D2 => Some(d2_schema()),
        StageId::O0 | StageId::O3 | StageId::O4 | StageId::D3 | StageId::D4 | StageId::D5 => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]
mod tests {
    use super::*;

    #[test]
    fn llm_backed_stages_have_schemas() {
        for stage in [StageId::O1, StageId::O2, StageId::D1, StageId::D2] {
            assert!(schema_for_stage(stage).is_some());
        }
    }

    #[test]
    fn pure_stages_have_no_schema() {
        for stage in [StageId::O0, StageId::O3, StageId::O4, StageId::D3, StageId::D4, StageId::D5] {
            assert!(schema_for_stage(stage).is_none());
        }
    }

    #[test]
    fn schemas_are_valid_json_schema_documents() {
        for stage in [StageId::O1, StageId::O2, StageId::D1, StageId::D2] {
            let schema = schema_for_stage(stage).unwrap();
            jsonschema::validator_for(&schema).unwrap();
        }
    }
}
