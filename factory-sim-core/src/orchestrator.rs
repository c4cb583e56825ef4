// factory-sim-core/src/orchestrator.rs
// ============================================================================
// Module: Orchestrator
// Description: Sequences the ten pipeline stages, enforces the onboarding
//              fallback, and assembles the debug payload.
// Purpose: The single place mutable run state (the debug builder) lives.
// Dependencies: crate::{onboarding, decision, model, stage, gateway, toy_factory}
// ============================================================================

//! ## Overview
//! `run_pipeline` is the crate's one entry point. It owns no business logic
//! beyond sequencing, the fallback policy of §4.10, and computing
//! `overall_status`; every actual computation lives in a stage function.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use crate::decision;
use crate::gateway::ModelGateway;
use crate::model::FactoryConfig;
use crate::model::ScenarioMetrics;
use crate::model::ScenarioSpec;
use crate::onboarding;
use crate::stage::DebugInputs;
use crate::stage::InputPreview;
use crate::stage::OnboardingMeta;
use crate::stage::OverallStatus;
use crate::stage::PipelineDebugPayload;
use crate::stage::StageId;
use crate::stage::StageRecord;
use crate::stage::StageStatus;
use crate::toy_factory::toy_factory;

/// Default per-call timeout for LLM-backed stages (overridable by config).
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_millis(30_000);

// ============================================================================
// SECTION: Pipeline Output
// ============================================================================

/// Everything a caller (HTTP handler, CLI, harness) needs from one run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The factory the decision pipeline ran against (user-derived or the
    /// toy-factory fallback).
    pub factory: FactoryConfig,
    /// The scenario specs simulated, in order.
    pub specs: Vec<ScenarioSpec>,
    /// Metrics for each spec, in the same order.
    pub metrics: Vec<ScenarioMetrics>,
    /// The narrative briefing; always non-empty.
    pub briefing: String,
    /// Onboarding-specific summary.
    pub meta: OnboardingMeta,
    /// Full per-stage trace.
    pub debug: PipelineDebugPayload,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Runs O0–O4 against `factory_description`, substituting the toy factory
/// when onboarding fails, and returns the resulting factory, onboarding
/// errors, and per-stage records. Shared by [`run_pipeline`] and by
/// callers (e.g. the `/api/onboard` binding) that only need onboarding.
async fn run_onboarding(
    gateway: &dyn ModelGateway,
    factory_description: &str,
    timeout: Duration,
) -> (FactoryConfig, bool, Vec<String>, Vec<StageRecord>) {
    let mut stages: Vec<StageRecord> = Vec::with_capacity(5);
    let mut onboarding_errors: Vec<String> = Vec::new();

    let (explicit_ids, o0_record) = onboarding::run_o0(factory_description);
    stages.push(o0_record);

    let (coarse, o1_record) = onboarding::run_o1(gateway, factory_description, &explicit_ids, timeout).await;
    let o1_failed = o1_record.status != StageStatus::Success;
    collect_errors(&o1_record, &mut onboarding_errors);
    stages.push(o1_record);

    let (raw_factory, o2_record) = if o1_failed {
        (None, StageRecord::skipped(StageId::O2))
    } else {
        #[allow(clippy::unwrap_used, reason = "o1_failed is false only when coarse is Some")]
        onboarding::run_o2(gateway, factory_description, coarse.as_ref().unwrap(), timeout).await
    };
    let o2_failed = o1_failed || o2_record.status != StageStatus::Success;
    collect_errors(&o2_record, &mut onboarding_errors);
    stages.push(o2_record);

    let (normalized_factory, o3_record) = if o2_failed {
        (None, StageRecord::skipped(StageId::O3))
    } else {
        #[allow(clippy::unwrap_used, reason = "o2_failed is false only when raw_factory is Some")]
        onboarding::run_o3(raw_factory.as_ref().unwrap())
    };
    let o3_failed = o2_failed || o3_record.status != StageStatus::Success;
    collect_errors(&o3_record, &mut onboarding_errors);
    stages.push(o3_record);

    let (coverage_passed, o4_record) = if o3_failed {
        (false, StageRecord::skipped(StageId::O4))
    } else {
        #[allow(clippy::unwrap_used, reason = "o3_failed is false only when normalized_factory is Some")]
        onboarding::run_o4(normalized_factory.as_ref().unwrap(), &explicit_ids)
    };
    let o4_failed = o3_failed || o4_record.status != StageStatus::Success;
    collect_errors(&o4_record, &mut onboarding_errors);
    stages.push(o4_record);

    let used_default_factory = o4_failed || !coverage_passed;
    let factory = if used_default_factory {
        toy_factory()
    } else {
        #[allow(clippy::unwrap_used, reason = "o4_failed is false only when normalized_factory is Some")]
        normalized_factory.unwrap()
    };

    (factory, used_default_factory, onboarding_errors, stages)
}

/// Runs only O0–O4 against `factory_description`, for bindings (e.g.
/// `/api/onboard`) that don't need the decision half of the pipeline.
pub async fn run_onboarding_only(
    gateway: &dyn ModelGateway,
    factory_description: &str,
    timeout: Duration,
) -> (FactoryConfig, OnboardingMeta) {
    let (factory, used_default_factory, onboarding_errors, _stages) =
        run_onboarding(gateway, factory_description, timeout).await;
    let meta = OnboardingMeta { used_default_factory, onboarding_errors, inferred_assumptions: Vec::new() };
    (factory, meta)
}

/// Runs the full ten-stage pipeline against `factory_description` and
/// `situation_text`, using `gateway` for every LLM-backed stage.
pub async fn run_pipeline(
    gateway: &dyn ModelGateway,
    factory_description: &str,
    situation_text: &str,
    timeout: Duration,
) -> PipelineOutput {
    let (factory, used_default_factory, onboarding_errors, mut stages) =
        run_onboarding(gateway, factory_description, timeout).await;

    let (d1_spec, constraints, d1_record) = decision::run_d1(gateway, situation_text, &factory, timeout).await;
    stages.push(d1_record);

    let (specs, justification, d2_record) = decision::run_d2(gateway, &d1_spec, &factory, timeout).await;
    stages.push(d2_record);

    let (simulations, d3_record) = decision::run_d3(&factory, &specs);
    stages.push(d3_record);

    let (metrics, d4_record) = decision::run_d4(&simulations);
    stages.push(d4_record);

    let meta = OnboardingMeta {
        used_default_factory,
        onboarding_errors,
        inferred_assumptions: Vec::new(),
    };

    let (briefing, d5_record) =
        decision::run_d5(gateway, &metrics, &constraints, &justification, &meta, timeout).await;
    stages.push(d5_record);

    let overall_status = compute_overall_status(&stages, &briefing);

    let debug = PipelineDebugPayload {
        inputs: DebugInputs {
            factory_description: InputPreview::from_text(factory_description),
            situation_text: InputPreview::from_text(situation_text),
        },
        overall_status,
        stages,
    };

    PipelineOutput { factory, specs, metrics, briefing, meta, debug }
}

/// Appends a stage's errors, prefixed with its code, to the onboarding error
/// log.
fn collect_errors(record: &StageRecord, onboarding_errors: &mut Vec<String>) {
    for error in &record.errors {
        onboarding_errors.push(format!("{}: {error}", record.id));
    }
}

/// Implements §4.16's three-way `overall_status` decision.
fn compute_overall_status(stages: &[StageRecord], briefing: &str) -> OverallStatus {
    let all_success = stages.iter().all(|record| record.status == StageStatus::Success);
    if all_success {
        return OverallStatus::Success;
    }

    let onboarding_degraded = stages
        .iter()
        .any(|r| r.kind == crate::stage::StageKind::Onboarding && r.status != StageStatus::Success);
    let decision_usable = stages
        .iter()
        .filter(|r| r.kind == crate::stage::StageKind::Decision)
        .all(|r| r.status != StageStatus::Skipped);

    if onboarding_degraded && decision_usable && !briefing.trim().is_empty() {
        OverallStatus::Partial
    } else {
        OverallStatus::Failed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;
    use async_trait::async_trait;
    use serde_json::Value;
    use serde_json::json;

    struct AlwaysFailsGateway;

    #[async_trait]
    impl ModelGateway for AlwaysFailsGateway {
        async fn call_json(&self, _prompt: &str, _schema: &Value) -> Result<Value, GatewayError> {
            Err(GatewayError::Transport("connection refused".to_owned()))
        }
    }

    struct EchoGateway;

    #[async_trait]
    impl ModelGateway for EchoGateway {
        async fn call_json(&self, _prompt: &str, _schema: &Value) -> Result<Value, GatewayError> {
            Ok(json!({
                "machines": [{"id": "M1", "name": "Assembly"}],
                "jobs": [{
                    "id": "J1",
                    "name": "Widget",
                    "due_time_hour": 10,
                    "steps": [{"machine_id": "M1", "duration_hours": 2}],
                }],
                "scenario_type": "BASELINE",
                "constraints": "",
                "candidates": [{"scenario_type": "BASELINE", "constraints": ""}],
                "justification": "baseline is representative",
                "briefing": "# Briefing\n\nAll clear.",
            }))
        }
    }

    #[tokio::test]
    async fn llm_transport_failure_falls_back_to_toy_factory() {
        let output = run_pipeline(
            &AlwaysFailsGateway,
            "3 machines: M1, M2, M3. Job J1.",
            "normal day",
            Duration::from_millis(100),
        )
        .await;
        assert!(output.meta.used_default_factory);
        assert_eq!(output.debug.overall_status, OverallStatus::Partial);
        assert!(!output.briefing.trim().is_empty());
        assert_eq!(output.debug.stages.len(), 10);
    }

    #[tokio::test]
    async fn well_behaved_gateway_completes_with_real_factory() {
        let output = run_pipeline(
            &EchoGateway,
            "Machines M1. Jobs J1.",
            "normal day",
            Duration::from_millis(100),
        )
        .await;
        assert_eq!(output.debug.stages.len(), 10);
        assert_eq!(output.specs.len(), output.metrics.len());
        assert!(!output.specs.is_empty() && output.specs.len() <= 3);
        assert!(!output.meta.used_default_factory);
        assert_eq!(output.debug.overall_status, OverallStatus::Success);
    }
}
