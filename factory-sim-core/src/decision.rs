// factory-sim-core/src/decision.rs
// ============================================================================
// Module: Decision Pipeline (D1-D5)
// Description: Turns a validated factory plus operator situation text into
//              what-if scenarios, schedule metrics, and a narrative briefing.
// Purpose: Implement the five decision stages as independent, recorder-
//          wrapped functions the orchestrator sequences.
// Dependencies: serde_json, crate::{model, scheduler, metrics, gateway, stage}
// ============================================================================

//! ## Overview
//! Mirrors [`crate::onboarding`]'s shape: every stage returns
//! `(value, StageRecord)`. D1 and D2 never fail outward — a gateway error
//! degrades to `BASELINE` rather than halting the pipeline. D5 degrades to a
//! deterministic template rather than ever returning an empty briefing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::gateway::ModelGateway;
use crate::metrics::derive_metrics;
use crate::model::FactoryConfig;
use crate::model::JobId;
use crate::model::ScenarioMetrics;
use crate::model::ScenarioSpec;
use crate::model::ScenarioType;
use crate::scheduler::apply_scenario;
use crate::scheduler::schedule;
use crate::stage::OnboardingMeta;
use crate::stage::StageId;
use crate::stage::StageRecord;

// ============================================================================
// SECTION: D1 - Intent Classification
// ============================================================================

/// Raw intent classification output, before normalization against a factory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawIntent {
    /// The scenario type the model believes applies.
    #[serde(default)]
    pub scenario_type: Option<String>,
    /// The rush job id, if the model identified a `RUSH_ARRIVES` situation.
    #[serde(default)]
    pub rush_job_id: Option<String>,
    /// The slowdown factor, if the model identified an `M2_SLOWDOWN` situation.
    #[serde(default)]
    pub slowdown_factor: Option<u32>,
    /// Free-form constraint text, preserved for D5 regardless of coercion.
    #[serde(default)]
    pub constraints: String,
}

/// JSON schema for D1's expected response shape.
#[must_use]
pub fn d1_schema() -> Value {
    json!({
        "type": "object",
        "required": ["scenario_type", "constraints"],
        "properties": {
            "scenario_type": { "type": "string" },
            "rush_job_id": { "type": ["string", "null"] },
            "slowdown_factor": { "type": ["integer", "null"] },
            "constraints": { "type": "string" }
        }
    })
}

/// Normalizes a [`RawIntent`] into a well-formed [`ScenarioSpec`] against
/// `factory`, coercing to `BASELINE` whenever a required parameter is
/// missing or invalid. Always succeeds.
#[must_use]
pub fn normalize_intent(raw: &RawIntent, factory: &FactoryConfig) -> ScenarioSpec {
    let candidate = match raw.scenario_type.as_deref() {
        Some("RUSH_ARRIVES") => ScenarioSpec {
            scenario_type: ScenarioType::RushArrives,
            rush_job_id: raw.rush_job_id.clone().map(JobId::new),
            slowdown_factor: None,
        },
        Some("M2_SLOWDOWN") => ScenarioSpec {
            scenario_type: ScenarioType::M2Slowdown,
            rush_job_id: None,
            slowdown_factor: raw.slowdown_factor,
        },
        _ => ScenarioSpec::baseline(),
    };

    if candidate.is_well_formed(factory) {
        candidate
    } else {
        ScenarioSpec::baseline()
    }
}

/// Runs D1: classifies operator intent into a well-formed scenario spec,
/// always succeeding even when the gateway fails.
pub async fn run_d1(
    gateway: &dyn ModelGateway,
    situation_text: &str,
    factory: &FactoryConfig,
    _timeout: Duration,
) -> (ScenarioSpec, String, StageRecord) {
    let job_ids: Vec<&str> = factory.jobs.iter().map(|j| j.id.as_str()).collect();
    let prompt = format!(
        "Classify operator intent from this situation text into one of BASELINE, RUSH_ARRIVES, \
         M2_SLOWDOWN. Valid job ids: {job_ids:?}.\n\nSituation:\n{situation_text}"
    );

    match gateway.call_json(&prompt, &d1_schema()).await {
        Ok(value) => match serde_json::from_value::<RawIntent>(value) {
            Ok(raw) => {
                let spec = normalize_intent(&raw, factory);
                let summary = json!({
                    "scenario_type": format!("{:?}", spec.scenario_type),
                    "rush_job_id": spec.rush_job_id.as_ref().map(JobId::as_str),
                    "has_constraints": !raw.constraints.is_empty(),
                });
                (spec, raw.constraints, StageRecord::success(StageId::D1, Some("gateway"), summary))
            }
            Err(error) => (
                ScenarioSpec::baseline(),
                String::new(),
                StageRecord::failed(StageId::D1, Some("gateway"), vec![format!("LLM_PARSE: {error}")]),
            ),
        },
        Err(error) => (
            ScenarioSpec::baseline(),
            String::new(),
            StageRecord::failed(StageId::D1, Some("gateway"), vec![format!("{error}")]),
        ),
    }
}

// ============================================================================
// SECTION: D2 - Futures Expansion
// ============================================================================

/// Maximum number of scenario candidates D2 keeps.
const MAX_SCENARIOS: usize = 3;

/// D2's raw output: candidate scenarios plus a justification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFutures {
    /// Candidate scenario classifications, in model-returned order.
    #[serde(default)]
    pub candidates: Vec<RawIntent>,
    /// Free-form justification, preserved for D5.
    #[serde(default)]
    pub justification: String,
}

/// JSON schema for D2's expected response shape.
#[must_use]
pub fn d2_schema() -> Value {
    json!({
        "type": "object",
        "required": ["candidates", "justification"],
        "properties": {
            "candidates": { "type": "array", "items": d1_schema() },
            "justification": { "type": "string" }
        }
    })
}

/// Runs D2: expands the D1 spec into up to three deduplicated candidates,
/// falling back to `[d1_spec]` on any failure.
pub async fn run_d2(
    gateway: &dyn ModelGateway,
    d1_spec: &ScenarioSpec,
    factory: &FactoryConfig,
    _timeout: Duration,
) -> (Vec<ScenarioSpec>, String, StageRecord) {
    let prompt = format!(
        "Given the baseline intent {:?}, propose 1 to 3 plausible what-if scenarios for this factory.",
        d1_spec.scenario_type,
    );

    match gateway.call_json(&prompt, &d2_schema()).await {
        Ok(value) => match serde_json::from_value::<RawFutures>(value) {
            Ok(raw) => {
                let mut specs: Vec<ScenarioSpec> = raw
                    .candidates
                    .iter()
                    .map(|candidate| normalize_intent(candidate, factory))
                    .collect();
                dedup_specs(&mut specs);
                specs.truncate(MAX_SCENARIOS);
                if specs.is_empty() {
                    specs.push(d1_spec.clone());
                }
                let summary = json!({
                    "scenario_count": specs.len(),
                    "scenario_types": specs.iter().map(|s| format!("{:?}", s.scenario_type)).collect::<Vec<_>>(),
                });
                (specs, raw.justification, StageRecord::success(StageId::D2, Some("gateway"), summary))
            }
            Err(error) => (
                vec![d1_spec.clone()],
                String::new(),
                StageRecord::failed(StageId::D2, Some("gateway"), vec![format!("LLM_PARSE: {error}")]),
            ),
        },
        Err(error) => (
            vec![d1_spec.clone()],
            String::new(),
            StageRecord::failed(StageId::D2, Some("gateway"), vec![format!("{error}")]),
        ),
    }
}

/// Removes scenarios whose type and parameters are identical, keeping the
/// first occurrence.
fn dedup_specs(specs: &mut Vec<ScenarioSpec>) {
    let mut seen: Vec<ScenarioSpec> = Vec::new();
    specs.retain(|spec| {
        if seen.contains(spec) {
            false
        } else {
            seen.push(spec.clone());
            true
        }
    });
}

// ============================================================================
// SECTION: D3 - Simulation
// ============================================================================

/// Runs D3: applies and schedules every candidate spec, in order. Pure.
#[must_use]
pub fn run_d3(
    factory: &FactoryConfig,
    specs: &[ScenarioSpec],
) -> (Vec<(FactoryConfig, crate::model::SimulationResult)>, StageRecord) {
    let results: Vec<(FactoryConfig, crate::model::SimulationResult)> = specs
        .iter()
        .map(|spec| {
            let effective_factory = apply_scenario(factory, spec);
            let result = schedule(&effective_factory);
            (effective_factory, result)
        })
        .collect();

    let summary = json!({ "simulation_count": results.len() });
    (results, StageRecord::success(StageId::D3, None, summary))
}

// ============================================================================
// SECTION: D4 - Metrics
// ============================================================================

/// Runs D4: derives metrics for every simulation result. Pure.
#[must_use]
pub fn run_d4(
    simulations: &[(FactoryConfig, crate::model::SimulationResult)],
) -> (Vec<ScenarioMetrics>, StageRecord) {
    let metrics: Vec<ScenarioMetrics> = simulations
        .iter()
        .map(|(factory, result)| derive_metrics(factory, result))
        .collect();

    let summary = json!({ "metric_set_count": metrics.len() });
    (metrics, StageRecord::success(StageId::D4, None, summary))
}

// ============================================================================
// SECTION: D5 - Briefing
// ============================================================================

/// Runs D5: asks the model for a narrative briefing, falling back to a
/// deterministic Markdown template that embeds the metrics verbatim.
pub async fn run_d5(
    gateway: &dyn ModelGateway,
    metrics: &[ScenarioMetrics],
    constraints: &str,
    justification: &str,
    meta: &OnboardingMeta,
    _timeout: Duration,
) -> (String, StageRecord) {
    let Some(primary) = metrics.first() else {
        let briefing = deterministic_briefing(metrics, constraints, meta);
        return (
            briefing,
            StageRecord::failed(StageId::D5, None, vec!["no metrics available for briefing".to_owned()]),
        );
    };

    let prompt = format!(
        "Write a Markdown feasibility briefing. Primary scenario makespan: {}h. \
         Constraint: {constraints}. Justification: {justification}.",
        primary.makespan_hour,
    );
    let schema = json!({ "type": "object", "required": ["briefing"], "properties": { "briefing": { "type": "string" } } });

    match gateway.call_json(&prompt, &schema).await {
        Ok(value) => match value.get("briefing").and_then(Value::as_str) {
            Some(briefing) if !briefing.trim().is_empty() => {
                let summary = json!({ "char_count": briefing.chars().count(), "non_empty": true });
                (briefing.to_owned(), StageRecord::success(StageId::D5, Some("gateway"), summary))
            }
            _ => {
                let briefing = deterministic_briefing(metrics, constraints, meta);
                (briefing, StageRecord::failed(StageId::D5, Some("gateway"), vec!["LLM_REFUSED: empty briefing".to_owned()]))
            }
        },
        Err(error) => {
            let briefing = deterministic_briefing(metrics, constraints, meta);
            (briefing, StageRecord::failed(StageId::D5, Some("gateway"), vec![format!("{error}")]))
        }
    }
}

/// Builds the non-LLM Markdown briefing used whenever D5's model call fails.
/// Always non-empty and embeds every metric set verbatim.
fn deterministic_briefing(metrics: &[ScenarioMetrics], constraints: &str, meta: &OnboardingMeta) -> String {
    let mut briefing = String::from("# Feasibility Briefing\n\n## Executive Summary\n\n");
    briefing.push_str("Generated from deterministic scheduling metrics; the narrative model was unavailable.\n\n");
    briefing.push_str("## Feasibility Assessment\n\n");
    if constraints.is_empty() {
        briefing.push_str("No explicit constraint was provided.\n\n");
    } else {
        briefing.push_str(&format!("Constraint: {constraints}\n\n"));
    }
    briefing.push_str("## Scenario Metrics\n\n");
    for (index, metric) in metrics.iter().enumerate() {
        briefing.push_str(&format!(
            "- Scenario {index}: makespan={}h, bottleneck={} ({:.2} utilization)\n",
            metric.makespan_hour, metric.bottleneck_machine_id, metric.bottleneck_utilization,
        ));
        for (job_id, lateness) in &metric.job_lateness {
            briefing.push_str(&format!("  - {job_id}: lateness={lateness}h\n"));
        }
    }
    briefing.push_str("\n## Recommendations\n\nReview the bottleneck machine for capacity relief.\n\n");
    briefing.push_str("## Caveats\n\n");
    if meta.used_default_factory {
        briefing.push_str("The onboarding pipeline could not parse the supplied description; a fallback factory was used.\n");
    } else {
        briefing.push_str("Metrics are deterministic but the narrative assessment is templated, not model-generated.\n");
    }
    briefing
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]
mod tests {
    use super::*;
    use crate::model::Job;
    use crate::model::Machine;
    use crate::model::MachineId;
    use crate::model::Step;

    fn factory() -> FactoryConfig {
        FactoryConfig {
            machines: vec![Machine { id: MachineId::new("M1"), name: "A".to_owned() }],
            jobs: vec![
                Job {
                    id: JobId::new("J1"),
                    name: "W".to_owned(),
                    steps: vec![Step { machine_id: MachineId::new("M1"), duration_hours: 1 }],
                    due_time_hour: 10,
                },
                Job {
                    id: JobId::new("J2"),
                    name: "X".to_owned(),
                    steps: vec![Step { machine_id: MachineId::new("M1"), duration_hours: 1 }],
                    due_time_hour: 5,
                },
            ],
        }
    }

    #[test]
    fn normalize_intent_coerces_invalid_rush_id_to_baseline() {
        let raw = RawIntent {
            scenario_type: Some("RUSH_ARRIVES".to_owned()),
            rush_job_id: Some("J99".to_owned()),
            slowdown_factor: None,
            constraints: String::new(),
        };
        let spec = normalize_intent(&raw, &factory());
        assert_eq!(spec.scenario_type, ScenarioType::Baseline);
    }

    #[test]
    fn normalize_intent_accepts_valid_rush_id() {
        let raw = RawIntent {
            scenario_type: Some("RUSH_ARRIVES".to_owned()),
            rush_job_id: Some("J1".to_owned()),
            slowdown_factor: None,
            constraints: String::new(),
        };
        let spec = normalize_intent(&raw, &factory());
        assert_eq!(spec.scenario_type, ScenarioType::RushArrives);
    }

    #[test]
    fn dedup_specs_keeps_first_occurrence() {
        let mut specs = vec![
            ScenarioSpec::baseline(),
            ScenarioSpec::baseline(),
            ScenarioSpec {
                scenario_type: ScenarioType::M2Slowdown,
                rush_job_id: None,
                slowdown_factor: Some(2),
            },
        ];
        dedup_specs(&mut specs);
        assert_eq!(specs.len(), 2);
    }

    #[test]
    fn run_d3_then_d4_produce_matching_counts() {
        let factory = factory();
        let specs = vec![ScenarioSpec::baseline()];
        let (simulations, _) = run_d3(&factory, &specs);
        let (metrics, _) = run_d4(&simulations);
        assert_eq!(metrics.len(), specs.len());
    }

    #[test]
    fn deterministic_briefing_is_never_empty() {
        let factory = factory();
        let specs = vec![ScenarioSpec::baseline()];
        let (simulations, _) = run_d3(&factory, &specs);
        let (metrics, _) = run_d4(&simulations);
        let briefing = deterministic_briefing(&metrics, "deliver by noon", &OnboardingMeta::default());
        assert!(!briefing.trim().is_empty());
        assert!(briefing.contains("makespan"));
    }
}
