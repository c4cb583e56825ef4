// factory-sim-core/src/onboarding.rs
// ============================================================================
// Module: Onboarding Pipeline (O0-O4)
// Description: Turns free-form factory description text into a validated
//              FactoryConfig, or signals that the toy-factory fallback must
//              be used.
// Purpose: Implement the five onboarding stages as independent, recorder-
//          wrapped functions the orchestrator sequences.
// Dependencies: regex, serde_json, crate::{model, normalize, gateway, stage}
// ============================================================================

//! ## Overview
//! Each stage function returns `(value, StageRecord)`. Stage bodies never
//! propagate an error past themselves; a failure is represented as `None`
//! (or an empty id set) paired with a `FAILED` record. The orchestrator, not
//! the stage, decides what a failure means for the rest of the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::gateway::ModelGateway;
use crate::model::ExplicitIds;
use crate::model::FactoryConfig;
use crate::model::JobId;
use crate::model::MachineId;
use crate::normalize::RawFactory;
use crate::stage::StageId;
use crate::stage::StageRecord;

// ============================================================================
// SECTION: O0 - Explicit ID Extraction
// ============================================================================

/// Extracts the machine and job ids a factory description literally
/// mentions. Pure; cannot fail.
#[must_use]
pub fn run_o0(factory_description: &str) -> (ExplicitIds, StageRecord) {
    let machine_ids = find_ids(factory_description, 'M');
    let job_ids = find_ids(factory_description, 'J');

    let explicit_ids = ExplicitIds {
        machine_ids: machine_ids.iter().cloned().map(MachineId::new).collect(),
        job_ids: job_ids.iter().cloned().map(JobId::new).collect(),
    };
    let summary = json!({
        "machine_ids": machine_ids,
        "job_ids": job_ids,
        "machine_count": machine_ids.len(),
        "job_count": job_ids.len(),
    });
    (explicit_ids, StageRecord::success(StageId::O0, None, summary))
}

/// Finds every `\b{prefix}(?:\d+|_\w+)\b` match, sorted and de-duplicated.
fn find_ids(text: &str, prefix: char) -> Vec<String> {
    #[allow(
        clippy::unwrap_used,
        reason = "pattern is a compile-time constant per prefix and always valid"
    )]
    let pattern = Regex::new(&format!(r"\b{prefix}(?:\d+|_\w+)\b")).unwrap();
    let mut ids: Vec<String> = pattern.find_iter(text).map(|m| m.as_str().to_owned()).collect();
    ids.sort();
    ids.dedup();
    ids
}

// ============================================================================
// SECTION: O1 - Coarse Structure
// ============================================================================

/// A bare `{id, name}` entity, used for O1's coarse machine/job lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoarseEntity {
    /// The entity's id as returned by the model.
    pub id: String,
    /// The entity's display name as returned by the model.
    #[serde(default)]
    pub name: String,
}

/// O1's raw output shape: machines and jobs with no steps or timing yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoarseStructure {
    /// Machines the model found in the text.
    #[serde(default)]
    pub machines: Vec<CoarseEntity>,
    /// Jobs the model found in the text.
    #[serde(default)]
    pub jobs: Vec<CoarseEntity>,
}

/// JSON schema for O1's expected response shape.
#[must_use]
pub fn o1_schema() -> Value {
    json!({
        "type": "object",
        "required": ["machines", "jobs"],
        "properties": {
            "machines": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": { "id": { "type": "string" }, "name": { "type": "string" } }
                }
            },
            "jobs": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": { "id": { "type": "string" }, "name": { "type": "string" } }
                }
            }
        }
    })
}

/// Runs O1: asks the model to enumerate every machine/job id in the text,
/// then checks the result is a superset of the O0 explicit ids.
pub async fn run_o1(
    gateway: &dyn ModelGateway,
    factory_description: &str,
    explicit_ids: &ExplicitIds,
    _timeout: Duration,
) -> (Option<CoarseStructure>, StageRecord) {
    let prompt = format!(
        "Enumerate every machine and job in this factory description as {{id, name}} pairs. \
         Every one of these ids must appear: machines={:?}, jobs={:?}. \
         Do not invent ids that do not appear in the text.\n\nText:\n{factory_description}",
        explicit_ids.machine_ids, explicit_ids.job_ids,
    );

    match gateway.call_json(&prompt, &o1_schema()).await {
        Ok(value) => match serde_json::from_value::<CoarseStructure>(value) {
            Ok(coarse) => {
                let machine_ids: Vec<String> = coarse.machines.iter().map(|m| m.id.clone()).collect();
                let job_ids: Vec<String> = coarse.jobs.iter().map(|j| j.id.clone()).collect();
                let missing_machines: Vec<&str> = explicit_ids
                    .machine_ids
                    .iter()
                    .map(MachineId::as_str)
                    .filter(|id| !machine_ids.iter().any(|found| found == id))
                    .collect();
                let missing_jobs: Vec<&str> = explicit_ids
                    .job_ids
                    .iter()
                    .map(JobId::as_str)
                    .filter(|id| !job_ids.iter().any(|found| found == id))
                    .collect();

                if missing_machines.is_empty() && missing_jobs.is_empty() {
                    let summary = json!({
                        "machine_count": coarse.machines.len(),
                        "job_count": coarse.jobs.len(),
                    });
                    (Some(coarse), StageRecord::success(StageId::O1, Some("gateway"), summary))
                } else {
                    let error = format!(
                        "COVERAGE_MISMATCH_COARSE: missing machines {missing_machines:?}, jobs {missing_jobs:?}"
                    );
                    (None, StageRecord::failed(StageId::O1, Some("gateway"), vec![error]))
                }
            }
            Err(error) => (
                None,
                StageRecord::failed(StageId::O1, Some("gateway"), vec![format!("LLM_PARSE: {error}")]),
            ),
        },
        Err(error) => (
            None,
            StageRecord::failed(StageId::O1, Some("gateway"), vec![format!("{error}")]),
        ),
    }
}

// ============================================================================
// SECTION: O2 - Fine Extraction
// ============================================================================

/// JSON schema for O2's expected response shape (a [`RawFactory`]).
#[must_use]
pub fn o2_schema() -> Value {
    json!({
        "type": "object",
        "required": ["machines", "jobs"],
        "properties": {
            "machines": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id"],
                    "properties": { "id": { "type": "string" }, "name": { "type": "string" } }
                }
            },
            "jobs": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["id", "steps"],
                    "properties": {
                        "id": { "type": "string" },
                        "name": { "type": "string" },
                        "due_time_hour": { "type": ["number", "null"] },
                        "steps": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["machine_id"],
                                "properties": {
                                    "machine_id": { "type": "string" },
                                    "duration_hours": { "type": ["number", "null"] }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Runs O2: asks the model for ordered steps and due times per job, then
/// checks every referenced id was already enumerated by O1.
pub async fn run_o2(
    gateway: &dyn ModelGateway,
    factory_description: &str,
    coarse: &CoarseStructure,
    _timeout: Duration,
) -> (Option<RawFactory>, StageRecord) {
    let prompt = format!(
        "For each job below, list its ordered steps (machine_id, duration_hours) and due_time_hour. \
         Only use machine ids from {:?} and job ids from {:?}.\n\nText:\n{factory_description}",
        coarse.machines.iter().map(|m| &m.id).collect::<Vec<_>>(),
        coarse.jobs.iter().map(|j| &j.id).collect::<Vec<_>>(),
    );

    match gateway.call_json(&prompt, &o2_schema()).await {
        Ok(value) => match serde_json::from_value::<RawFactory>(value) {
            Ok(raw) => {
                let known_machines: Vec<&str> = coarse.machines.iter().map(|m| m.id.as_str()).collect();
                let known_jobs: Vec<&str> = coarse.jobs.iter().map(|j| j.id.as_str()).collect();
                let bad_machine = raw
                    .jobs
                    .iter()
                    .flat_map(|j| &j.steps)
                    .find(|s| !known_machines.contains(&s.machine_id.as_str()));
                let bad_job = raw.jobs.iter().find(|j| !known_jobs.contains(&j.id.as_str()));

                if let Some(step) = bad_machine {
                    let error = format!("COVERAGE_MISMATCH_FINE: unknown machine {}", step.machine_id);
                    (None, StageRecord::failed(StageId::O2, Some("gateway"), vec![error]))
                } else if let Some(job) = bad_job {
                    let error = format!("COVERAGE_MISMATCH_FINE: unknown job {}", job.id);
                    (None, StageRecord::failed(StageId::O2, Some("gateway"), vec![error]))
                } else {
                    let total_steps: usize = raw.jobs.iter().map(|j| j.steps.len()).sum();
                    let summary = json!({
                        "machines_with_steps": raw.machines.len(),
                        "jobs_with_steps": raw.jobs.len(),
                        "total_steps": total_steps,
                    });
                    (Some(raw), StageRecord::success(StageId::O2, Some("gateway"), summary))
                }
            }
            Err(error) => (
                None,
                StageRecord::failed(StageId::O2, Some("gateway"), vec![format!("LLM_PARSE: {error}")]),
            ),
        },
        Err(error) => (
            None,
            StageRecord::failed(StageId::O2, Some("gateway"), vec![format!("{error}")]),
        ),
    }
}

// ============================================================================
// SECTION: O3 - Normalize
// ============================================================================

/// Runs O3: normalizes O2's raw output into a validated [`FactoryConfig`].
#[must_use]
pub fn run_o3(raw: &RawFactory) -> (Option<FactoryConfig>, StageRecord) {
    let (factory, warnings) = crate::normalize::normalize(raw);
    let warning_strings: Vec<String> = warnings.into_iter().map(|w| w.0).collect();

    match factory {
        Some(factory) => {
            let summary = json!({
                "machine_count": factory.machines.len(),
                "job_count": factory.jobs.len(),
                "warnings": warning_strings,
            });
            let mut record = StageRecord::success(StageId::O3, None, summary);
            record.errors = warning_strings;
            (Some(factory), record)
        }
        None => {
            let mut errors = vec!["NORMALIZATION_EMPTY".to_owned()];
            errors.extend(warning_strings);
            (None, StageRecord::failed(StageId::O3, None, errors))
        }
    }
}

// ============================================================================
// SECTION: O4 - Coverage Gate
// ============================================================================

/// Runs O4: requires 100% explicit-id coverage in both dimensions.
#[must_use]
pub fn run_o4(factory: &FactoryConfig, explicit_ids: &ExplicitIds) -> (bool, StageRecord) {
    let parsed_machine_ids: Vec<&MachineId> = factory.machines.iter().map(|m| &m.id).collect();
    let parsed_job_ids: Vec<&JobId> = factory.jobs.iter().map(|j| &j.id).collect();

    let missing_machines: Vec<&MachineId> = explicit_ids
        .machine_ids
        .iter()
        .filter(|id| !parsed_machine_ids.contains(id))
        .collect();
    let missing_jobs: Vec<&JobId> = explicit_ids
        .job_ids
        .iter()
        .filter(|id| !parsed_job_ids.contains(id))
        .collect();

    let machine_coverage = coverage_ratio(explicit_ids.machine_ids.len(), missing_machines.len());
    let job_coverage = coverage_ratio(explicit_ids.job_ids.len(), missing_jobs.len());
    let is_100_percent = machine_coverage >= 1.0 && job_coverage >= 1.0;

    let summary = json!({
        "machine_coverage": machine_coverage,
        "job_coverage": job_coverage,
        "missing_machine_ids": missing_machines.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        "missing_job_ids": missing_jobs.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        "is_100_percent": is_100_percent,
    });

    if is_100_percent {
        (true, StageRecord::success(StageId::O4, None, summary))
    } else {
        let error = format!(
            "COVERAGE_MISMATCH: machine_coverage={machine_coverage}, job_coverage={job_coverage}"
        );
        (false, StageRecord::failed(StageId::O4, None, vec![error]))
    }
}

/// `1.0` when there is nothing to cover; otherwise `found / total`.
fn coverage_ratio(total: usize, missing: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        #[allow(
            clippy::cast_precision_loss,
            reason = "explicit id counts are small; precision loss is not reachable in practice"
        )]
        let ratio = (total - missing) as f64 / total as f64;
        ratio
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]
mod tests {
    use super::*;
    use crate::model::Job;
    use crate::model::Machine;
    use crate::model::Step;
    use crate::normalize::RawJob;
    use crate::normalize::RawMachine;
    use crate::stage::StageStatus;

    #[test]
    fn o0_finds_ids_with_word_boundaries() {
        let (ids, record) = run_o0("Machines M1, M2. Jobs J1, J2. EM1 is not a machine.");
        assert_eq!(ids.machine_ids.len(), 2);
        assert_eq!(ids.job_ids.len(), 2);
        assert_eq!(record.status, StageStatus::Success);
    }

    #[test]
    fn o4_passes_with_full_coverage() {
        let factory = FactoryConfig {
            machines: vec![Machine { id: MachineId::new("M1"), name: "A".to_owned() }],
            jobs: vec![Job {
                id: JobId::new("J1"),
                name: "W".to_owned(),
                steps: vec![Step { machine_id: MachineId::new("M1"), duration_hours: 1 }],
                due_time_hour: 10,
            }],
        };
        let explicit_ids = ExplicitIds {
            machine_ids: [MachineId::new("M1")].into_iter().collect(),
            job_ids: [JobId::new("J1")].into_iter().collect(),
        };
        let (passed, record) = run_o4(&factory, &explicit_ids);
        assert!(passed);
        assert_eq!(record.status, StageStatus::Success);
    }

    #[test]
    fn o4_fails_on_missing_explicit_id() {
        let factory = FactoryConfig {
            machines: vec![Machine { id: MachineId::new("M1"), name: "A".to_owned() }],
            jobs: vec![Job {
                id: JobId::new("J1"),
                name: "W".to_owned(),
                steps: vec![Step { machine_id: MachineId::new("M1"), duration_hours: 1 }],
                due_time_hour: 10,
            }],
        };
        let explicit_ids = ExplicitIds {
            machine_ids: [MachineId::new("M1"), MachineId::new("M5")].into_iter().collect(),
            job_ids: [JobId::new("J1")].into_iter().collect(),
        };
        let (passed, record) = run_o4(&factory, &explicit_ids);
        assert!(!passed);
        assert_eq!(record.status, StageStatus::Failed);
    }

    #[test]
    fn o3_fails_on_empty_normalized_factory() {
        let raw = RawFactory::default();
        let (factory, record) = run_o3(&raw);
        assert!(factory.is_none());
        assert_eq!(record.status, StageStatus::Failed);
    }

    #[test]
    fn o3_succeeds_and_carries_warnings() {
        let raw = RawFactory {
            machines: vec![RawMachine { id: "M1".to_owned(), name: "A".to_owned() }],
            jobs: vec![RawJob {
                id: "J1".to_owned(),
                name: "W".to_owned(),
                steps: vec![crate::normalize::RawStep { machine_id: "M1".to_owned(), duration_hours: None }],
                due_time_hour: Some(10.0),
            }],
        };
        let (factory, record) = run_o3(&raw);
        assert!(factory.is_some());
        assert_eq!(record.status, StageStatus::Success);
        assert!(!record.errors.is_empty());
    }
}
