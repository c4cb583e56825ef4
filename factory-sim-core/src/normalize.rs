// factory-sim-core/src/normalize.rs
// ============================================================================
// Module: Factory Normalizer
// Description: Pure coercion of raw, possibly-malformed LLM output into a
//              validated FactoryConfig.
// Purpose: Enforce §3 invariants deterministically, with recorded warnings.
// Dependencies: crate::model
// ============================================================================

//! ## Overview
//! `normalize` is the sole boundary between untyped, possibly-malformed
//! extraction output (O2) and the validated [`FactoryConfig`] the rest of the
//! pipeline treats as ground truth. It is pure: no I/O, and
//! `normalize(normalize(raw)) == normalize(raw)` (idempotent, §8).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::model::FactoryConfig;
use crate::model::Job;
use crate::model::JobId;
use crate::model::Machine;
use crate::model::MachineId;
use crate::model::Step;
use crate::model::MAX_JOBS;
use crate::model::MAX_MACHINES;
use crate::model::MAX_STEPS_PER_JOB;

// ============================================================================
// SECTION: Raw Input Shapes
// ============================================================================

/// A possibly-malformed step as returned by O2, before coercion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStep {
    /// Machine id the step claims to run on.
    pub machine_id: String,
    /// Claimed duration; may be fractional, missing, zero, or negative.
    pub duration_hours: Option<f64>,
}

/// A possibly-malformed job as returned by O2, before coercion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawJob {
    /// Job id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Ordered steps, possibly referencing unknown machines.
    #[serde(default)]
    pub steps: Vec<RawStep>,
    /// Claimed due time; may be missing or negative.
    pub due_time_hour: Option<f64>,
}

/// A raw machine as returned by O1/O2, before coercion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMachine {
    /// Machine id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// The raw factory shape handed to the normalizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFactory {
    /// Raw machines, in the order the extractor returned them.
    #[serde(default)]
    pub machines: Vec<RawMachine>,
    /// Raw jobs, in the order the extractor returned them.
    #[serde(default)]
    pub jobs: Vec<RawJob>,
}

// ============================================================================
// SECTION: Warnings
// ============================================================================

/// A single normalization warning. Always short enough to embed directly in
/// a stage record's `errors` list (see [`crate::stage::StageRecord`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeWarning(pub String);

impl NormalizeWarning {
    /// Builds a warning from any message-like value.
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// ============================================================================
// SECTION: Normalize
// ============================================================================

/// Normalizes a raw factory into a validated [`FactoryConfig`], applying the
/// seven rules of §4.2 in order. Returns `None` when the result would have no
/// machines or no jobs; the caller decides the fallback.
///
/// Deterministic and pure: identical input always yields identical output
/// and warnings.
#[must_use]
pub fn normalize(raw: &RawFactory) -> (Option<FactoryConfig>, Vec<NormalizeWarning>) {
    let mut warnings = Vec::new();

    // Rule 6 (machines): de-duplicate by first occurrence.
    let mut seen_machine_ids = BTreeSet::new();
    let mut machines: Vec<Machine> = Vec::new();
    for raw_machine in &raw.machines {
        let id = MachineId::new(raw_machine.id.clone());
        if !seen_machine_ids.insert(id.clone()) {
            warnings.push(NormalizeWarning::new(format!(
                "duplicate machine id {id} dropped"
            )));
            continue;
        }
        machines.push(Machine {
            id,
            name: raw_machine.name.clone(),
        });
    }

    // Rule 5 (machines cap).
    if machines.len() > MAX_MACHINES {
        warnings.push(NormalizeWarning::new(format!(
            "truncated machines from {} to {MAX_MACHINES}",
            machines.len()
        )));
        machines.truncate(MAX_MACHINES);
    }
    let machine_ids: BTreeSet<MachineId> = machines.iter().map(|m| m.id.clone()).collect();

    // Rule 6 (jobs): de-duplicate by first occurrence.
    let mut seen_job_ids = BTreeSet::new();
    let mut jobs: Vec<Job> = Vec::new();
    for raw_job in &raw.jobs {
        let id = JobId::new(raw_job.id.clone());
        if !seen_job_ids.insert(id.clone()) {
            warnings.push(NormalizeWarning::new(format!(
                "duplicate job id {id} dropped"
            )));
            continue;
        }

        // Rule 3: drop steps referencing unknown machines.
        let mut steps = Vec::new();
        for (index, raw_step) in raw_job.steps.iter().enumerate() {
            let step_machine_id = MachineId::new(raw_step.machine_id.clone());
            if !machine_ids.contains(&step_machine_id) {
                warnings.push(NormalizeWarning::new(format!(
                    "job {id} step {index} references unknown machine {step_machine_id}, dropped"
                )));
                continue;
            }
            // Rule 1: coerce duration.
            let duration_hours = coerce_duration(raw_step.duration_hours);
            if raw_step.duration_hours.is_none_or(|d| d.fract() != 0.0 || d < 1.0) {
                warnings.push(NormalizeWarning::new(format!(
                    "job {id} step {index} duration coerced to {duration_hours}"
                )));
            }
            steps.push(Step {
                machine_id: step_machine_id,
                duration_hours,
            });
        }

        // Rule 5 (steps cap).
        if steps.len() > MAX_STEPS_PER_JOB {
            warnings.push(NormalizeWarning::new(format!(
                "job {id} truncated steps from {} to {MAX_STEPS_PER_JOB}",
                steps.len()
            )));
            steps.truncate(MAX_STEPS_PER_JOB);
        }

        // Rule 4: drop jobs left with no steps.
        if steps.is_empty() {
            warnings.push(NormalizeWarning::new(format!(
                "job {id} has no valid steps, dropped"
            )));
            continue;
        }

        // Rule 2: coerce due time.
        let due_time_hour = coerce_due_time(raw_job.due_time_hour);
        if raw_job.due_time_hour.is_none_or(|d| d.fract() != 0.0 || d < 0.0) {
            warnings.push(NormalizeWarning::new(format!(
                "job {id} due_time_hour coerced to {due_time_hour}"
            )));
        }

        jobs.push(Job {
            id,
            name: raw_job.name.clone(),
            steps,
            due_time_hour,
        });
    }

    // Rule 5 (jobs cap).
    if jobs.len() > MAX_JOBS {
        warnings.push(NormalizeWarning::new(format!(
            "truncated jobs from {} to {MAX_JOBS}",
            jobs.len()
        )));
        jobs.truncate(MAX_JOBS);
    }

    // Rule 7: empty result is reported, not constructed.
    if machines.is_empty() || jobs.is_empty() {
        return (None, warnings);
    }

    let factory = FactoryConfig { machines, jobs };
    debug_assert!(factory.is_valid(), "normalizer must only emit valid factories");
    (Some(factory), warnings)
}

/// Rule 1: missing, non-integer, or sub-1 durations coerce to `1`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to [0, u32::MAX] and fract-checked above"
)]
fn coerce_duration(raw: Option<f64>) -> u32 {
    match raw {
        Some(value) if value.fract() == 0.0 && value >= 1.0 && value.is_finite() => {
            value.min(f64::from(u32::MAX)) as u32
        }
        _ => 1,
    }
}

/// Rule 2: missing, non-integer, or negative due times coerce to `24`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to [0, u32::MAX] and fract-checked above"
)]
fn coerce_due_time(raw: Option<f64>) -> u32 {
    match raw {
        Some(value) if value.fract() == 0.0 && value >= 0.0 && value.is_finite() => {
            value.min(f64::from(u32::MAX)) as u32
        }
        _ => 24,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use expect on deterministic fixtures.")]
#[allow(clippy::expect_used, reason = "Tests use expect on deterministic fixtures.")]
mod tests {
    use super::*;

    /// Builds a raw machine fixture with matching id and name.
    fn machine(id: &str) -> RawMachine {
        RawMachine {
            id: id.to_owned(),
            name: id.to_owned(),
        }
    }

    #[test]
    fn missing_duration_coerces_to_one() {
        let raw = RawFactory {
            machines: vec![machine("M1")],
            jobs: vec![RawJob {
                id: "J1".to_owned(),
                name: "Widget".to_owned(),
                steps: vec![RawStep {
                    machine_id: "M1".to_owned(),
                    duration_hours: None,
                }],
                due_time_hour: Some(10.0),
            }],
        };
        let (factory, warnings) = normalize(&raw);
        let factory = factory.expect("non-empty factory");
        assert_eq!(factory.jobs[0].steps[0].duration_hours, 1);
        assert!(!warnings.is_empty());
    }

    #[test]
    fn fractional_duration_coerces_to_one_with_warning() {
        let raw = RawFactory {
            machines: vec![machine("M1")],
            jobs: vec![RawJob {
                id: "J1".to_owned(),
                name: "Widget".to_owned(),
                steps: vec![RawStep {
                    machine_id: "M1".to_owned(),
                    duration_hours: Some(2.5),
                }],
                due_time_hour: Some(10.0),
            }],
        };
        let (factory, warnings) = normalize(&raw);
        let factory = factory.expect("non-empty factory");
        assert_eq!(factory.jobs[0].steps[0].duration_hours, 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn step_on_unknown_machine_is_dropped() {
        let raw = RawFactory {
            machines: vec![machine("M1")],
            jobs: vec![RawJob {
                id: "J1".to_owned(),
                name: "Widget".to_owned(),
                steps: vec![
                    RawStep {
                        machine_id: "M1".to_owned(),
                        duration_hours: Some(2.0),
                    },
                    RawStep {
                        machine_id: "M99".to_owned(),
                        duration_hours: Some(1.0),
                    },
                ],
                due_time_hour: Some(10.0),
            }],
        };
        let (factory, _warnings) = normalize(&raw);
        let factory = factory.expect("non-empty factory");
        assert_eq!(factory.jobs[0].steps.len(), 1);
    }

    #[test]
    fn job_with_no_valid_steps_is_dropped() {
        let raw = RawFactory {
            machines: vec![machine("M1")],
            jobs: vec![RawJob {
                id: "J1".to_owned(),
                name: "Widget".to_owned(),
                steps: vec![RawStep {
                    machine_id: "M99".to_owned(),
                    duration_hours: Some(1.0),
                }],
                due_time_hour: Some(10.0),
            }],
        };
        let (factory, _warnings) = normalize(&raw);
        assert!(factory.is_none());
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let raw = RawFactory {
            machines: vec![machine("M1"), machine("M1")],
            jobs: vec![RawJob {
                id: "J1".to_owned(),
                name: "Widget".to_owned(),
                steps: vec![RawStep {
                    machine_id: "M1".to_owned(),
                    duration_hours: Some(1.0),
                }],
                due_time_hour: Some(10.0),
            }],
        };
        let (factory, warnings) = normalize(&raw);
        let factory = factory.expect("non-empty factory");
        assert_eq!(factory.machines.len(), 1);
        assert!(warnings.iter().any(|w| w.0.contains("duplicate machine")));
    }

    #[test]
    fn caps_truncate_in_insertion_order() {
        let machines: Vec<RawMachine> = (0..15).map(|i| machine(&format!("M{i}"))).collect();
        let raw = RawFactory {
            machines,
            jobs: vec![RawJob {
                id: "J1".to_owned(),
                name: "Widget".to_owned(),
                steps: vec![RawStep {
                    machine_id: "M0".to_owned(),
                    duration_hours: Some(1.0),
                }],
                due_time_hour: Some(10.0),
            }],
        };
        let (factory, warnings) = normalize(&raw);
        let factory = factory.expect("non-empty factory");
        assert_eq!(factory.machines.len(), MAX_MACHINES);
        assert_eq!(factory.machines[0].id.as_str(), "M0");
        assert!(warnings.iter().any(|w| w.0.contains("truncated machines")));
    }

    #[test]
    fn empty_input_yields_none() {
        let raw = RawFactory::default();
        let (factory, _warnings) = normalize(&raw);
        assert!(factory.is_none());
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = RawFactory {
            machines: vec![machine("M1"), machine("M2")],
            jobs: vec![RawJob {
                id: "J1".to_owned(),
                name: "Widget".to_owned(),
                steps: vec![
                    RawStep {
                        machine_id: "M1".to_owned(),
                        duration_hours: Some(2.0),
                    },
                    RawStep {
                        machine_id: "M2".to_owned(),
                        duration_hours: Some(3.0),
                    },
                ],
                due_time_hour: Some(12.0),
            }],
        };
        let (factory, _) = normalize(&raw);
        let factory = factory.expect("non-empty factory");

        let round_tripped = RawFactory {
            machines: factory
                .machines
                .iter()
                .map(|m| RawMachine {
                    id: m.id.as_str().to_owned(),
                    name: m.name.clone(),
                })
                .collect(),
            jobs: factory
                .jobs
                .iter()
                .map(|j| RawJob {
                    id: j.id.as_str().to_owned(),
                    name: j.name.clone(),
                    steps: j
                        .steps
                        .iter()
                        .map(|s| RawStep {
                            machine_id: s.machine_id.as_str().to_owned(),
                            duration_hours: Some(f64::from(s.duration_hours)),
                        })
                        .collect(),
                    due_time_hour: Some(f64::from(j.due_time_hour)),
                })
                .collect(),
        };
        let (again, warnings_again) = normalize(&round_tripped);
        assert_eq!(Some(factory), again);
        assert!(warnings_again.is_empty());
    }
}
