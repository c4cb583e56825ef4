// factory-sim-core/src/metrics.rs
// ============================================================================
// Module: Schedule Metrics
// Description: Pure derivation of per-scenario metrics from a simulation
//              result.
// Purpose: Implement D4 — lateness, bottleneck machine, utilization.
// Dependencies: crate::model
// ============================================================================

//! ## Overview
//! Metrics are derived entirely from the [`SimulationResult`] and the
//! [`FactoryConfig`] it was produced from; no re-scheduling happens here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::model::FactoryConfig;
use crate::model::Job;
use crate::model::MachineId;
use crate::model::ScenarioMetrics;
use crate::model::SimulationResult;

// ============================================================================
// SECTION: Metrics Derivation
// ============================================================================

/// Derives [`ScenarioMetrics`] from a completed simulation.
///
/// `factory` must be the same factory (after scenario application) that
/// produced `result`; due times are read from it.
#[must_use]
pub fn derive_metrics(factory: &FactoryConfig, result: &SimulationResult) -> ScenarioMetrics {
    let job_lateness = job_lateness(&factory.jobs, result);
    let busy_hours = busy_hours_per_machine(result);
    let (bottleneck_machine_id, bottleneck_busy_hours) = bottleneck(&factory.machines_in_order(), &busy_hours);

    let bottleneck_utilization = if result.makespan_hour == 0 {
        0.0
    } else {
        (f64::from(bottleneck_busy_hours) / f64::from(result.makespan_hour)).clamp(0.0, 1.0)
    };

    ScenarioMetrics {
        makespan_hour: result.makespan_hour,
        job_lateness,
        bottleneck_machine_id,
        bottleneck_utilization,
    }
}

/// Computes `max(0, completion - due)` for every job, in factory order.
fn job_lateness(jobs: &[Job], result: &SimulationResult) -> Vec<(crate::model::JobId, u32)> {
    jobs.iter()
        .map(|job| {
            let completion = result.completion_for(&job.id).unwrap_or(job.due_time_hour);
            let lateness = completion.saturating_sub(job.due_time_hour);
            (job.id.clone(), lateness)
        })
        .collect()
}

/// Sums step durations per machine across the whole schedule.
fn busy_hours_per_machine(result: &SimulationResult) -> BTreeMap<MachineId, u32> {
    let mut busy_hours: BTreeMap<MachineId, u32> = BTreeMap::new();
    for step in &result.scheduled_steps {
        let duration = step.end_hour.saturating_sub(step.start_hour);
        *busy_hours.entry(step.machine_id.clone()).or_insert(0) += duration;
    }
    busy_hours
}

/// Picks the machine with the greatest busy hours, breaking ties
/// lexicographically by machine id.
fn bottleneck(
    machines_in_order: &[MachineId],
    busy_hours: &BTreeMap<MachineId, u32>,
) -> (MachineId, u32) {
    let mut best: Option<(MachineId, u32)> = None;
    for machine_id in machines_in_order {
        let hours = busy_hours.get(machine_id).copied().unwrap_or(0);
        best = Some(match best {
            None => (machine_id.clone(), hours),
            Some((best_id, best_hours)) if hours > best_hours || (hours == best_hours && *machine_id < best_id) => {
                (machine_id.clone(), hours)
            }
            Some(existing) => existing,
        });
    }
    best.unwrap_or_else(|| (MachineId::new(""), 0))
}

impl FactoryConfig {
    /// Machine ids in insertion order, for bottleneck tie-breaking.
    fn machines_in_order(&self) -> Vec<MachineId> {
        self.machines.iter().map(|m| m.id.clone()).collect()
    }
}
