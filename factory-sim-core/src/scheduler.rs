// factory-sim-core/src/scheduler.rs
// ============================================================================
// Module: EDD Scheduler
// Description: Deterministic earliest-due-date job-shop scheduling and
//              scenario application.
// Purpose: Turn a FactoryConfig + ScenarioSpec into a SimulationResult with
//          no search, no preemption, and no migration.
// Dependencies: crate::model
// ============================================================================

//! ## Overview
//! The scheduler sorts jobs by `(due_time_hour ASC, job_id ASC)` and places
//! every step of every job, in job order, at the earliest hour its machine
//! is free and its job's preceding step has finished. This is the only
//! scheduling discipline the system implements; it is not a general solver.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::model::FactoryConfig;
use crate::model::Job;
use crate::model::JobId;
use crate::model::MachineId;
use crate::model::ScenarioSpec;
use crate::model::ScenarioType;
use crate::model::ScheduledStep;
use crate::model::SimulationResult;

// ============================================================================
// SECTION: Scenario Application
// ============================================================================

/// Applies a well-formed scenario to a baseline factory, returning a new,
/// independent [`FactoryConfig`]. The baseline itself is never mutated.
///
/// # Panics
///
/// Never panics for a `scenario` that passed [`ScenarioSpec::is_well_formed`]
/// against `factory`; callers must validate first.
#[must_use]
pub fn apply_scenario(factory: &FactoryConfig, scenario: &ScenarioSpec) -> FactoryConfig {
    match scenario.scenario_type {
        ScenarioType::Baseline => factory.clone(),
        ScenarioType::RushArrives => apply_rush_arrives(factory, scenario),
        ScenarioType::M2Slowdown => apply_m2_slowdown(factory, scenario),
    }
}

fn apply_rush_arrives(factory: &FactoryConfig, scenario: &ScenarioSpec) -> FactoryConfig {
    let Some(rush_job_id) = &scenario.rush_job_id else {
        return factory.clone();
    };
    let min_due = factory.jobs.iter().map(|job| job.due_time_hour).min().unwrap_or(0);
    let tightened_due = min_due.saturating_sub(1);

    let mut factory = factory.clone();
    for job in &mut factory.jobs {
        if &job.id == rush_job_id {
            job.due_time_hour = tightened_due;
        }
    }
    factory
}

fn apply_m2_slowdown(factory: &FactoryConfig, scenario: &ScenarioSpec) -> FactoryConfig {
    let Some(factor) = scenario.slowdown_factor else {
        return factory.clone();
    };
    let m2 = MachineId::new("M2");

    let mut factory = factory.clone();
    for job in &mut factory.jobs {
        for step in &mut job.steps {
            if step.machine_id == m2 {
                step.duration_hours = step.duration_hours.saturating_mul(factor);
            }
        }
    }
    factory
}

// ============================================================================
// SECTION: Scheduling
// ============================================================================

/// Produces a deterministic schedule for `factory` using earliest-due-date
/// job ordering and greedy earliest-fit placement.
///
/// Determinism: for a fixed `factory`, repeated calls return byte-identical
/// results. Job order is `(due_time_hour ASC, job_id ASC)`; ties are broken
/// lexicographically on the job id, never on input position.
#[must_use]
pub fn schedule(factory: &FactoryConfig) -> SimulationResult {
    let mut ordered_jobs: Vec<&Job> = factory.jobs.iter().collect();
    ordered_jobs.sort_by(|a, b| a.due_time_hour.cmp(&b.due_time_hour).then_with(|| a.id.cmp(&b.id)));

    let mut machine_free_at: BTreeMap<MachineId, u32> =
        factory.machines.iter().map(|m| (m.id.clone(), 0)).collect();
    let mut scheduled_steps = Vec::new();
    let mut job_completion_times: Vec<(JobId, u32)> = Vec::new();
    let mut makespan_hour = 0_u32;

    for job in ordered_jobs {
        let mut job_free_at = 0_u32;
        for step in &job.steps {
            let machine_free_at_entry = machine_free_at.entry(step.machine_id.clone()).or_insert(0);
            let start_hour = job_free_at.max(*machine_free_at_entry);
            let end_hour = start_hour + step.duration_hours;

            *machine_free_at_entry = end_hour;
            job_free_at = end_hour;
            makespan_hour = makespan_hour.max(end_hour);

            scheduled_steps.push(ScheduledStep {
                job_id: job.id.clone(),
                machine_id: step.machine_id.clone(),
                start_hour,
                end_hour,
            });
        }
        job_completion_times.push((job.id.clone(), job_free_at));
    }

    SimulationResult {
        scheduled_steps,
        job_completion_times,
        makespan_hour,
    }
}
