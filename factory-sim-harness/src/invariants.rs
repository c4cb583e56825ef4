// factory-sim-harness/src/invariants.rs
// ============================================================================
// Module: Quantified Invariant Checks
// Description: Checks a PipelineOutput against the crate's quantified
//              invariants over specs/metrics/debug/factory.
// Purpose: Give the harness runner one checklist function per invariant so
//          a failing run names exactly which law broke.
// Dependencies: factory-sim-core
// ============================================================================

//! ## Overview
//! Each [`Invariant`] variant names one property; [`check_all`] evaluates
//! every one against a [`PipelineOutput`] and returns the names of those
//! that failed. A harness run is a pass only if this list is empty.

use factory_sim_core::OverallStatus;
use factory_sim_core::PipelineOutput;
use factory_sim_core::StageId;
use factory_sim_core::StageKind;
use factory_sim_core::StageStatus;
use factory_sim_core::apply_scenario;
use factory_sim_core::schedule;

/// One quantified invariant a pipeline run must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Invariant {
    /// `len(specs) == len(metrics)` and `1 <= len(specs) <= 3`.
    SpecMetricCountsMatch,
    /// The debug payload has exactly ten stage records, in `O0..D5` order.
    TenStagesInOrder,
    /// Every metric's utilization is in `[0, 1]` and every lateness id
    /// exists among the factory's jobs.
    MetricsWellFormed,
    /// Every scheduled step has positive duration, a known machine, and no
    /// overlap with another step on the same machine.
    SchedulesWellFormed,
    /// `overall_status == SUCCESS` iff all ten stage statuses are `SUCCESS`.
    OverallStatusMatchesStages,
    /// `meta.used_default_factory` iff at least one onboarding stage failed.
    FallbackFlagMatchesOnboarding,
}

/// Returns the invariants [`output`] fails, in a stable order.
#[must_use]
pub fn check_all(output: &PipelineOutput) -> Vec<Invariant> {
    let mut failures = Vec::new();
    if !spec_metric_counts_match(output) {
        failures.push(Invariant::SpecMetricCountsMatch);
    }
    if !ten_stages_in_order(output) {
        failures.push(Invariant::TenStagesInOrder);
    }
    if !metrics_well_formed(output) {
        failures.push(Invariant::MetricsWellFormed);
    }
    if !schedules_well_formed(output) {
        failures.push(Invariant::SchedulesWellFormed);
    }
    if !overall_status_matches_stages(output) {
        failures.push(Invariant::OverallStatusMatchesStages);
    }
    if !fallback_flag_matches_onboarding(output) {
        failures.push(Invariant::FallbackFlagMatchesOnboarding);
    }
    failures
}

/// Checks invariant 1: spec/metric counts agree and are in `[1, 3]`.
fn spec_metric_counts_match(output: &PipelineOutput) -> bool {
    output.specs.len() == output.metrics.len() && (1..=3).contains(&output.specs.len())
}

/// Checks invariant 2: exactly ten stage records in the canonical order.
fn ten_stages_in_order(output: &PipelineOutput) -> bool {
    output.debug.stages.len() == 10
        && output.debug.stages.iter().map(|s| s.id.as_str()).eq(StageId::ALL.iter().map(|id| id.code()))
}

/// Checks invariant 3: every metric's utilization and lateness are sane.
fn metrics_well_formed(output: &PipelineOutput) -> bool {
    let job_ids: Vec<&str> = output.factory.jobs.iter().map(|j| j.id.as_str()).collect();
    output.metrics.iter().all(|m| {
        (0.0..=1.0).contains(&m.bottleneck_utilization)
            && m.job_lateness.iter().all(|(id, _)| job_ids.contains(&id.as_str()))
    })
}

/// Checks invariant 4: every scheduled step (recomputed from the returned
/// factory and specs, since the debug payload doesn't carry schedules) has
/// positive duration, a known machine, disjoint same-machine intervals, and
/// ordered same-job steps.
fn schedules_well_formed(output: &PipelineOutput) -> bool {
    let known_machines: Vec<&str> = output.factory.machines.iter().map(|m| m.id.as_str()).collect();
    output.specs.iter().all(|spec| {
        let effective_factory = apply_scenario(&output.factory, spec);
        let result = schedule(&effective_factory);

        let steps_well_formed = result
            .scheduled_steps
            .iter()
            .all(|step| step.end_hour > step.start_hour && known_machines.contains(&step.machine_id.as_str()));

        let machine_intervals_disjoint = known_machines.iter().all(|machine_id| {
            let mut intervals: Vec<(u32, u32)> = result
                .scheduled_steps
                .iter()
                .filter(|step| step.machine_id.as_str() == *machine_id)
                .map(|step| (step.start_hour, step.end_hour))
                .collect();
            intervals.sort_unstable();
            intervals.windows(2).all(|pair| pair[0].1 <= pair[1].0)
        });

        let job_steps_ordered = effective_factory.jobs.iter().all(|job| {
            let intervals: Vec<(u32, u32)> = result
                .scheduled_steps
                .iter()
                .filter(|s| s.job_id == job.id)
                .map(|s| (s.start_hour, s.end_hour))
                .collect();
            intervals.windows(2).all(|pair| pair[0].1 <= pair[1].0)
        });

        steps_well_formed && machine_intervals_disjoint && job_steps_ordered
    })
}

/// Checks invariant 6: `overall_status` is `SUCCESS` iff every stage is.
fn overall_status_matches_stages(output: &PipelineOutput) -> bool {
    let all_success = output.debug.stages.iter().all(|s| s.status == StageStatus::Success);
    (output.debug.overall_status == OverallStatus::Success) == all_success
}

/// Checks invariant 7: the fallback flag matches onboarding stage health.
fn fallback_flag_matches_onboarding(output: &PipelineOutput) -> bool {
    let onboarding_failed = output
        .debug
        .stages
        .iter()
        .any(|s| s.kind == StageKind::Onboarding && s.status == StageStatus::Failed);
    output.meta.used_default_factory == onboarding_failed
}
