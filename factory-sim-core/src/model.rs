// factory-sim-core/src/model.rs
// ============================================================================
// Module: Factory Data Model
// Description: Machines, jobs, steps, and the factory configuration they form.
// Purpose: Provide the canonical, immutable-after-construction factory shape.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The factory model is the ground truth the onboarding pipeline produces and
//! the decision pipeline consumes read-only. Identity lives on opaque ids
//! (`MachineId`, `JobId`); names are display-only. A `FactoryConfig` is never
//! mutated after construction — scenario application always deep-copies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Opaque, unique-within-factory identifier for a machine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(String);

impl MachineId {
    /// Creates a new machine identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for MachineId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MachineId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Opaque, unique-within-factory identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates a new job identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Machine / Step / Job
// ============================================================================

/// A physical machine in the factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// Unique machine identifier.
    pub id: MachineId,
    /// Display-only name.
    pub name: String,
}

/// An atomic, non-preemptible unit of work on one machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// The machine this step runs on. Must reference an existing machine.
    pub machine_id: MachineId,
    /// Duration in whole hours. Always `>= 1` once normalized.
    pub duration_hours: u32,
}

/// A job: an ordered sequence of steps with a due time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// Display-only name.
    pub name: String,
    /// Ordered steps; execution follows list order, no branching. Non-empty
    /// once normalized.
    pub steps: Vec<Step>,
    /// Due hour; 24 means end of day. Always `>= 0` once normalized.
    pub due_time_hour: u32,
}

// ============================================================================
// SECTION: Factory Configuration
// ============================================================================

/// Soft cap on machines per factory; enforced by the normalizer via truncation.
pub const MAX_MACHINES: usize = 10;
/// Soft cap on jobs per factory; enforced by the normalizer via truncation.
pub const MAX_JOBS: usize = 15;
/// Soft cap on steps per job; enforced by the normalizer via truncation.
pub const MAX_STEPS_PER_JOB: usize = 10;

/// The validated, immutable factory model. Constructed only by
/// [`crate::normalize::normalize`] or the toy-factory fallback; consumed
/// read-only by the decision pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Machines, insertion-ordered, unique by id.
    pub machines: Vec<Machine>,
    /// Jobs, insertion-ordered, unique by id.
    pub jobs: Vec<Job>,
}

impl FactoryConfig {
    /// Returns the machine with the given id, if present.
    #[must_use]
    pub fn machine(&self, id: &MachineId) -> Option<&Machine> {
        self.machines.iter().find(|m| &m.id == id)
    }

    /// Returns the job with the given id, if present.
    #[must_use]
    pub fn job(&self, id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| &j.id == id)
    }

    /// Returns true when every §3 invariant holds: unique machine/job ids,
    /// every step references an existing machine, every job has at least one
    /// step, all durations `>= 1`, all due times `>= 0`, and the soft caps
    /// are respected.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let machine_ids: BTreeSet<&MachineId> = self.machines.iter().map(|m| &m.id).collect();
        if machine_ids.len() != self.machines.len() {
            return false;
        }
        let job_ids: BTreeSet<&JobId> = self.jobs.iter().map(|j| &j.id).collect();
        if job_ids.len() != self.jobs.len() {
            return false;
        }
        if self.machines.is_empty() || self.jobs.is_empty() {
            return false;
        }
        if self.machines.len() > MAX_MACHINES || self.jobs.len() > MAX_JOBS {
            return false;
        }
        self.jobs.iter().all(|job| {
            !job.steps.is_empty()
                && job.steps.len() <= MAX_STEPS_PER_JOB
                && job.steps.iter().all(|step| {
                    step.duration_hours >= 1 && machine_ids.contains(&step.machine_id)
                })
        })
    }
}

// ============================================================================
// SECTION: Explicit Ids (O0 ground truth)
// ============================================================================

/// The machine/job ids a factory description literally mentions, as found by
/// O0's pure regex pass. This is the ground truth later LLM output is
/// checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplicitIds {
    /// Machine ids the text literally mentions.
    pub machine_ids: BTreeSet<MachineId>,
    /// Job ids the text literally mentions.
    pub job_ids: BTreeSet<JobId>,
}

// ============================================================================
// SECTION: Scenarios
// ============================================================================

/// The closed set of scenario types. No other values exist; any LLM output
/// outside this set is normalized to [`ScenarioType::Baseline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioType {
    /// No perturbation; schedule the factory as described.
    Baseline,
    /// A job's due time is tightened (see scheduler §4.3).
    RushArrives,
    /// `M2`'s step durations are multiplied by a slowdown factor.
    M2Slowdown,
}

/// A single what-if scenario to simulate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// The scenario variant.
    pub scenario_type: ScenarioType,
    /// Required iff `scenario_type == RushArrives`; must reference a job in
    /// the factory.
    pub rush_job_id: Option<JobId>,
    /// Required iff `scenario_type == M2Slowdown`; must be `>= 2`.
    pub slowdown_factor: Option<u32>,
}

impl ScenarioSpec {
    /// The baseline scenario: no perturbation.
    #[must_use]
    pub const fn baseline() -> Self {
        Self {
            scenario_type: ScenarioType::Baseline,
            rush_job_id: None,
            slowdown_factor: None,
        }
    }

    /// Returns true when this spec's parameters satisfy its own variant's
    /// requirements against the given factory (the same check D1/D2
    /// normalization performs before accepting a candidate).
    #[must_use]
    pub fn is_well_formed(&self, factory: &FactoryConfig) -> bool {
        match self.scenario_type {
            ScenarioType::Baseline => true,
            ScenarioType::RushArrives => self
                .rush_job_id
                .as_ref()
                .is_some_and(|id| factory.job(id).is_some()),
            ScenarioType::M2Slowdown => self.slowdown_factor.is_some_and(|f| f >= 2),
        }
    }
}

// ============================================================================
// SECTION: Simulation Output
// ============================================================================

/// A single machine-step placement produced by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledStep {
    /// The job this step belongs to.
    pub job_id: JobId,
    /// The machine this step runs on.
    pub machine_id: MachineId,
    /// Start hour, `>= 0`.
    pub start_hour: u32,
    /// End hour; `end_hour == start_hour + effective_duration`.
    pub end_hour: u32,
}

/// The deterministic result of simulating one scenario spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Scheduled steps in placement order.
    pub scheduled_steps: Vec<ScheduledStep>,
    /// End hour of each job's last step, keyed by job id.
    pub job_completion_times: Vec<(JobId, u32)>,
    /// Maximum completion time across all jobs; `>= 1`.
    pub makespan_hour: u32,
}

impl SimulationResult {
    /// Looks up a job's completion time.
    #[must_use]
    pub fn completion_for(&self, job_id: &JobId) -> Option<u32> {
        self.job_completion_times
            .iter()
            .find(|(id, _)| id == job_id)
            .map(|(_, hour)| *hour)
    }
}

/// Per-scenario metrics derived from a [`SimulationResult`] (D4 output).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    /// Copied directly from the simulation result.
    pub makespan_hour: u32,
    /// `max(0, completion - due)` per job.
    pub job_lateness: Vec<(JobId, u32)>,
    /// The machine with the greatest total busy hours; ties broken
    /// lexicographically.
    pub bottleneck_machine_id: MachineId,
    /// `busy_hours[bottleneck] / makespan_hour`, clamped to `[0.0, 1.0]`.
    pub bottleneck_utilization: f64,
}

impl ScenarioMetrics {
    /// Looks up a job's lateness.
    #[must_use]
    pub fn lateness_for(&self, job_id: &JobId) -> Option<u32> {
        self.job_lateness
            .iter()
            .find(|(id, _)| id == job_id)
            .map(|(_, hours)| *hours)
    }
}
