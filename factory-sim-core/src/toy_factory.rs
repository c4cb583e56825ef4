// factory-sim-core/src/toy_factory.rs
// ============================================================================
// Module: Toy Factory Fallback
// Description: The fixed, known-good factory substituted when onboarding
//              cannot produce a valid model.
// Purpose: Guarantee the decision pipeline always has a valid FactoryConfig
//          to run against.
// Dependencies: crate::model
// ============================================================================

//! ## Overview
//! `toy_factory` is a constant, not a generator: three machines, three jobs,
//! matching the worked happy-path example. Every call returns an identical,
//! independent [`FactoryConfig`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::model::FactoryConfig;
use crate::model::Job;
use crate::model::JobId;
use crate::model::Machine;
use crate::model::MachineId;
use crate::model::Step;

// ============================================================================
// SECTION: Toy Factory
// ============================================================================

/// The known-good 3-machine / 3-job factory used whenever onboarding falls
/// back (§4.10). `M1 Assembly`, `M2 Drill`, `M3 Pack`; jobs `J1`, `J2`, `J3`.
#[must_use]
pub fn toy_factory() -> FactoryConfig {
    FactoryConfig {
        machines: vec![
            Machine { id: MachineId::new("M1"), name: "Assembly".to_owned() },
            Machine { id: MachineId::new("M2"), name: "Drill".to_owned() },
            Machine { id: MachineId::new("M3"), name: "Pack".to_owned() },
        ],
        jobs: vec![
            Job {
                id: JobId::new("J1"),
                name: "Job J1".to_owned(),
                steps: vec![
                    Step { machine_id: MachineId::new("M1"), duration_hours: 2 },
                    Step { machine_id: MachineId::new("M2"), duration_hours: 3 },
                    Step { machine_id: MachineId::new("M3"), duration_hours: 1 },
                ],
                due_time_hour: 12,
            },
            Job {
                id: JobId::new("J2"),
                name: "Job J2".to_owned(),
                steps: vec![
                    Step { machine_id: MachineId::new("M1"), duration_hours: 1 },
                    Step { machine_id: MachineId::new("M2"), duration_hours: 2 },
                    Step { machine_id: MachineId::new("M3"), duration_hours: 1 },
                ],
                due_time_hour: 14,
            },
            Job {
                id: JobId::new("J3"),
                name: "Job J3".to_owned(),
                steps: vec![
                    Step { machine_id: MachineId::new("M2"), duration_hours: 1 },
                    Step { machine_id: MachineId::new("M3"), duration_hours: 2 },
                ],
                due_time_hour: 16,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::schedule;

    #[test]
    fn toy_factory_is_valid() {
        assert!(toy_factory().is_valid());
    }

    #[test]
    fn toy_factory_schedules_deterministically() {
        let factory = toy_factory();
        let first = schedule(&factory);
        let second = schedule(&factory);
        assert_eq!(first, second);
        // No job can complete before the sum of its own step durations.
        for job in &factory.jobs {
            let min_possible: u32 = job.steps.iter().map(|s| s.duration_hours).sum();
            let completion = first.completion_for(&job.id).unwrap_or(0);
            assert!(completion >= min_possible);
        }
    }
}
