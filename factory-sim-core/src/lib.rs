// factory-sim-core/src/lib.rs
// ============================================================================
// Module: Factory Sim Core Library
// Description: Public API surface for the Factory Sim core.
// Purpose: Expose the factory model, pure pipeline stages, the model
//          gateway trait, and the orchestrator.
// Dependencies: crate::{model, normalize, scheduler, metrics, stage, errors,
//               gateway, toy_factory, onboarding, decision, orchestrator}
// ============================================================================

//! ## Overview
//! Factory Sim core implements a ten-stage pipeline that turns a free-form
//! factory description and an operator situation text into a validated
//! factory model, a handful of what-if scenarios, deterministic schedule
//! metrics, and a narrative feasibility briefing. It is backend-agnostic:
//! the only way model I/O happens is through the [`ModelGateway`] trait.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod decision;
pub mod errors;
pub mod gateway;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod onboarding;
pub mod orchestrator;
pub mod scheduler;
pub mod stage;
pub mod toy_factory;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use errors::StageError;

pub use gateway::GatewayError;
pub use gateway::ModelGateway;

pub use model::ExplicitIds;
pub use model::FactoryConfig;
pub use model::Job;
pub use model::JobId;
pub use model::Machine;
pub use model::MachineId;
pub use model::ScenarioMetrics;
pub use model::ScenarioSpec;
pub use model::ScenarioType;
pub use model::ScheduledStep;
pub use model::SimulationResult;
pub use model::Step;
pub use model::MAX_JOBS;
pub use model::MAX_MACHINES;
pub use model::MAX_STEPS_PER_JOB;

pub use normalize::NormalizeWarning;
pub use normalize::RawFactory;
pub use normalize::RawJob;
pub use normalize::RawMachine;
pub use normalize::RawStep;

pub use orchestrator::run_onboarding_only;
pub use orchestrator::run_pipeline;
pub use orchestrator::PipelineOutput;
pub use orchestrator::DEFAULT_LLM_TIMEOUT;

pub use scheduler::apply_scenario;
pub use scheduler::schedule;

pub use metrics::derive_metrics;

pub use stage::DebugInputs;
pub use stage::InputPreview;
pub use stage::OnboardingMeta;
pub use stage::OverallStatus;
pub use stage::PipelineDebugPayload;
pub use stage::StageId;
pub use stage::StageKind;
pub use stage::StageRecord;
pub use stage::StageStatus;

pub use toy_factory::toy_factory;
