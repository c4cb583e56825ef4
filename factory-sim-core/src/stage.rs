// factory-sim-core/src/stage.rs
// ============================================================================
// Module: Stage Records
// Description: The status/record types the orchestrator emits for each of
//              the ten pipeline stages.
// Purpose: Give every stage a uniform, serializable trace shape.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`StageRecord`] is the one artifact every stage produces, success or
//! not. The orchestrator assembles these into a [`PipelineDebugPayload`]; it
//! never inspects a stage's internal state beyond what the record exposes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Stage Identity
// ============================================================================

/// The ten fixed stage identifiers, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageId {
    /// O0: explicit id extraction (regex).
    O0,
    /// O1: coarse structure extraction (LLM).
    O1,
    /// O2: fine-grained extraction (LLM).
    O2,
    /// O3: normalization (pure).
    O3,
    /// O4: coverage gate (pure).
    O4,
    /// D1: intent classification (LLM).
    D1,
    /// D2: futures/scenario expansion (LLM).
    D2,
    /// D3: EDD scheduling (pure).
    D3,
    /// D4: metrics derivation (pure).
    D4,
    /// D5: narrative briefing (LLM with deterministic fallback).
    D5,
}

impl StageId {
    /// The ten stage ids in fixed pipeline order.
    pub const ALL: [Self; 10] = [
        Self::O0,
        Self::O1,
        Self::O2,
        Self::O3,
        Self::O4,
        Self::D1,
        Self::D2,
        Self::D3,
        Self::D4,
        Self::D5,
    ];

    /// The human-facing stage name used in logs and stage records.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::O0 => "explicit_id_extraction",
            Self::O1 => "coarse_structure_extraction",
            Self::O2 => "fine_extraction",
            Self::O3 => "normalize",
            Self::O4 => "coverage_gate",
            Self::D1 => "intent_classification",
            Self::D2 => "scenario_expansion",
            Self::D3 => "edd_scheduling",
            Self::D4 => "metrics_derivation",
            Self::D5 => "narrative_briefing",
        }
    }

    /// Which half of the pipeline this stage belongs to.
    #[must_use]
    pub const fn kind(self) -> StageKind {
        match self {
            Self::O0 | Self::O1 | Self::O2 | Self::O3 | Self::O4 => StageKind::Onboarding,
            Self::D1 | Self::D2 | Self::D3 | Self::D4 | Self::D5 => StageKind::Decision,
        }
    }

    /// The stage code as printed in `StageRecord.id` (e.g. `"O0"`, `"D5"`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::O0 => "O0",
            Self::O1 => "O1",
            Self::O2 => "O2",
            Self::O3 => "O3",
            Self::O4 => "O4",
            Self::D1 => "D1",
            Self::D2 => "D2",
            Self::D3 => "D3",
            Self::D4 => "D4",
            Self::D5 => "D5",
        }
    }
}

// ============================================================================
// SECTION: Stage Status / Kind
// ============================================================================

/// The outcome of running one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    /// The stage ran and produced a usable result.
    Success,
    /// The stage ran but could not produce a usable result.
    Failed,
    /// The stage did not run because an earlier stage in its half failed.
    Skipped,
}

/// Which half of the pipeline a stage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageKind {
    /// O0..O4: turns free text into a validated `FactoryConfig`.
    Onboarding,
    /// D1..D5: turns a `FactoryConfig` into scenarios, metrics, and a briefing.
    Decision,
}

/// The overall pipeline outcome, derived from all ten stage statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    /// Every stage succeeded.
    Success,
    /// Onboarding fell back to the toy factory but decision-making completed.
    Partial,
    /// Cancellation, or a decision-stage logic failure.
    Failed,
}

// ============================================================================
// SECTION: Stage Record
// ============================================================================

/// The uniform record every stage produces exactly once per pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    /// The stage code, e.g. `"O0"`.
    pub id: String,
    /// The human-facing stage name.
    pub name: String,
    /// Which half of the pipeline this stage belongs to.
    pub kind: StageKind,
    /// The outcome of running this stage.
    pub status: StageStatus,
    /// Provider/model tag for LLM-backed stages; `None` for deterministic ones.
    pub agent_model: Option<String>,
    /// Stage-specific key/value summary, for operator-facing debug output.
    pub summary: Value,
    /// Short error strings, each at most 200 characters.
    pub errors: Vec<String>,
}

impl StageRecord {
    /// Builds a `SUCCESS` record.
    #[must_use]
    pub fn success(stage_id: StageId, agent_model: Option<&str>, summary: Value) -> Self {
        Self::record(stage_id, StageStatus::Success, agent_model, summary, Vec::new())
    }

    /// Builds a `FAILED` record with the given error strings.
    #[must_use]
    pub fn failed(stage_id: StageId, agent_model: Option<&str>, errors: Vec<String>) -> Self {
        Self::record(stage_id, StageStatus::Failed, agent_model, Value::Null, errors)
    }

    /// Builds a `SKIPPED` record; only the orchestrator constructs these.
    #[must_use]
    pub fn skipped(stage_id: StageId) -> Self {
        Self::record(stage_id, StageStatus::Skipped, None, Value::Null, Vec::new())
    }

    /// Truncates each error string to 200 characters and constructs a record.
    fn record(
        stage_id: StageId,
        status: StageStatus,
        agent_model: Option<&str>,
        summary: Value,
        errors: Vec<String>,
    ) -> Self {
        let errors = errors
            .into_iter()
            .map(|error| truncate(&error, 200))
            .collect();
        Self {
            id: stage_id.code().to_owned(),
            name: stage_id.name().to_owned(),
            kind: stage_id.kind(),
            status,
            agent_model: agent_model.map(ToOwned::to_owned),
            summary,
            errors,
        }
    }
}

/// Truncates `text` to at most `max_len` characters, respecting char boundaries.
fn truncate(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((byte_index, _)) => text[..byte_index].to_owned(),
        None => text.to_owned(),
    }
}

// ============================================================================
// SECTION: Debug Payload / Onboarding Meta
// ============================================================================

/// Char-count and preview of one input text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputPreview {
    /// Total character count of the original text.
    pub char_count: usize,
    /// The first 200 characters of the text.
    pub preview: String,
}

impl InputPreview {
    /// Builds a preview from the full input text.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            char_count: text.chars().count(),
            preview: truncate(text, 200),
        }
    }
}

/// The two input previews carried in a [`PipelineDebugPayload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugInputs {
    /// Preview of the factory description text.
    pub factory_description: InputPreview,
    /// Preview of the operator situation text.
    pub situation_text: InputPreview,
}

/// The full per-run trace: inputs, overall status, and every stage record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDebugPayload {
    /// Previews of both input texts.
    pub inputs: DebugInputs,
    /// The pipeline's final outcome.
    pub overall_status: OverallStatus,
    /// Exactly ten entries, one per [`StageId`], in pipeline order.
    pub stages: Vec<StageRecord>,
}

/// Onboarding-specific summary carried alongside the factory model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingMeta {
    /// True iff the toy-factory fallback was substituted for the real model.
    pub used_default_factory: bool,
    /// Short error strings recorded while onboarding was attempted.
    pub onboarding_errors: Vec<String>,
    /// Assumptions the pipeline made to fill gaps in the input text.
    pub inferred_assumptions: Vec<String>,
}
