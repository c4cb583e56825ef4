// factory-sim-core/src/errors.rs
// ============================================================================
// Module: Stage Error Taxonomy
// Description: The error kinds a pipeline stage can fail with.
// Purpose: Give the orchestrator one small, closed set of failure reasons it
//          can turn into STATUS/PARTIAL/FAILED decisions.
// Dependencies: thiserror, crate::gateway
// ============================================================================

//! ## Overview
//! `StageError` is the only error type a stage function returns. LLM-backed
//! stages convert a [`crate::gateway::GatewayError`] into one of these at the
//! call site; pure stages construct them directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::gateway::GatewayError;

// ============================================================================
// SECTION: Stage Errors
// ============================================================================

/// The closed set of reasons a pipeline stage can fail.
#[derive(Debug, Error)]
pub enum StageError {
    /// The model gateway could not be reached or timed out.
    #[error("model gateway transport failure: {0}")]
    Transport(String),
    /// The model gateway returned a response that failed schema validation.
    #[error("model gateway response failed schema validation: {0}")]
    Parse(String),
    /// The model explicitly declined to answer.
    #[error("model gateway refused the request: {0}")]
    Refused(String),
    /// A pure stage's input failed a required precondition.
    #[error("stage precondition failed: {0}")]
    PreconditionFailed(String),
    /// The explicit-id coverage gate (O4) rejected the onboarded factory.
    #[error("coverage gate failed: machine coverage {machine_coverage}, job coverage {job_coverage}")]
    CoverageGateFailed {
        /// Ratio of explicit machine ids found in the parsed factory.
        machine_coverage: f64,
        /// Ratio of explicit job ids found in the parsed factory.
        job_coverage: f64,
    },
}

impl From<GatewayError> for StageError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Transport(message) => Self::Transport(message),
            GatewayError::Parse(message) => Self::Parse(message),
            GatewayError::Refused(message) => Self::Refused(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_transport_error_converts_to_stage_transport_error() {
        let stage_error: StageError = GatewayError::Transport("timed out".to_owned()).into();
        assert!(matches!(stage_error, StageError::Transport(_)));
    }
}
