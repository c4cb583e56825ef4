// factory-sim-core/src/gateway.rs
// ============================================================================
// Module: Model Gateway
// Description: The single choke-point between typed stage code and an
//              untyped language-model backend.
// Purpose: Convert (prompt, schema) -> validated value, or a typed error.
// Dependencies: async-trait, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every LLM-backed stage (O1, O2, D1, D2, D5) calls through [`ModelGateway`]
//! and nothing else. Concrete backends — HTTP, mock, or otherwise — live in
//! `factory-sim-providers`; this crate only defines the seam.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// The closed set of reasons a model call can fail.
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    /// The backend could not be reached, or the call timed out.
    #[error("transport error: {0}")]
    Transport(String),
    /// The backend responded but the payload did not match the schema.
    #[error("response parse error: {0}")]
    Parse(String),
    /// The backend explicitly refused to answer the prompt.
    #[error("refused: {0}")]
    Refused(String),
}

// ============================================================================
// SECTION: Gateway Trait
// ============================================================================

/// A backend-agnostic channel to a language model.
///
/// Implementations own retries, timeouts, and authentication; callers only
/// see a validated JSON value or a [`GatewayError`].
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Sends `prompt` and validates the response against `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] on network/timeout failure,
    /// [`GatewayError::Parse`] when the response fails schema validation,
    /// and [`GatewayError::Refused`] when the model declines the request.
    async fn call_json(&self, prompt: &str, schema: &Value) -> Result<Value, GatewayError>;
}
