// factory-sim-providers/src/mock.rs
// ============================================================================
// Module: Mock Model Gateway
// Description: Scripted ModelGateway implementation for harness/test use.
// Purpose: Let binding crates and the eval harness exercise the pipeline
//          without network I/O, with deterministic, call-count-indexed
//          responses.
// Dependencies: factory-sim-core, serde_json, tokio (sync primitives)
// ============================================================================

//! ## Overview
//! [`MockModelGateway`] is queue-based: each `call_json` pops the next
//! scripted outcome. A queue that runs dry fails the call with
//! [`GatewayError::Transport`] rather than panicking, so a harness run that
//! makes one more gateway call than expected fails loudly instead of
//! hanging.

use std::sync::Mutex;

use async_trait::async_trait;
use factory_sim_core::GatewayError;
use factory_sim_core::ModelGateway;
use serde_json::Value;

/// A single scripted response for one `call_json` invocation.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Return this value, as if the model replied successfully.
    Value(Value),
    /// Fail with this error, as if the provider or network failed.
    Error(GatewayError),
}

/// Queue-driven [`ModelGateway`] for deterministic tests and harness runs.
pub struct MockModelGateway {
    /// Remaining scripted responses, popped from the front on each call.
    queue: Mutex<Vec<ScriptedResponse>>,
    /// When `true`, the last queued response repeats forever instead of
    /// exhausting the queue.
    repeat_last: bool,
}

impl MockModelGateway {
    /// Builds a gateway that replays `responses` in order, one per call,
    /// then fails every call after the queue is exhausted.
    #[must_use]
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self { queue: Mutex::new(responses), repeat_last: false }
    }

    /// Builds a gateway that always returns `value`, regardless of call count.
    #[must_use]
    pub fn always(value: Value) -> Self {
        Self { queue: Mutex::new(vec![ScriptedResponse::Value(value)]), repeat_last: true }
    }

    /// Builds a gateway that always fails with `error`.
    #[must_use]
    pub fn always_failing(error: GatewayError) -> Self {
        Self { queue: Mutex::new(vec![ScriptedResponse::Error(error)]), repeat_last: true }
    }
}

#[async_trait]
impl ModelGateway for MockModelGateway {
    async fn call_json(&self, _prompt: &str, _schema: &Value) -> Result<Value, GatewayError> {
        #[allow(clippy::unwrap_used, reason = "Mutex is only ever locked by this method; a poisoned lock is a test bug.")]
        let mut queue = self.queue.lock().unwrap();
        let response = if self.repeat_last && queue.len() == 1 {
            queue[0].clone()
        } else if queue.is_empty() {
            return Err(GatewayError::Transport("mock queue exhausted".to_owned()));
        } else {
            queue.remove(0)
        };
        match response {
            ScriptedResponse::Value(value) => Ok(value),
            ScriptedResponse::Error(error) => Err(error),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn always_repeats_the_same_value() {
        let gateway = MockModelGateway::always(json!({"ok": true}));
        let first = gateway.call_json("p", &json!({})).await.unwrap();
        let second = gateway.call_json("p", &json!({})).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn queue_pops_in_order_then_exhausts() {
        let gateway = MockModelGateway::new(vec![
            ScriptedResponse::Value(json!({"n": 1})),
            ScriptedResponse::Value(json!({"n": 2})),
        ]);
        assert_eq!(gateway.call_json("p", &json!({})).await.unwrap(), json!({"n": 1}));
        assert_eq!(gateway.call_json("p", &json!({})).await.unwrap(), json!({"n": 2}));
        assert!(gateway.call_json("p", &json!({})).await.is_err());
    }

    #[tokio::test]
    async fn always_failing_never_succeeds() {
        let gateway = MockModelGateway::always_failing(GatewayError::Refused("no".to_owned()));
        assert!(gateway.call_json("p", &json!({})).await.is_err());
        assert!(gateway.call_json("p", &json!({})).await.is_err());
    }
}
