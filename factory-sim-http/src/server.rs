// factory-sim-http/src/server.rs
// ============================================================================
// Module: HTTP Router
// Description: Route definitions and handlers for `/api/simulate` and
//              `/api/onboard`.
// Purpose: De/serialize requests, call the orchestrator, shape the response.
// Dependencies: axum, factory-sim-core, factory-sim-contract, tower-http
// ============================================================================

//! ## Overview
//! Handlers never construct their own error types; a malformed JSON body is
//! rejected by axum's `Json` extractor before a handler runs, which already
//! maps to `400`. The only other failure mode this crate introduces — an
//! empty CORS origin list meaning "no cross-origin access" — is not an
//! error at all.

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::extract::State;
use axum::routing::post;
use factory_sim_contract::DebugQuery;
use factory_sim_contract::OnboardRequest;
use factory_sim_contract::OnboardResponse;
use factory_sim_contract::SimulateRequest;
use factory_sim_contract::SimulateResponse;
use factory_sim_core::run_onboarding_only;
use factory_sim_core::run_pipeline;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Builds the full router: `/api/simulate`, `/api/onboard`, CORS applied.
#[must_use]
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/simulate", post(simulate))
        .route("/api/onboard", post(onboard))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Builds the CORS layer from a configured origin allow-list. An empty
/// list permits no cross-origin requests at all.
fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    if cors_origins.is_empty() {
        return CorsLayer::new();
    }
    let origins: Vec<_> = cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods([axum::http::Method::POST])
}

/// `POST /api/simulate`.
async fn simulate(
    State(state): State<AppState>,
    Query(debug_query): Query<DebugQuery>,
    Json(request): Json<SimulateRequest>,
) -> Json<SimulateResponse> {
    let output =
        run_pipeline(state.gateway.as_ref(), &request.factory_description, &request.situation_text, state.timeout)
            .await;
    Json(SimulateResponse {
        factory: output.factory,
        specs: output.specs,
        metrics: output.metrics,
        briefing: output.briefing,
        meta: output.meta,
        debug: debug_query.debug.then_some(output.debug),
    })
}

/// `POST /api/onboard`.
async fn onboard(State(state): State<AppState>, Json(request): Json<OnboardRequest>) -> Json<OnboardResponse> {
    let (factory, meta) =
        run_onboarding_only(state.gateway.as_ref(), &request.factory_description, state.timeout).await;
    Json(OnboardResponse { factory, meta })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::http::StatusCode;
    use factory_sim_providers::MockModelGateway;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let gateway = MockModelGateway::always(json!({
            "machines": [{"id": "M1", "name": "Assembly"}],
            "jobs": [{
                "id": "J1",
                "name": "Widget",
                "due_time_hour": 10,
                "steps": [{"machine_id": "M1", "duration_hours": 2}],
            }],
            "scenario_type": "BASELINE",
            "constraints": "",
            "candidates": [{"scenario_type": "BASELINE", "constraints": ""}],
            "justification": "baseline is representative",
            "briefing": "# Briefing\n\nAll clear.",
        }));
        AppState::new(Arc::new(gateway), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn simulate_returns_200_with_matching_spec_metric_counts() {
        let app = router(test_state(), &[]);
        let body = serde_json::to_vec(&SimulateRequest {
            factory_description: "Machines M1. Jobs J1.".to_owned(),
            situation_text: "normal day".to_owned(),
        })
        .unwrap();
        let response = app
            .oneshot(
                Request::post("/api/simulate")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: SimulateResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.specs.len(), parsed.metrics.len());
        assert!(parsed.debug.is_none());
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_with_4xx() {
        let app = router(test_state(), &[]);
        let response = app
            .oneshot(
                Request::post("/api/simulate")
                    .header("content-type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn onboard_returns_a_factory_and_meta() {
        let app = router(test_state(), &[]);
        let body = serde_json::to_vec(&OnboardRequest { factory_description: "Machines M1.".to_owned() }).unwrap();
        let response = app
            .oneshot(
                Request::post("/api/onboard")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
