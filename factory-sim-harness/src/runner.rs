// factory-sim-harness/src/runner.rs
// ============================================================================
// Module: Harness Runner
// Description: Replays every fixture a FixtureSource exposes through the
//              pipeline and checks invariants on the result.
// Purpose: The harness's one entry point.
// Dependencies: factory-sim-core, crate::{invariants, report, source}
// ============================================================================

//! ## Overview
//! `run_harness` is intentionally the only place the harness drives
//! `run_pipeline`; everything else in this crate is a pure check or a
//! pluggable source.

use std::time::Duration;

use factory_sim_core::ModelGateway;
use factory_sim_core::run_pipeline;

use crate::invariants::check_all;
use crate::report::FixtureOutcome;
use crate::report::HarnessReport;
use crate::source::FixtureSource;

/// Runs every fixture `source` exposes through the pipeline with `gateway`,
/// checking invariants on each result.
///
/// Fixtures missing from the source mid-run (a race in a file-backed
/// source, say) are skipped rather than panicking; a harness run never
/// aborts partway through the corpus.
pub async fn run_harness(gateway: &dyn ModelGateway, source: &dyn FixtureSource, timeout: Duration) -> HarnessReport {
    let mut outcomes = Vec::new();
    for fixture_id in source.fixture_ids() {
        let Ok(fixture) = source.fixture(&fixture_id) else {
            continue;
        };
        let output = run_pipeline(gateway, &fixture.factory_description, &fixture.situation_text, timeout).await;
        outcomes.push(FixtureOutcome { fixture_id, failed_invariants: check_all(&output) });
    }
    HarnessReport { outcomes }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::use_debug,
    reason = "Tests use unwrap on deterministic fixtures and Debug-format assertion messages."
)]
mod tests {
    use super::*;
    use crate::source::Fixture;
    use crate::source::InMemoryFixtureSource;
    use factory_sim_providers::MockModelGateway;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn echo_gateway() -> MockModelGateway {
        MockModelGateway::always(json!({
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
        }))
    }

    #[tokio::test]
    async fn well_behaved_run_passes_every_invariant() {
        let source = InMemoryFixtureSource::new().with_fixture(Fixture {
            id: "happy-path".to_owned(),
            factory_description: "Machines M1. Jobs J1.".to_owned(),
            situation_text: "normal day".to_owned(),
            expectations: BTreeMap::new(),
        });
        let report = run_harness(&echo_gateway(), &source, Duration::from_millis(100)).await;
        assert!(report.all_passed(), "{:?}", report.failures());
    }

    #[tokio::test]
    async fn empty_source_produces_an_empty_report() {
        let source = InMemoryFixtureSource::new();
        let report = run_harness(&echo_gateway(), &source, Duration::from_millis(100)).await;
        assert!(report.outcomes.is_empty());
    }
}
