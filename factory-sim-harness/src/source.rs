// factory-sim-harness/src/source.rs
// ============================================================================
// Module: Fixture Sources
// Description: Pluggable sourcing of (factory_description, situation_text,
//              expectations) fixtures.
// Purpose: Keep fixture I/O swappable and out of the invariant-checking path.
// Dependencies: std::collections
// ============================================================================

//! ## Overview
//! [`InMemoryFixtureSource`] is always available and is what the harness's
//! own tests use. A file-backed source (reading a fixture corpus off disk)
//! is the out-of-scope I/O concern named alongside this crate's purpose —
//! any type implementing [`FixtureSource`] plugs into [`crate::run_harness`]
//! the same way.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// One fixture: two free-form input texts plus machine-checkable expectations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    /// Stable fixture identifier, used in [`crate::FixtureOutcome`].
    pub id: String,
    /// Free-form factory description text.
    pub factory_description: String,
    /// Operator situation text.
    pub situation_text: String,
    /// Machine-checkable expectations, keyed by assertion name (e.g.
    /// `"overall_status"` → `"SUCCESS"`). Interpretation is up to the
    /// invariant checks that consume a given key.
    pub expectations: BTreeMap<String, Value>,
}

/// Errors raised while resolving a fixture corpus.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixtureSourceError {
    /// No fixture exists under the requested id.
    #[error("unknown fixture id: {0}")]
    NotFound(String),
}

/// A pluggable source of fixtures for [`crate::run_harness`].
pub trait FixtureSource {
    /// Returns every fixture id this source can resolve, in a stable order.
    fn fixture_ids(&self) -> Vec<String>;

    /// Resolves one fixture by id.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureSourceError::NotFound`] when `id` is unknown.
    fn fixture(&self, id: &str) -> Result<Fixture, FixtureSourceError>;
}

/// An in-memory, always-available [`FixtureSource`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryFixtureSource {
    /// Fixtures keyed by id, in insertion order.
    fixtures: Vec<Fixture>,
}

impl InMemoryFixtureSource {
    /// Builds a source with no fixtures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `fixture` to the corpus, returning `self` for chaining.
    #[must_use]
    pub fn with_fixture(mut self, fixture: Fixture) -> Self {
        self.fixtures.push(fixture);
        self
    }
}

impl FixtureSource for InMemoryFixtureSource {
    fn fixture_ids(&self) -> Vec<String> {
        self.fixtures.iter().map(|f| f.id.clone()).collect()
    }

    fn fixture(&self, id: &str) -> Result<Fixture, FixtureSourceError> {
        self.fixtures
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| FixtureSourceError::NotFound(id.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]
mod tests {
    use super::*;

    fn sample(id: &str) -> Fixture {
        Fixture {
            id: id.to_owned(),
            factory_description: "3 machines: M1, M2, M3.".to_owned(),
            situation_text: "normal day".to_owned(),
            expectations: BTreeMap::new(),
        }
    }

    #[test]
    fn resolves_a_known_fixture() {
        let source = InMemoryFixtureSource::new().with_fixture(sample("happy-path"));
        assert_eq!(source.fixture_ids(), vec!["happy-path".to_owned()]);
        assert!(source.fixture("happy-path").is_ok());
    }

    #[test]
    fn unknown_fixture_id_is_an_error() {
        let source = InMemoryFixtureSource::new();
        assert_eq!(source.fixture("missing"), Err(FixtureSourceError::NotFound("missing".to_owned())));
    }
}
