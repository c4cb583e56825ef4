// factory-sim-config/src/lib.rs
// ============================================================================
// Module: Factory Sim Config Library
// Description: Canonical environment-variable configuration for the
//              pipeline's gateway and HTTP binding.
// Purpose: Single source of truth for which env vars the system reads and
//          how it fails closed when a required one is missing.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! This crate is the environment-variable counterpart to the teacher's
//! TOML-file config crate: same fail-closed posture (a required value
//! missing produces a typed error the caller must handle, never a silent
//! default), scoped down to the handful of values this system actually
//! consumes.

pub mod config;

pub use config::ConfigError;
pub use config::CorsConfig;
pub use config::FactorySimConfig;
pub use config::GatewayConfig;
