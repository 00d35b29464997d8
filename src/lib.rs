//! Fleet Runtime API - Per-day fleet runtime reports over a remote telemetry endpoint
//!
//! This library exposes the core modules for testing and reuse.

pub mod common;
pub mod config;
pub mod error;
pub mod report;
pub mod routes;
pub mod telemetry;
