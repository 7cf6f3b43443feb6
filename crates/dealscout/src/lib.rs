//! Deal underwriting and buy-box matching engine.
//!
//! The library is organized as workflow modules behind trait seams so the HTTP
//! service, CLI demo, and tests can share one implementation: a pure
//! underwriting calculator, a deterministic matching scorer, an orchestration
//! service over pluggable stores, and a CSV deal importer.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
