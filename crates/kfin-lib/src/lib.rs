//! Cost intelligence library for Kubernetes clusters
//!
//! This crate provides the core functionality for:
//! - Usage-based pricing from configured rates or an external oracle
//! - Historical usage statistics from a Prometheus-compatible API
//! - Monthly cost aggregation per workload and per node
//! - The interactive dashboard state machine
//! - Configuration and structured logging

pub mod config;
pub mod cost;
pub mod dashboard;
pub mod models;
pub mod observability;
pub mod pricing;
pub mod stats;

pub use config::Settings;
pub use cost::build_report;
pub use models::*;
pub use observability::StructuredLogger;
pub use pricing::{resolve_pricing, PricingError, PricingResolution, UsageRates};
pub use stats::{StatsError, StatsFreshness};
