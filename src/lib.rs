//! PagerDuty Prometheus Exporter Library
//!
//! This library samples the PagerDuty REST API on every scrape and renders
//! service, user, team and analytics gauges in the Prometheus text format.

pub mod config;
pub mod client;
pub mod pagination;
pub mod compliance;
pub mod analytics;
pub mod collector;
pub mod metrics;
pub mod models;
pub mod server;
pub mod errors;

pub use config::{Config, CollectorToggles};
pub use client::{IncidentApi, PagerDutyClient};
pub use collector::{ScrapeCollector, ScrapeSnapshot};
pub use errors::{ExporterError, Result};
