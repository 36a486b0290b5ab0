//! Prometheus exporter for NSONE DNS statistics.
//!
//! Each scrape of the telemetry path runs one collection cycle: the
//! [`Orchestrator`](collector::Orchestrator) lists the account's zones, fans
//! out one task per enabled metric and entity onto the worker pool, waits for
//! all of them and then either exposes the complete snapshot with
//! `nsone_up 1` or discards it and exposes only `nsone_up 0`.

pub mod api;
pub mod app;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;
