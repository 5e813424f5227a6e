//! # lifecycle
//!
//! HTTP server and CLI for the research data lifecycle dataset.
//! Storage access goes through `lifecycle-core`.

pub mod api;
pub mod cli;
pub mod config;
