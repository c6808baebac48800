//! Threat Feed - cyber-security news aggregation
//!
//! This crate merges cyber-security news from several news APIs, removes
//! duplicates and serves a small, regularly refreshed "latest threats" view.

pub mod aggregator;
pub mod article;
pub mod client;
pub mod config;
pub mod display;
pub mod poller;
pub mod providers;
pub mod routes;
pub mod translate;
