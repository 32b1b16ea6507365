//! # Configuration
//!
//! Layered configuration for the PeopleDesk client core: built-in
//! defaults, an optional YAML/JSON file, and `PEOPLEDESK_*` environment
//! overrides.

pub mod client;

pub use client::{Config, ConfigError};
