//! Rift Core - Conflict model and configuration
//!
//! This crate holds the value types every other Rift crate consumes:
//! - **Domain entities** - `Conflict`, `Resolution`, `ConflictRecord`
//! - **Identifiers** - `ConflictId`
//! - **Configuration** - YAML-backed `Config` with validation
//!
//! Nothing in here performs I/O except [`config::Config::load`].

pub mod config;
pub mod domain;
