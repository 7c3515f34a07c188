//! Integration test suite for envgen
//!
//! These tests drive the `envgen` binary end to end against temporary
//! directories, plus a few library-level scenarios that need fake command
//! runners.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **stdout**: default target, internal variables, overrides
//! - **dotenv**: non-destructive merges and rerun behaviour
//! - **file_formats**: JSON, TOML, YAML and Komodo targets
//! - **errors**: exit codes and messages for failing runs
//! - **pipeline**: generation, validation and storage through the library API

mod common;

mod dotenv;
mod errors;
mod file_formats;
mod pipeline;
mod stdout;
