//! # Grounder CLI Library
//!
//! This crate provides the functionality behind the `grounder` binary: a
//! terminal front end for the retrieval engine in `grounder-rag`.
//!
//! ## Modules
//!
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration file management
//! - [`engine`] - Wiring from configuration to a runnable engine
//! - [`errors`] - Error display and exit-code mapping
//! - [`exit_codes`] - Standard exit codes

pub mod commands;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exit_codes;

// Re-export commonly used types
pub use config::Config;
