//! # CLI Commands
//!
//! This module contains the command implementations for the Grounder CLI.
//!
//! - [`ask`] - Run one question through the retrieval pipeline
//! - [`chat`] - Interactive REPL with a per-session thread id
//! - [`config`] - Manage the configuration file

pub mod ask;
pub mod chat;
pub mod config;
