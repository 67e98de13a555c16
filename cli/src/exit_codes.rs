//! # Exit Codes
//!
//! Standard exit codes for the Grounder CLI.
//!
//! These codes follow common Unix conventions and provide meaningful
//! feedback to scripts and CI/CD pipelines.

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// General error (unspecified)
pub const EXIT_ERROR: i32 = 1;

/// Configuration error (missing or invalid config)
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Network error (connection failed, timeout, etc.)
pub const EXIT_NETWORK_ERROR: i32 = 4;

/// Invalid input (bad arguments, invalid files, etc.)
pub const EXIT_INVALID_INPUT: i32 = 6;

/// Upstream service error (completion or search API failure)
pub const EXIT_SERVICE_ERROR: i32 = 7;
