//! # Error Handling
//!
//! User-friendly error display functions for the Grounder CLI, plus the
//! mapping from engine errors to exit codes.

use colored::Colorize;
use grounder_rag::EngineError;

use crate::exit_codes::*;

/// Display a network error with helpful suggestions
pub fn display_network_error(message: &str) {
    eprintln!("{} Network error: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!("{}", "Possible causes:".yellow());
    eprintln!("  • No internet connection");
    eprintln!("  • The search or completion endpoint is unreachable");
    eprintln!("  • A request exceeded its timeout");
    eprintln!();
    eprintln!(
        "{} Check your connection and endpoint URLs, then try again.",
        "Tip:".cyan().bold()
    );
}

/// Display a configuration error with helpful suggestions
pub fn display_config_error(message: &str) {
    eprintln!("{} Configuration error: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!("{}", "Possible causes:".yellow());
    eprintln!("  • Configuration file is missing or corrupted");
    eprintln!("  • An API key environment variable is not set");
    eprintln!();
    eprintln!(
        "{} Run `grounder config show` to inspect your setup.",
        "Tip:".cyan().bold()
    );
}

/// Display an upstream service error
pub fn display_service_error(message: &str) {
    eprintln!("{} Service error: {}", "✗".red().bold(), message);
    eprintln!();
    eprintln!(
        "{} The upstream API rejected the request; check model names and keys.",
        "Tip:".cyan().bold()
    );
}

/// Display a generic error
pub fn display_error(message: &str) {
    eprintln!("{} Error: {}", "✗".red().bold(), message);
}

/// Display a success message
pub fn display_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Display an info message
pub fn display_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print an engine error through the matching display helper and return
/// the exit code for it.
pub fn report_engine_error(err: &EngineError) -> i32 {
    match err {
        EngineError::Timeout { .. } | EngineError::Unavailable { .. } => {
            display_network_error(&err.to_string());
            EXIT_NETWORK_ERROR
        }
        EngineError::MissingApiKey { .. } | EngineError::UnsupportedProvider { .. } => {
            display_config_error(&err.to_string());
            EXIT_CONFIG_ERROR
        }
        EngineError::Completion { .. } | EngineError::Malformed { .. } => {
            display_service_error(&err.to_string());
            EXIT_SERVICE_ERROR
        }
        _ => {
            display_error(&err.to_string());
            EXIT_ERROR
        }
    }
}
