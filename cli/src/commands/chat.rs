//! # Chat Command
//!
//! Interactive REPL over the retrieval pipeline. Each session gets its own
//! thread id so finished turns checkpoint separately from other sessions.
//! `exit` or `quit` leaves the loop.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::engine::{build_engine, EngineOverrides};
use crate::errors::{display_info, report_engine_error};
use crate::exit_codes::*;

/// Execute the chat command
pub async fn execute() -> Result<i32> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "{} No configuration found: {e}. Run `grounder config set-llm` first.",
                "Error:".red().bold()
            );
            return Ok(EXIT_CONFIG_ERROR);
        }
    };
    let engine = match build_engine(&config, EngineOverrides::default()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            return Ok(EXIT_CONFIG_ERROR);
        }
    };

    let thread_id = uuid::Uuid::new_v4().simple().to_string();
    display_info("Ask a question, or type 'exit' to leave.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", ">".cyan().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let question = line?.trim().to_string();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        match engine.run_turn(&question, &thread_id).await {
            Ok(state) => {
                println!();
                println!("{}", state.draft);
                println!();
            }
            Err(e) => {
                // Report but keep the session alive for the next question.
                report_engine_error(&e);
            }
        }
    }

    Ok(EXIT_SUCCESS)
}
