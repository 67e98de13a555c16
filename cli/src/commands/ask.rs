//! # Ask Command
//!
//! Runs one question through the retrieval pipeline and renders the
//! grounded answer.
//!
//! ## Usage
//!
//! ```bash
//! # One-shot question
//! grounder ask "What were the main findings of the study?"
//!
//! # Machine-readable output
//! grounder ask --json "What were the main findings?"
//! ```

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use termimad::MadSkin;

use grounder_rag::types::SessionState;

use crate::config::Config;
use crate::engine::{build_engine, EngineOverrides};
use crate::errors::report_engine_error;
use crate::exit_codes::*;

/// Maximum rendering width for markdown output
const MARKDOWN_MAX_WIDTH: usize = 100;

/// Arguments for the ask command
#[derive(Debug)]
pub struct AskArgs {
    /// The question to answer
    pub question: String,
    /// Thread id for checkpointing; generated when absent
    pub thread: Option<String>,
    /// Output as JSON
    pub json: bool,
    /// Override the refinement loop budget
    pub loops: Option<u32>,
    /// Override the fused result count
    pub top_k: Option<usize>,
    /// Enable verbose output
    pub verbose: bool,
}

/// Execute the ask command
pub async fn execute(args: AskArgs) -> Result<i32> {
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

    let overrides = EngineOverrides {
        max_loops: args.loops,
        top_k: args.top_k,
    };
    let engine = match build_engine(&config, overrides) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            return Ok(EXIT_CONFIG_ERROR);
        }
    };

    let thread_id = args
        .thread
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
    log::debug!("running turn on thread {thread_id}");

    let state = match engine.run_turn(&args.question, &thread_id).await {
        Ok(state) => state,
        Err(e) => return Ok(report_engine_error(&e)),
    };

    if args.json {
        print_json(&args.question, &thread_id, &state)?;
    } else {
        render_answer(&state, args.verbose);
    }
    Ok(EXIT_SUCCESS)
}

fn print_json(question: &str, thread_id: &str, state: &SessionState) -> Result<()> {
    let payload = json!({
        "question": question,
        "thread_id": thread_id,
        "answer": state.draft,
        "plan": state.plan,
        "queries": state.queries,
        "loops": state.loop_count,
        "sources": state.graded_docs.iter().map(|d| &d.metadata).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn render_answer(state: &SessionState, verbose: bool) {
    if verbose {
        println!("{}", "Queries".cyan().bold());
        for query in &state.queries {
            println!("  • {query}");
        }
        println!(
            "{} {} candidates kept, {} refinement loop(s)",
            "Context:".dimmed(),
            state.graded_docs.len(),
            state.loop_count
        );
        println!();
    }

    render_markdown(&state.draft);
    println!();
}

/// Build the markdown skin used for answer rendering
fn create_markdown_skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.set_headers_fg(termimad::crossterm::style::Color::Cyan);
    skin.bold.set_fg(termimad::crossterm::style::Color::White);
    skin.italic
        .set_fg(termimad::crossterm::style::Color::Yellow);
    skin
}

/// Render markdown text with a maximum width
fn render_markdown(text: &str) {
    let skin = create_markdown_skin();
    let area = termimad::Area::new(0, 0, MARKDOWN_MAX_WIDTH as u16, u16::MAX);
    let fmt_text = termimad::FmtText::from(&skin, text, Some(area.width as usize));
    print!("{}", fmt_text);
}
