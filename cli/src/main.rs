//! # Grounder CLI
//!
//! Grounder — grounded answers from your own documents
//!
//! Grounder retrieves from a hybrid vector + keyword index, filters what
//! it found, and answers with citations. When the evidence is thin it says
//! so instead of guessing.
//!
//! ## Usage
//!
//! ```bash
//! # Configure providers
//! grounder config set-llm openai --model gpt-4o-mini
//!
//! # Ask a question
//! grounder ask "What were the main findings of the study?"
//! ```

use clap::{Parser, Subcommand};
use grounder::commands;

/// Initialize logger based on verbose flag
fn init_logger(verbose: bool) {
    let mut log_builder = env_logger::Builder::from_default_env();
    if verbose {
        log_builder.filter_level(log::LevelFilter::Debug);
    } else {
        log_builder.filter_level(log::LevelFilter::Info);
    }
    log_builder.init();
}

/// Main CLI structure
#[derive(Parser)]
#[command(name = "grounder")]
#[command(about = "Grounder — grounded answers from your own documents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Ask one question and print the grounded answer
    Ask {
        /// The question to answer
        #[arg(value_name = "QUESTION")]
        question: String,
        /// Thread id for checkpointing (generated if not provided)
        #[arg(long, short = 't', value_name = "THREAD_ID")]
        thread: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Maximum refinement loops after the initial retrieval pass
        #[arg(long, value_name = "COUNT")]
        loops: Option<u32>,
        /// Fused results kept per retrieval pass
        #[arg(long, value_name = "COUNT")]
        top_k: Option<usize>,
        /// Enable verbose output
        #[arg(long, short = 'v')]
        verbose: bool,
    },
    /// Start an interactive question-answering session
    Chat {
        /// Enable verbose output
        #[arg(long, short = 'v')]
        verbose: bool,
    },
    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Config subcommands
#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (keys are masked)
    Show,
    /// Configure the completion provider
    SetLlm {
        #[command(subcommand)]
        provider: LlmCommands,
    },
    /// Configure the embedding provider
    SetEmbedding {
        /// Embedding provider (openai, ollama)
        #[arg(value_name = "PROVIDER")]
        provider: String,
        /// Model name (e.g., text-embedding-3-large, nomic-embed-text)
        #[arg(long, value_name = "MODEL")]
        model: String,
        /// API endpoint URL (provider default if not set)
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
        /// Embedding dimensions (provider default if not set)
        #[arg(long, value_name = "DIMS")]
        dims: Option<usize>,
        /// Environment variable holding the API key
        #[arg(long, value_name = "ENV_VAR")]
        key_env: Option<String>,
    },
    /// Configure the ANN vector store
    SetAnn {
        /// Base URL of the vector-store REST API
        #[arg(long, value_name = "URL")]
        url: String,
        /// Service or anon key (GROUNDER_ANN_KEY overrides at runtime)
        #[arg(long, value_name = "KEY")]
        key: Option<String>,
        /// Name of the match RPC function
        #[arg(long, value_name = "NAME")]
        rpc_name: Option<String>,
        /// Path to a JSON projection matrix for query embeddings
        #[arg(long, value_name = "PATH")]
        projection: Option<String>,
    },
    /// Configure the optional lexical search endpoint
    SetLexical {
        /// Search endpoint URL
        #[arg(long, value_name = "URL")]
        endpoint: String,
        /// Optional bearer token
        #[arg(long, value_name = "KEY")]
        key: Option<String>,
    },
}

/// Completion provider subcommands for `config set-llm`
#[derive(Subcommand)]
enum LlmCommands {
    /// OpenAI API
    Openai {
        /// Model name (e.g., gpt-4o-mini)
        #[arg(long, value_name = "MODEL")]
        model: String,
        /// API key (prefer OPENAI_API_KEY env var)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },
    /// Anthropic API
    Anthropic {
        /// Model name (e.g., claude-3-5-sonnet-latest)
        #[arg(long, value_name = "MODEL")]
        model: String,
        /// API key (prefer ANTHROPIC_API_KEY env var)
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },
    /// Local Ollama instance
    Ollama {
        /// Ollama endpoint
        #[arg(long, value_name = "URL", default_value = "http://localhost:11434")]
        endpoint: String,
        /// Model name (e.g., qwen3)
        #[arg(long, value_name = "MODEL")]
        model: String,
    },
    /// Custom OpenAI-compatible endpoint
    Custom {
        /// API endpoint URL
        #[arg(long, value_name = "URL")]
        endpoint: String,
        /// Model name
        #[arg(long, value_name = "MODEL")]
        model: String,
        /// API key, if required
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    std::process::exit(run_command(cli.command).await);
}

async fn run_command(command: Commands) -> i32 {
    use grounder::exit_codes::*;

    match command {
        Commands::Ask {
            question,
            thread,
            json,
            loops,
            top_k,
            verbose,
        } => {
            init_logger(verbose);
            let args = commands::ask::AskArgs {
                question,
                thread,
                json,
                loops,
                top_k,
                verbose,
            };
            match commands::ask::execute(args).await {
                Ok(exit_code) => exit_code,
                Err(e) => {
                    eprintln!("Ask error: {}", e);
                    EXIT_ERROR
                }
            }
        }
        Commands::Chat { verbose } => {
            init_logger(verbose);
            match commands::chat::execute().await {
                Ok(exit_code) => exit_code,
                Err(e) => {
                    eprintln!("Chat error: {}", e);
                    EXIT_ERROR
                }
            }
        }
        Commands::Config { command } => run_config_command(command),
    }
}

fn run_config_command(command: ConfigCommands) -> i32 {
    use commands::config::{LlmProvider, SetAnnArgs, SetEmbeddingArgs, SetLexicalArgs};
    use grounder::exit_codes::*;

    let result = match command {
        ConfigCommands::Show => commands::config::execute_show(),
        ConfigCommands::SetLlm { provider } => {
            let provider = match provider {
                LlmCommands::Openai { model, api_key } => LlmProvider::OpenAi { model, api_key },
                LlmCommands::Anthropic { model, api_key } => {
                    LlmProvider::Anthropic { model, api_key }
                }
                LlmCommands::Ollama { endpoint, model } => {
                    LlmProvider::Ollama { endpoint, model }
                }
                LlmCommands::Custom {
                    endpoint,
                    model,
                    api_key,
                } => LlmProvider::Custom {
                    endpoint,
                    model,
                    api_key,
                },
            };
            commands::config::execute_set_llm(provider)
        }
        ConfigCommands::SetEmbedding {
            provider,
            model,
            endpoint,
            dims,
            key_env,
        } => commands::config::execute_set_embedding(SetEmbeddingArgs {
            provider,
            model,
            endpoint,
            dims,
            api_key_env: key_env,
        }),
        ConfigCommands::SetAnn {
            url,
            key,
            rpc_name,
            projection,
        } => commands::config::execute_set_ann(SetAnnArgs {
            url,
            key,
            rpc_name,
            projection,
        }),
        ConfigCommands::SetLexical { endpoint, key } => {
            commands::config::execute_set_lexical(SetLexicalArgs { endpoint, key })
        }
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Config error: {}", e);
            EXIT_CONFIG_ERROR
        }
    }
}
