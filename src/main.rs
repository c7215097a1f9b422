//! # zk-chat CLI (`zkchat`)
//!
//! Index a Markdown vault into a local vector database and search it.
//!
//! ## Usage
//!
//! ```bash
//! zkchat --vault ~/notes <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `zkchat index [--full]` | Re-chunk notes changed since the last run (or all of them) |
//! | `zkchat query "<text>"` | Show the excerpts closest to a question |
//! | `zkchat read <path>` | Print one note |
//! | `zkchat list` | List every note with its title |
//! | `zkchat write <path> --content ..` | Create, overwrite or append to a note |
//! | `zkchat memory store\|retrieve\|reset` | Manage smart memory |
//! | `zkchat tool list\|call` | Inspect or invoke the assistant's tools |
//! | `zkchat status` | Collection sizes and the index watermark |
//!
//! The vault's settings live in `<vault>/.zk_chat.toml`, written with
//! defaults on first use.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use zk_chat::config::Config;
use zk_chat::smart_memory::DEFAULT_MEMORY_RESULTS;
use zk_chat::vault::Vault;
use zk_chat::{commands, logging};

#[derive(Parser)]
#[command(
    name = "zkchat",
    about = "Chunk, index and search a Markdown Zettelkasten",
    version
)]
struct Cli {
    /// Root directory of the vault.
    #[arg(long, global = true, default_value = ".")]
    vault: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the vault into the excerpts collection.
    ///
    /// Incremental when a previous run recorded a watermark; otherwise (or
    /// with `--full`) the collection is cleared and every note re-chunked.
    Index {
        /// Discard the existing index and rebuild from scratch.
        #[arg(long)]
        full: bool,
    },

    /// Find excerpts related to a question.
    Query {
        text: String,

        /// Maximum number of excerpts (default: `[retrieval].n_results`).
        #[arg(long)]
        limit: Option<usize>,

        /// Drop excerpts farther than this cosine distance.
        #[arg(long)]
        max_distance: Option<f32>,
    },

    /// Print a note.
    Read {
        /// Path relative to the vault root.
        path: String,
    },

    /// List every note and its title.
    List,

    /// Write a note.
    Write {
        /// Path relative to the vault root.
        path: String,

        /// Markdown body.
        #[arg(long)]
        content: String,

        /// Append to the note if it exists instead of replacing it.
        #[arg(long)]
        append: bool,

        /// Front-matter fields as `key=value` pairs.
        #[arg(long = "meta", value_parser = parse_key_val)]
        meta: Vec<(String, String)>,
    },

    /// Remember or recall free-form information.
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Inspect or call the assistant's tools.
    Tool {
        #[command(subcommand)]
        action: ToolAction,
    },

    /// Show collection sizes and the index watermark.
    Status,
}

#[derive(Subcommand)]
enum MemoryAction {
    Store {
        information: String,
    },
    Retrieve {
        query: String,
        #[arg(long, default_value_t = DEFAULT_MEMORY_RESULTS)]
        limit: usize,
    },
    Reset,
}

#[derive(Subcommand)]
enum ToolAction {
    /// List available tools.
    List {
        /// Include tools that modify the vault.
        #[arg(long = "unsafe")]
        allow_writes: bool,
    },
    /// Call a tool with `key=value` parameters (values may be JSON).
    Call {
        name: String,
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
        /// Allow tools that modify the vault.
        #[arg(long = "unsafe")]
        allow_writes: bool,
    },
}

/// Parse a `key=value` string into a `(key, value)` tuple.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't need an opened vault
    if let Commands::Tool {
        action: ToolAction::List { allow_writes },
    } = &cli.command
    {
        return commands::run_tool_list(*allow_writes);
    }

    let level = Config::load(&cli.vault)
        .ok()
        .flatten()
        .map(|c| c.logging.level)
        .unwrap_or_else(|| "warn".to_string());
    logging::init(&level)?;

    let mut vault = Vault::open(&cli.vault).await?;

    match cli.command {
        Commands::Index { full } => commands::run_index(&mut vault, full).await?,
        Commands::Query {
            text,
            limit,
            max_distance,
        } => commands::run_query(&vault, &text, limit, max_distance).await?,
        Commands::Read { path } => commands::run_read(&vault, &path)?,
        Commands::List => commands::run_list(&vault)?,
        Commands::Write {
            path,
            content,
            append,
            meta,
        } => commands::run_write(&vault, &path, &content, append, meta)?,
        Commands::Memory { action } => match action {
            MemoryAction::Store { information } => {
                commands::run_memory_store(&vault, &information).await?
            }
            MemoryAction::Retrieve { query, limit } => {
                commands::run_memory_retrieve(&vault, &query, limit).await?
            }
            MemoryAction::Reset => commands::run_memory_reset(&vault).await?,
        },
        Commands::Tool { action } => match action {
            ToolAction::Call {
                name,
                params,
                allow_writes,
            } => commands::run_tool_call(&vault, &name, params, allow_writes).await?,
            ToolAction::List { .. } => {
                // Handled above (before opening the vault)
                unreachable!()
            }
        },
        Commands::Status => commands::run_status(&vault).await?,
    }

    Ok(())
}
