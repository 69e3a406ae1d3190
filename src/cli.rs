use crate::config::{DEFAULT_DB_PATH, OutputFormat, Settings, parse_format};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kgseq")]
#[command(about = "Linearize a discovery knowledge graph into a rendering sequence")]
#[command(version)]
pub struct Cli {
    /// Snapshot database
    #[arg(long, global = true, env = "KGSEQ_DB", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Output format: text or json
    #[arg(long, global = true, env = "KGSEQ_FORMAT", default_value = "text", value_parser = parse_format)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings::new(self.db.clone(), self.format)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store the records of a JSONL file as the current snapshot
    Import {
        /// Newline-delimited JSON records
        file: PathBuf,
    },

    /// Print the linear order of all nodes
    Order {
        /// Read records from this file instead of the stored snapshot
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Print the node/edge emission sequence
    Sequence {
        /// Read records from this file instead of the stored snapshot
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Report record issues and cycles
    Check {
        /// Read records from this file instead of the stored snapshot
        #[arg(long)]
        input: Option<PathBuf>,
        /// Exit with an error when any issue or cycle is found
        #[arg(long)]
        strict: bool,
    },

    /// Show stored snapshot metadata
    Status,

    /// Start MCP server
    Mcp,
}
