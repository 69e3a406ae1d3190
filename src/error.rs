use thiserror::Error;

/// Operational errors raised by the shell around the linearizer.
///
/// Data problems (malformed lines, dangling references, cycles) are never
/// errors; they are collected as issues on the plan instead.
#[derive(Error, Debug)]
pub enum SeqError {
    #[error("No snapshot stored. Run `kgseq import <file>` or pass --input.")]
    NotInitialized,

    #[error("Invalid output format: {0} (expected `text` or `json`)")]
    InvalidFormat(String),

    #[error("Check failed: {issues} record issue(s){cycle}", cycle = cycle_suffix(*has_cycle))]
    StrictCheckFailed { issues: usize, has_cycle: bool },

    #[error("Stored record at position {position} is corrupt: {reason}")]
    CorruptSnapshot { position: i64, reason: String },

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MCP error: {0}")]
    Mcp(String),
}

fn cycle_suffix(has_cycle: bool) -> &'static str {
    if has_cycle {
        ", graph contains a cycle"
    } else {
        ""
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SeqError>;
