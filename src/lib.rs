pub mod cli;
pub mod cli_handlers;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod graph;
pub mod mcp;
pub mod models;
pub mod records;
pub mod sequence;

pub use error::{Result, SeqError};
pub use graph::{Graph, Linearization, linearize};
pub use models::*;
pub use sequence::sequence;
