//! Runtime settings resolved from flags and environment.

use crate::error::SeqError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Database file used when neither `--db` nor `KGSEQ_DB` is given
pub const DEFAULT_DB_PATH: &str = "kgseq.db";

/// Config keys describing the stored snapshot
pub const IMPORTED_AT_KEY: &str = "imported_at";
pub const SOURCE_KEY: &str = "source";
/// Records skipped at import, kept as a JSON array of issues
pub const SKIPPED_KEY: &str = "skipped_records";

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = SeqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(SeqError::InvalidFormat(s.to_string())),
        }
    }
}

/// Value parser for clap
pub fn parse_format(s: &str) -> Result<OutputFormat, SeqError> {
    s.parse()
}

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub format: OutputFormat,
}

impl Settings {
    pub fn new(db_path: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            db_path: db_path.into(),
            format,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(DEFAULT_DB_PATH, OutputFormat::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("text").unwrap(), OutputFormat::Text);
        assert_eq!(parse_format("JSON").unwrap(), OutputFormat::Json);
        assert!(matches!(
            parse_format("yaml"),
            Err(SeqError::InvalidFormat(s)) if s == "yaml"
        ));
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.db_path, PathBuf::from("kgseq.db"));
        assert_eq!(settings.format, OutputFormat::Text);
    }
}
