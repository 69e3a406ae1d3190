use crate::config::{IMPORTED_AT_KEY, SKIPPED_KEY, SOURCE_KEY, Settings};
use crate::db::Database;
use crate::error::{Result, SeqError};
use crate::graph::{CyclePath, Graph, linearize};
use crate::models::{GraphStats, Instruction, Record, RecordIssue, RecordKind, SnapshotInfo};
use crate::records::{ParsedRecords, parse_records};
use crate::sequence::sequence;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Everything the renderer needs: the order, the walk, and the graph itself
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub has_cycle: bool,
    pub cycle: Option<CyclePath>,
    pub order: Vec<String>,
    pub unresolved: Vec<String>,
    pub instructions: Vec<Instruction>,
    pub issues: Vec<RecordIssue>,
    pub stats: GraphStats,
    #[serde(skip)]
    pub graph: Graph,
}

/// Build, linearize and sequence `records`.
///
/// `issues` carries problems found before graph construction (malformed
/// lines); the builder's own issues are appended after them.
pub fn plan_records(records: Vec<Record>, mut issues: Vec<RecordIssue>) -> Plan {
    let graph = Graph::build(records);
    let linearization = linearize(&graph);
    let instructions = sequence(&graph, &linearization.order);
    issues.extend_from_slice(graph.issues());

    info!(
        nodes = graph.len(),
        instructions = instructions.len(),
        issues = issues.len(),
        has_cycle = linearization.has_cycle,
        "planned traversal"
    );

    Plan {
        has_cycle: linearization.has_cycle,
        cycle: linearization.cycle,
        order: linearization.order,
        unresolved: linearization.unresolved,
        instructions,
        issues,
        stats: graph.stats(),
        graph,
    }
}

pub fn plan_parsed(parsed: ParsedRecords) -> Plan {
    plan_records(parsed.records, parsed.issues)
}

/// Plan directly from newline-delimited JSON text
pub fn plan_str(input: &str) -> Plan {
    plan_parsed(parse_records(input))
}

/// Plan from a newline-delimited JSON file
pub fn plan_file<P: AsRef<Path>>(path: P) -> Result<Plan> {
    let input = fs::read_to_string(path)?;
    Ok(plan_str(&input))
}

/// Outcome of importing records into the store
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub stored: usize,
    pub source: String,
    pub skipped: Vec<RecordIssue>,
}

/// Snapshot store plus pipeline over the stored records
pub struct Sequencer {
    db: Database,
}

impl Sequencer {
    /// Open (or create) the store named by `settings`
    pub fn open(settings: &Settings) -> Result<Self> {
        Self::open_at(&settings.db_path)
    }

    /// Open (or create) the store at a specific path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = Database::open(path)?;
        Ok(Sequencer { db })
    }

    /// Open a store that must already exist on disk
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Err(SeqError::NotInitialized);
        }
        Self::open_at(path)
    }

    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.db.is_initialized()? && self.db.get_config(IMPORTED_AT_KEY)?.is_some())
    }

    /// Parse `input` and store its valid records as the current snapshot
    pub fn import_str(&self, input: &str, source: &str) -> Result<ImportSummary> {
        self.db.init()?;

        let parsed = parse_records(input);
        let stored = self.db.replace_records(&parsed.records)?;
        self.db
            .set_config(IMPORTED_AT_KEY, &Utc::now().to_rfc3339())?;
        self.db.set_config(SOURCE_KEY, source)?;
        self.db
            .set_config(SKIPPED_KEY, &serde_json::to_string(&parsed.issues)?)?;

        info!(stored, skipped = parsed.issues.len(), %source, "imported snapshot");

        Ok(ImportSummary {
            stored,
            source: source.to_string(),
            skipped: parsed.issues,
        })
    }

    pub fn import_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportSummary> {
        let path = path.as_ref();
        let input = fs::read_to_string(path)?;
        self.import_str(&input, &path.display().to_string())
    }

    pub fn snapshot_info(&self) -> Result<SnapshotInfo> {
        self.check_initialized()?;

        let imported_at = self
            .db
            .get_config(IMPORTED_AT_KEY)?
            .and_then(|value| DateTime::parse_from_rfc3339(&value).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(SnapshotInfo {
            records: self.db.count_records(None)?,
            nodes: self.db.count_records(Some(RecordKind::Node))?,
            edges: self.db.count_records(Some(RecordKind::Edge))?,
            imported_at,
            source: self.db.get_config(SOURCE_KEY)?,
        })
    }

    /// Plan over the stored snapshot.
    ///
    /// Lines skipped at import are reported again as the plan's first issues.
    pub fn load_plan(&self) -> Result<Plan> {
        self.check_initialized()?;
        let records = self.db.load_records()?;
        Ok(plan_records(records, self.skipped_records()?))
    }

    fn skipped_records(&self) -> Result<Vec<RecordIssue>> {
        match self.db.get_config(SKIPPED_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn check_initialized(&self) -> Result<()> {
        if !self.is_initialized()? {
            return Err(SeqError::NotInitialized);
        }
        Ok(())
    }
}
