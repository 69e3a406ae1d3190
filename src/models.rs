use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque fields carried through unmodified (formulas, sources, narrative text).
pub type Payload = Map<String, Value>;

/// Record discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Node,
    Edge,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Node => "node",
            RecordKind::Edge => "edge",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for RecordKind {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "node" => Ok(RecordKind::Node),
            "edge" => Ok(RecordKind::Edge),
            _ => Err(format!("Invalid record kind: {s}")),
        }
    }
}

/// A discovery in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ids this discovery enables, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub successors: Vec<String>,
    #[serde(flatten)]
    pub payload: Payload,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            successors: Vec::new(),
            payload: Payload::new(),
        }
    }

    pub fn with_successors<I, S>(mut self, successors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.successors = successors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Title for display, falling back to the id
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// A dependency relationship between two discoveries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub payload: Payload,
}

impl EdgeRecord {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            payload: Payload::new(),
        }
    }
}

/// One input record, discriminated once at parse time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Node(NodeRecord),
    Edge(EdgeRecord),
}

impl Record {
    /// Resolve a raw JSON object into a node or an edge.
    ///
    /// Objects whose `type` is `"edge"` are edges; everything else is a node.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let kind = match &value {
            Value::Object(obj) => match obj.get("type").and_then(Value::as_str) {
                Some("edge") => RecordKind::Edge,
                _ => RecordKind::Node,
            },
            other => return Err(format!("expected a JSON object, found {}", json_type(other))),
        };
        Self::from_value_as(kind, value)
    }

    /// Deserialize `value` as a record of the given kind.
    pub fn from_value_as(kind: RecordKind, value: Value) -> Result<Self, String> {
        let record = match kind {
            RecordKind::Node => serde_json::from_value(value).map(Record::Node),
            RecordKind::Edge => serde_json::from_value(value).map(Record::Edge),
        }
        .map_err(|e| format!("invalid {kind} record: {e}"))?;

        if record.id().trim().is_empty() {
            return Err(format!("{kind} record has an empty id"));
        }
        Ok(record)
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Node(node) => &node.id,
            Record::Edge(edge) => &edge.id,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Node(_) => RecordKind::Node,
            Record::Edge(_) => RecordKind::Edge,
        }
    }
}

impl From<NodeRecord> for Record {
    fn from(node: NodeRecord) -> Self {
        Record::Node(node)
    }
}

impl From<EdgeRecord> for Record {
    fn from(edge: EdgeRecord) -> Self {
        Record::Edge(edge)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Field holding a reference to a node that does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceField {
    Successors,
    Source,
    Target,
}

impl ReferenceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceField::Successors => "successors",
            ReferenceField::Source => "source",
            ReferenceField::Target => "target",
        }
    }
}

/// A recoverable problem found while reading or building the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordIssue {
    /// `line` is 1-based; for array input it is the element position
    MalformedRecord { line: usize, reason: String },
    DanglingReference {
        record: String,
        field: ReferenceField,
        missing: String,
    },
    DuplicateId { id: String, record_kind: RecordKind },
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordIssue::MalformedRecord { line, reason } => {
                write!(f, "line {line}: malformed record skipped: {reason}")
            }
            RecordIssue::DanglingReference {
                record,
                field,
                missing,
            } => write!(
                f,
                "{record}: {} references unknown node '{missing}'",
                field.as_str()
            ),
            RecordIssue::DuplicateId { id, record_kind } => {
                write!(f, "{record_kind} '{id}' declared more than once, later copy ignored")
            }
        }
    }
}

/// One step of the rendering walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    EmitNode { id: String },
    EmitEdge { id: String },
}

impl Instruction {
    pub fn node(id: impl Into<String>) -> Self {
        Instruction::EmitNode { id: id.into() }
    }

    pub fn edge(id: impl Into<String>) -> Self {
        Instruction::EmitEdge { id: id.into() }
    }
}

/// Counts describing a built graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub adjacency_pairs: usize,
}

/// Metadata about the stored snapshot
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotInfo {
    pub records: usize,
    pub nodes: usize,
    pub edges: usize,
    pub imported_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
}
