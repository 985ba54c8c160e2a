//! Issue records as served by the remote tracker, and their cached form.

use crate::transform::{RecordTransformer, TransformFailure, TransformOutput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Placeholder record id for nodes that carry none.
pub const UNKNOWN_RECORD_ID: &str = "<unknown>";

/// An issue node exactly as the remote returned it.
///
/// Kept untyped so that one malformed node fails on its own during the
/// transform instead of failing the whole page at decode time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawIssue(pub Value);

impl RawIssue {
    /// Returns the remote id, if present.
    pub fn record_id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// Returns the human-facing identifier, if present.
    pub fn identifier(&self) -> Option<&str> {
        self.0.get("identifier").and_then(Value::as_str)
    }
}

impl From<Value> for RawIssue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Issue priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// No priority set.
    None,
    /// Urgent.
    Urgent,
    /// High.
    High,
    /// Medium.
    Medium,
    /// Low.
    Low,
}

impl Priority {
    /// Converts the remote's numeric priority (0 = none, 1 = urgent .. 4 = low).
    pub fn from_remote(value: i64) -> Option<Self> {
        match value {
            0 => Some(Priority::None),
            1 => Some(Priority::Urgent),
            2 => Some(Priority::High),
            3 => Some(Priority::Medium),
            4 => Some(Priority::Low),
            _ => None,
        }
    }

    // Urgent first, unprioritized last.
    fn rank(self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
            Priority::None => 4,
        }
    }
}

/// A cached issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Remote id.
    pub id: String,
    /// Human-facing identifier, e.g. `ENG-42`.
    pub identifier: String,
    /// Title.
    pub title: String,
    /// Workflow state name.
    pub state: String,
    /// Priority.
    pub priority: Priority,
    /// Assignee display name.
    pub assignee: Option<String>,
    /// Label names.
    pub labels: Vec<String>,
    /// Last remote update.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueNode {
    id: Option<String>,
    identifier: Option<String>,
    title: Option<String>,
    priority: Option<i64>,
    updated_at: Option<String>,
    state: Option<NamedNode>,
    assignee: Option<NamedNode>,
    labels: Option<LabelConnection>,
}

#[derive(Debug, Deserialize)]
struct NamedNode {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LabelConnection {
    #[serde(default)]
    nodes: Vec<NamedNode>,
}

/// Transforms [`RawIssue`]s into [`Issue`]s, one failure entry per bad node.
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueTransformer;

impl IssueTransformer {
    /// Transforms a single node.
    pub fn transform_one(&self, raw: &RawIssue) -> Result<Issue, TransformFailure> {
        let fail = |error: String| {
            TransformFailure::new(
                raw.record_id().unwrap_or(UNKNOWN_RECORD_ID),
                raw.identifier().map(str::to_string),
                error,
            )
        };

        let node: IssueNode = serde_json::from_value(raw.0.clone())
            .map_err(|e| fail(format!("malformed issue: {e}")))?;

        let id = non_blank(node.id).ok_or_else(|| fail("missing id".into()))?;
        let identifier =
            non_blank(node.identifier).ok_or_else(|| fail("missing identifier".into()))?;
        let title = non_blank(node.title).ok_or_else(|| fail("missing title".into()))?;
        let state = non_blank(node.state.and_then(|s| s.name))
            .ok_or_else(|| fail("missing workflow state".into()))?;

        let priority = match node.priority {
            None => Priority::None,
            Some(value) => Priority::from_remote(value)
                .ok_or_else(|| fail(format!("invalid priority {value}")))?,
        };

        let updated_at = node
            .updated_at
            .ok_or_else(|| fail("missing updatedAt".into()))
            .and_then(|ts| {
                DateTime::parse_from_rfc3339(&ts)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| fail(format!("invalid updatedAt {ts:?}: {e}")))
            })?;

        let labels = node
            .labels
            .map(|conn| conn.nodes.into_iter().filter_map(|l| non_blank(l.name)).collect())
            .unwrap_or_default();

        Ok(Issue {
            id,
            identifier,
            title,
            state,
            priority,
            assignee: non_blank(node.assignee.and_then(|a| a.name)),
            labels,
            updated_at,
        })
    }
}

impl RecordTransformer for IssueTransformer {
    type Record = RawIssue;
    type Item = Issue;

    fn transform_all(&self, records: Vec<RawIssue>) -> TransformOutput<Issue> {
        let mut output = TransformOutput::default();
        for raw in &records {
            match self.transform_one(raw) {
                Ok(issue) => output.items.push(issue),
                Err(failure) => output.failures.push(failure),
            }
        }
        output
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Orders issues for display: by priority, then most recently updated,
/// then identifier.
pub fn sort_issues(mut issues: Vec<Issue>) -> Vec<Issue> {
    issues.sort_by(compare_issues);
    issues
}

fn compare_issues(a: &Issue, b: &Issue) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| b.updated_at.cmp(&a.updated_at))
        .then_with(|| a.identifier.cmp(&b.identifier))
}
