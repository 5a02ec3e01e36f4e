//! Core domain models for playbooks and workflows.
//!
//! These types are the source of truth for what a playbook looks like in
//! memory.  A workflow's graph ([`WorkflowGraph`]) is serialised to/from the
//! JSON `definition` column of the `workflows` table.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Workflow graph
// ---------------------------------------------------------------------------

/// Canvas position of an action; carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// An input to an action, either a literal value or the output of another
/// action in the same workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Id of the action whose result feeds this argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Path into the referenced action's result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<serde_json::Value>,
}

/// A single step in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Unique within the workflow; referenced by branches, arguments and `start`.
    pub id: String,
    pub name: String,
    pub app_name: String,
    pub action_name: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// Directed edge from one action to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: String,
    pub source_id: String,
    pub destination_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: i32,
}

/// The action/branch graph of a workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    /// Id of the first action to run.
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub branches: Vec<Branch>,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// A persisted workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub playbook_id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub graph: WorkflowGraph,
}

/// A workflow that has not been persisted yet; the repository assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkflow {
    pub name: String,
    #[serde(flatten)]
    pub graph: WorkflowGraph,
}

/// Replacement content for an existing workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub graph: WorkflowGraph,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: Uuid,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Playbook
// ---------------------------------------------------------------------------

/// A persisted playbook with every workflow it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playbook {
    pub id: Uuid,
    pub name: String,
    pub workflows: Vec<Workflow>,
}

/// A playbook that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlaybook {
    pub name: String,
    #[serde(default)]
    pub workflows: Vec<NewWorkflow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookSummary {
    pub id: Uuid,
    pub name: String,
    pub workflows: Vec<WorkflowSummary>,
}

/// Result of listing playbooks, in summary or full form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlaybookListing {
    Summary(Vec<PlaybookSummary>),
    Full(Vec<Playbook>),
}

impl PlaybookListing {
    pub fn len(&self) -> usize {
        match self {
            Self::Summary(items) => items.len(),
            Self::Full(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Name a copy gets when the caller supplies none (or an empty one).
pub fn copy_name(source: &str, requested: Option<&str>) -> String {
    match requested {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => format!("{source}_Copy"),
    }
}
