//! `engine` crate: playbook/workflow domain models and the consistency
//! rules that keep them intact: identifier validation, graph validation,
//! identity regeneration for copies, resource resolution, and the cascade
//! that removes a playbook together with its last workflow.

pub mod models;
pub mod error;
pub mod ids;
pub mod graph;
pub mod regenerate;
pub mod resolver;
pub mod cascade;
pub mod catalog;

pub use models::{
    Action, Argument, Branch, NewPlaybook, NewWorkflow, Playbook, PlaybookListing,
    PlaybookSummary, Workflow, WorkflowGraph, WorkflowSummary, WorkflowUpdate,
};
pub use error::EngineError;
pub use graph::validate_graph;
pub use ids::{is_valid_uid, parse_uid};
pub use regenerate::regenerate_graph;
pub use resolver::{ResourceKind, Resolved, Target};
pub use cascade::CascadeReport;
