//! Graph validation, run before persisting a workflow.
//!
//! Rules enforced:
//! 1. Action IDs must be unique within the workflow.
//! 2. Branch IDs must be unique and must not reuse an action ID.
//! 3. `start` must name an action whenever the workflow has any actions.
//! 4. Every branch endpoint and argument reference must name an action.
//!
//! Cycles are allowed; branches may loop back to earlier actions.

use std::collections::HashSet;

use crate::{EngineError, models::WorkflowGraph};

/// Validate the workflow graph's internal identifiers.
///
/// # Errors
/// - [`EngineError::DuplicateElementId`] if two elements share an ID.
/// - [`EngineError::MissingField`] if actions exist but `start` is absent.
/// - [`EngineError::UnknownStart`] if `start` names a missing action.
/// - [`EngineError::UnknownElementReference`] if a branch or argument
///   references a missing action.
pub fn validate_graph(graph: &WorkflowGraph) -> Result<(), EngineError> {
    // -----------------------------------------------------------------------
    // 1. Ensure action IDs are unique
    // -----------------------------------------------------------------------
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for action in &graph.actions {
        if !seen_ids.insert(action.id.as_str()) {
            return Err(EngineError::DuplicateElementId(action.id.clone()));
        }
    }

    let action_ids: HashSet<&str> = graph.actions.iter().map(|a| a.id.as_str()).collect();

    // -----------------------------------------------------------------------
    // 2. Branch IDs share the namespace
    // -----------------------------------------------------------------------
    for branch in &graph.branches {
        if !seen_ids.insert(branch.id.as_str()) {
            return Err(EngineError::DuplicateElementId(branch.id.clone()));
        }
    }

    // -----------------------------------------------------------------------
    // 3. Start
    // -----------------------------------------------------------------------
    // An empty graph may carry a placeholder start.
    if !graph.actions.is_empty() {
        match graph.start.as_deref() {
            None => return Err(EngineError::MissingField("start")),
            Some(start) if !action_ids.contains(start) => {
                return Err(EngineError::UnknownStart(start.to_owned()));
            }
            Some(_) => {}
        }
    }

    // -----------------------------------------------------------------------
    // 4. Cross-references
    // -----------------------------------------------------------------------
    for branch in &graph.branches {
        if !action_ids.contains(branch.source_id.as_str()) {
            return Err(EngineError::UnknownElementReference {
                element_id: branch.source_id.clone(),
                field: "source_id",
            });
        }
        if !action_ids.contains(branch.destination_id.as_str()) {
            return Err(EngineError::UnknownElementReference {
                element_id: branch.destination_id.clone(),
                field: "destination_id",
            });
        }
    }

    for argument in graph.actions.iter().flat_map(|a| &a.arguments) {
        if let Some(reference) = argument.reference.as_deref() {
            if !action_ids.contains(reference) {
                return Err(EngineError::UnknownElementReference {
                    element_id: reference.to_owned(),
                    field: "reference",
                });
            }
        }
    }

    Ok(())
}
