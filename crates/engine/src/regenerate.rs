//! Identity regeneration for copies.
//!
//! A copied workflow must not share any internal identifier with its source,
//! yet every cross-reference inside it (`start`, branch endpoints, argument
//! references) must keep pointing at the same element.  [`regenerate_graph`]
//! builds one old→new mapping over the declared ids and rewrites every
//! reference through it, so the result is isomorphic to the input.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{
    EngineError,
    models::{copy_name, NewPlaybook, NewWorkflow, Playbook, Workflow, WorkflowGraph},
};

/// Old id → fresh id for one workflow graph.
struct IdMapping<'a> {
    fresh: HashMap<&'a str, String>,
}

impl<'a> IdMapping<'a> {
    /// Assign a fresh id to every action id, branch id and `start`.
    ///
    /// Fresh ids never equal any original id, and distinct originals never
    /// share a fresh id.
    fn build(graph: &'a WorkflowGraph) -> Self {
        let declared: Vec<&'a str> = graph
            .actions
            .iter()
            .map(|a| a.id.as_str())
            .chain(graph.branches.iter().map(|b| b.id.as_str()))
            .chain(graph.start.as_deref())
            .collect();

        let mut taken: HashSet<String> = declared.iter().map(|id| (*id).to_owned()).collect();
        let mut fresh = HashMap::with_capacity(declared.len());

        for old in declared {
            if fresh.contains_key(old) {
                continue;
            }
            let new_id = loop {
                let candidate = Uuid::new_v4().to_string();
                if taken.insert(candidate.clone()) {
                    break candidate;
                }
            };
            fresh.insert(old, new_id);
        }

        Self { fresh }
    }

    fn get(&self, old: &str, field: &'static str) -> Result<String, EngineError> {
        self.fresh
            .get(old)
            .cloned()
            .ok_or_else(|| EngineError::UnknownElementReference {
                element_id: old.to_owned(),
                field,
            })
    }
}

/// Return a copy of `graph` with every internal identifier replaced.
///
/// # Errors
/// [`EngineError::UnknownElementReference`] if a branch endpoint or argument
/// reference names an id the graph does not declare; the copy would
/// otherwise carry a dangling reference.
pub fn regenerate_graph(graph: &WorkflowGraph) -> Result<WorkflowGraph, EngineError> {
    let mapping = IdMapping::build(graph);
    let mut copy = graph.clone();

    if let Some(start) = copy.start.as_mut() {
        *start = mapping.get(start, "start")?;
    }

    for action in &mut copy.actions {
        action.id = mapping.get(&action.id, "id")?;
        for argument in &mut action.arguments {
            if let Some(reference) = argument.reference.as_mut() {
                *reference = mapping.get(reference, "reference")?;
            }
        }
    }

    for branch in &mut copy.branches {
        branch.id = mapping.get(&branch.id, "id")?;
        branch.source_id = mapping.get(&branch.source_id, "source_id")?;
        branch.destination_id = mapping.get(&branch.destination_id, "destination_id")?;
    }

    Ok(copy)
}

/// Unsaved copy of `workflow` named `name`, with its own id dropped and its
/// graph regenerated.
pub fn regenerate_workflow(workflow: &Workflow, name: String) -> Result<NewWorkflow, EngineError> {
    Ok(NewWorkflow {
        name,
        graph: regenerate_graph(&workflow.graph)?,
    })
}

/// Unsaved copy of `playbook`.  Uses `requested_name` when non-empty,
/// otherwise `<source>_Copy`; contained workflows keep their names.
pub fn regenerate_playbook(
    playbook: &Playbook,
    requested_name: Option<&str>,
) -> Result<NewPlaybook, EngineError> {
    let workflows = playbook
        .workflows
        .iter()
        .map(|wf| regenerate_workflow(wf, wf.name.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NewPlaybook {
        name: copy_name(&playbook.name, requested_name),
        workflows,
    })
}
