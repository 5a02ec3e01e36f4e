//! Playbook and workflow operations.
//!
//! Every function runs on the caller's [`Session`] and leaves committing or
//! rolling back to the caller.  On error nothing here has been committed, so
//! rolling the session back restores the prior state exactly.

use std::collections::HashMap;

use db::models::{PlaybookRow, WorkflowRow};
use db::repository::{playbooks as pb_repo, workflows as wf_repo};
use db::Session;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::cascade::{self, CascadeReport};
use crate::graph::validate_graph;
use crate::models::{
    copy_name, NewPlaybook, NewWorkflow, Playbook, PlaybookListing, PlaybookSummary, Workflow,
    WorkflowGraph, WorkflowSummary, WorkflowUpdate,
};
use crate::regenerate::{regenerate_playbook, regenerate_workflow};
use crate::resolver::{self, Target};
use crate::{EngineError, ResourceKind};

// ---------------------------------------------------------------------------
// Row → model
// ---------------------------------------------------------------------------

pub(crate) fn workflow_from_row(row: WorkflowRow) -> Result<Workflow, EngineError> {
    let graph: WorkflowGraph = serde_json::from_value(row.definition)
        .map_err(|e| db::DbError::Corrupt(format!("workflow {}: {e}", row.id)))?;
    Ok(Workflow {
        id: row.id,
        playbook_id: row.playbook_id,
        name: row.name,
        graph,
    })
}

/// Load every workflow of a playbook row into a full [`Playbook`].
pub(crate) async fn hydrate_playbook(
    session: &mut Session,
    row: PlaybookRow,
) -> Result<Playbook, EngineError> {
    let workflows = list_workflows(session, row.id).await?;
    Ok(Playbook {
        id: row.id,
        name: row.name,
        workflows,
    })
}

fn graph_json(graph: &WorkflowGraph) -> Result<serde_json::Value, EngineError> {
    serde_json::to_value(graph).map_err(|e| EngineError::InvalidInput(e.to_string()))
}

fn not_found(kind: ResourceKind, id: Uuid) -> impl FnOnce(db::DbError) -> EngineError {
    move |err| match err {
        db::DbError::NotFound => EngineError::NotFound { kind, id },
        err => err.into(),
    }
}

// ---------------------------------------------------------------------------
// Playbooks
// ---------------------------------------------------------------------------

/// All playbooks ordered by name, case-insensitively.
///
/// Summaries carry only ids and names, with workflow summaries ordered the
/// same way; the full form carries complete workflows.
#[instrument(skip(session))]
pub async fn list_playbooks(session: &mut Session, full: bool) -> Result<PlaybookListing, EngineError> {
    let rows = pb_repo::list_playbooks(session.conn()).await?;

    if full {
        let mut playbooks = Vec::with_capacity(rows.len());
        for row in rows {
            playbooks.push(hydrate_playbook(session, row).await?);
        }
        return Ok(PlaybookListing::Full(playbooks));
    }

    // Names arrive already ordered; grouping keeps that order per playbook.
    let mut by_playbook: HashMap<Uuid, Vec<WorkflowSummary>> = HashMap::new();
    for wf in wf_repo::list_workflow_names(session.conn()).await? {
        by_playbook
            .entry(wf.playbook_id)
            .or_default()
            .push(WorkflowSummary { id: wf.id, name: wf.name });
    }

    let summaries = rows
        .into_iter()
        .map(|row| PlaybookSummary {
            workflows: by_playbook.remove(&row.id).unwrap_or_default(),
            id: row.id,
            name: row.name,
        })
        .collect();

    Ok(PlaybookListing::Summary(summaries))
}

/// Persist a new playbook and any workflows nested in it.
///
/// Every nested graph is validated before anything is written.
#[instrument(skip(session, new), fields(name = %new.name))]
pub async fn create_playbook(session: &mut Session, new: NewPlaybook) -> Result<Playbook, EngineError> {
    for wf in &new.workflows {
        validate_graph(&wf.graph)?;
    }

    let row = pb_repo::insert_playbook(session.conn(), Uuid::new_v4(), &new.name).await?;
    for wf in new.workflows {
        insert_workflow(session, row.id, wf).await?;
    }

    let playbook = hydrate_playbook(session, row).await?;
    info!(playbook_id = %playbook.id, "Playbook {} created", playbook.name);
    Ok(playbook)
}

/// Rename a playbook.  A missing or unchanged name is a no-op.
#[instrument(skip(session, playbook), fields(playbook_id = %playbook.id))]
pub async fn update_playbook(
    session: &mut Session,
    mut playbook: Playbook,
    name: Option<String>,
) -> Result<Playbook, EngineError> {
    if let Some(name) = name.filter(|n| *n != playbook.name) {
        pb_repo::rename_playbook(session.conn(), playbook.id, &name)
            .await
            .map_err(not_found(ResourceKind::Playbook, playbook.id))?;
        playbook.name = name;
    }

    info!("Playbook {} updated", playbook.id);
    Ok(playbook)
}

/// Delete a playbook and all of its workflows.
#[instrument(skip(session))]
pub async fn delete_playbook(session: &mut Session, playbook_id: Uuid) -> Result<(), EngineError> {
    let removed = pb_repo::delete_playbook(session.conn(), playbook_id)
        .await
        .map_err(not_found(ResourceKind::Playbook, playbook_id))?;

    info!(workflows_removed = removed, "Deleted playbook {}", playbook_id);
    Ok(())
}

/// Create a new playbook from `source` with regenerated identities.
///
/// The copy is named `requested_name` when non-empty, otherwise
/// `<source>_Copy`.  `source` is never modified.
#[instrument(skip(session, source), fields(source_id = %source.id))]
pub async fn copy_playbook(
    session: &mut Session,
    source: &Playbook,
    requested_name: Option<&str>,
) -> Result<Playbook, EngineError> {
    let copy = regenerate_playbook(source, requested_name)?;
    let created = create_playbook(session, copy).await?;

    info!("Copied playbook {} to {}", source.id, created.name);
    Ok(created)
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

/// Every workflow of a playbook ordered by name, case-insensitively.
pub async fn list_workflows(session: &mut Session, playbook_id: Uuid) -> Result<Vec<Workflow>, EngineError> {
    wf_repo::list_workflows(session.conn(), playbook_id)
        .await?
        .into_iter()
        .map(workflow_from_row)
        .collect()
}

async fn insert_workflow(
    session: &mut Session,
    playbook_id: Uuid,
    new: NewWorkflow,
) -> Result<Workflow, EngineError> {
    let definition = graph_json(&new.graph)?;
    let row = wf_repo::insert_workflow(session.conn(), Uuid::new_v4(), playbook_id, &new.name, &definition)
        .await?;
    workflow_from_row(row)
}

/// Add a workflow to an existing playbook.  `start` is mandatory here; an
/// explicit `null` counts as missing.
#[instrument(skip(session, new), fields(name = %new.name))]
pub async fn create_workflow(
    session: &mut Session,
    playbook_id: Uuid,
    new: NewWorkflow,
) -> Result<Workflow, EngineError> {
    if new.graph.start.is_none() {
        return Err(EngineError::MissingField("start"));
    }
    validate_graph(&new.graph)?;

    let workflow = insert_workflow(session, playbook_id, new).await?;
    info!("Workflow {}-{} created", playbook_id, workflow.name);
    Ok(workflow)
}

/// Replace a workflow's name and graph.  Its id and parent never change, and
/// a missing or empty name keeps the current one.
#[instrument(skip(session, workflow, update), fields(workflow_id = %workflow.id))]
pub async fn update_workflow(
    session: &mut Session,
    workflow: &Workflow,
    update: WorkflowUpdate,
) -> Result<Workflow, EngineError> {
    validate_graph(&update.graph)?;

    let updated = Workflow {
        id: workflow.id,
        playbook_id: workflow.playbook_id,
        name: update
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| workflow.name.clone()),
        graph: update.graph,
    };
    let definition = graph_json(&updated.graph)?;
    wf_repo::update_workflow(session.conn(), updated.playbook_id, updated.id, &updated.name, &definition)
        .await
        .map_err(not_found(ResourceKind::Workflow, updated.id))?;

    info!("Updated workflow {}", updated.id);
    Ok(updated)
}

/// Delete a workflow; its playbook goes too if this was the last one.
#[instrument(skip(session, workflow), fields(workflow_id = %workflow.id))]
pub async fn delete_workflow(session: &mut Session, workflow: &Workflow) -> Result<CascadeReport, EngineError> {
    let report = cascade::remove_workflow(session, workflow.playbook_id, workflow.id).await?;
    info!(playbook_removed = report.playbook_removed, "Deleted workflow {}", workflow.id);
    Ok(report)
}

/// Copy a workflow, with regenerated identities, into `target_playbook`
/// (the source's own playbook when `None`).
///
/// # Errors
/// [`EngineError::NotFound`] if the target playbook does not exist.
#[instrument(skip(session, source), fields(source_id = %source.id))]
pub async fn copy_workflow(
    session: &mut Session,
    source: &Workflow,
    target_playbook: Option<Uuid>,
    requested_name: Option<&str>,
) -> Result<Workflow, EngineError> {
    let copy = regenerate_workflow(source, copy_name(&source.name, requested_name))?;

    let target = Target::Playbook(target_playbook.unwrap_or(source.playbook_id));
    if !resolver::exists(session, target).await? {
        return Err(target.not_found());
    }

    validate_graph(&copy.graph)?;
    let created = insert_workflow(session, target.id(), copy).await?;
    info!("Workflow {} copied to {}", source.id, created.id);
    Ok(created)
}
