use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use engine::{catalog, parse_uid, EngineError, NewWorkflow, ResourceKind, Workflow, WorkflowUpdate};
use serde::Deserialize;

use super::{decode_body, decode_request, non_empty, SourceParams, COPY, CREATE, DELETE, READ, UPDATE};
use crate::error::ApiError;
use crate::gateway::{Access, Gateway};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WorkflowUpdateRequest {
    pub id: String,
    #[serde(flatten)]
    pub update: WorkflowUpdate,
}

#[derive(Debug, Default, Deserialize)]
pub struct CopyWorkflowRequest {
    /// Destination playbook; the source's own playbook when absent or empty.
    #[serde(default)]
    pub playbook_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl CopyWorkflowRequest {
    fn target_playbook(&self) -> Result<Option<uuid::Uuid>, EngineError> {
        match self.playbook_id.as_deref().filter(|id| !id.is_empty()) {
            None => Ok(None),
            Some(raw) => parse_uid(raw).map(Some).ok_or_else(|| EngineError::InvalidIdentifier {
                kind: ResourceKind::Playbook,
                raw: raw.to_string(),
            }),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(playbook_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Workflow>>, ApiError> {
    let Access { entity, tx, .. } = Gateway::new(&state, "list workflows")
        .authenticate(&headers)
        .await?
        .authorize(&READ)?
        .playbook(&playbook_id)
        .await?;

    Ok(Json(tx.settle(Ok(entity.workflows)).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Path(playbook_id): Path<String>,
    Query(params): Query<SourceParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Workflow>), ApiError> {
    if let Some(source) = params.source() {
        return copy_from(&state, &headers, &playbook_id, source, &body).await;
    }

    let Access { entity, mut tx, .. } = Gateway::new(&state, "create workflow")
        .authenticate(&headers)
        .await?
        .authorize(&CREATE)?
        .playbook(&playbook_id)
        .await?;

    let outcome = match decode_body::<NewWorkflow>(&body) {
        Ok(new) => catalog::create_workflow(tx.session(), entity.id, new).await,
        Err(err) => Err(err),
    };
    let workflow = tx.settle(outcome).await?;
    Ok((StatusCode::CREATED, Json(workflow)))
}

pub async fn read(
    State(state): State<AppState>,
    Path((playbook_id, workflow_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Workflow>, ApiError> {
    let Access { entity, tx, .. } = Gateway::new(&state, "read workflow")
        .authenticate(&headers)
        .await?
        .authorize(&READ)?
        .workflow(&playbook_id, &workflow_id)
        .await?;

    Ok(Json(tx.settle(Ok(entity)).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(playbook_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Workflow>, ApiError> {
    let authorized = Gateway::new(&state, "update workflow")
        .authenticate(&headers)
        .await?
        .authorize(&UPDATE)?;
    let request: WorkflowUpdateRequest = decode_request("update workflow", &body)?;

    let Access { entity, mut tx, .. } = authorized.workflow(&playbook_id, &request.id).await?;
    let outcome = catalog::update_workflow(tx.session(), &entity, request.update).await;
    Ok(Json(tx.settle(outcome).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((playbook_id, workflow_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let Access { entity, mut tx, .. } = Gateway::new(&state, "delete workflow")
        .authenticate(&headers)
        .await?
        .authorize(&DELETE)?
        .workflow(&playbook_id, &workflow_id)
        .await?;

    let outcome = catalog::delete_workflow(tx.session(), &entity).await;
    tx.settle(outcome).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn copy(
    State(state): State<AppState>,
    Path((playbook_id, workflow_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Workflow>), ApiError> {
    copy_from(&state, &headers, &playbook_id, &workflow_id, &body).await
}

async fn copy_from(
    state: &AppState,
    headers: &HeaderMap,
    raw_playbook_id: &str,
    raw_workflow_id: &str,
    body: &Bytes,
) -> Result<(StatusCode, Json<Workflow>), ApiError> {
    let Access { entity, mut tx, .. } = Gateway::new(state, "copy workflow")
        .authenticate(headers)
        .await?
        .authorize(&COPY)?
        .workflow(raw_playbook_id, raw_workflow_id)
        .await?;

    let request = decode_body::<CopyWorkflowRequest>(body);
    let outcome = match request.and_then(|r| Ok((r.target_playbook()?, non_empty(r.name)))) {
        Ok((target, name)) => catalog::copy_workflow(tx.session(), &entity, target, name.as_deref()).await,
        Err(err) => Err(err),
    };
    let copy = tx.settle(outcome).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}
