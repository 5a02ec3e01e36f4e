use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use engine::{catalog, NewPlaybook, Playbook, PlaybookListing};
use serde::Deserialize;

use super::{decode_body, decode_request, non_empty, SourceParams, COPY, CREATE, DELETE, READ, UPDATE};
use crate::error::ApiError;
use crate::gateway::{Access, Gateway};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub full: Option<String>,
}

impl ListParams {
    /// Any value other than empty, `false` or `0` asks for the full form.
    fn full(&self) -> bool {
        match self.full.as_deref() {
            None => false,
            Some(v) => !(v.is_empty() || v.eq_ignore_ascii_case("false") || v == "0"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlaybookUpdateRequest {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CopyPlaybookRequest {
    #[serde(default)]
    pub name: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Result<Json<PlaybookListing>, ApiError> {
    let Access { mut tx, .. } = Gateway::new(&state, "list playbooks")
        .authenticate(&headers)
        .await?
        .authorize(&READ)?
        .unscoped()
        .await?;

    let outcome = catalog::list_playbooks(tx.session(), params.full()).await;
    Ok(Json(tx.settle(outcome).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Query(params): Query<SourceParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Playbook>), ApiError> {
    if let Some(source) = params.source() {
        return copy_from(&state, &headers, source, &body).await;
    }

    let Access { mut tx, .. } = Gateway::new(&state, "create playbook")
        .authenticate(&headers)
        .await?
        .authorize(&CREATE)?
        .unscoped()
        .await?;

    let outcome = match decode_body::<NewPlaybook>(&body) {
        Ok(new) => catalog::create_playbook(tx.session(), new).await,
        Err(err) => Err(err),
    };
    let playbook = tx.settle(outcome).await?;
    Ok((StatusCode::CREATED, Json(playbook)))
}

pub async fn read(
    State(state): State<AppState>,
    Path(playbook_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Playbook>, ApiError> {
    let Access { entity, tx, .. } = Gateway::new(&state, "read playbook")
        .authenticate(&headers)
        .await?
        .authorize(&READ)?
        .playbook(&playbook_id)
        .await?;

    Ok(Json(tx.settle(Ok(entity)).await?))
}

/// The target id travels in the body, so it is decoded once the caller is
/// authorized and before resolution.
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Playbook>, ApiError> {
    let authorized = Gateway::new(&state, "update playbook")
        .authenticate(&headers)
        .await?
        .authorize(&UPDATE)?;
    let request: PlaybookUpdateRequest = decode_request("update playbook", &body)?;

    let Access { entity, mut tx, .. } = authorized.playbook(&request.id).await?;
    let outcome = catalog::update_playbook(tx.session(), entity, non_empty(request.name)).await;
    Ok(Json(tx.settle(outcome).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(playbook_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let Access { entity, mut tx, .. } = Gateway::new(&state, "delete playbook")
        .authenticate(&headers)
        .await?
        .authorize(&DELETE)?
        .playbook(&playbook_id)
        .await?;

    let outcome = catalog::delete_playbook(tx.session(), entity.id).await;
    tx.settle(outcome).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn copy(
    State(state): State<AppState>,
    Path(playbook_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Playbook>), ApiError> {
    copy_from(&state, &headers, &playbook_id, &body).await
}

async fn copy_from(
    state: &AppState,
    headers: &HeaderMap,
    raw_source: &str,
    body: &Bytes,
) -> Result<(StatusCode, Json<Playbook>), ApiError> {
    let Access { entity, mut tx, .. } = Gateway::new(state, "copy playbook")
        .authenticate(headers)
        .await?
        .authorize(&COPY)?
        .playbook(raw_source)
        .await?;

    let outcome = match decode_body::<CopyPlaybookRequest>(body) {
        Ok(request) => {
            let name = non_empty(request.name);
            catalog::copy_playbook(tx.session(), &entity, name.as_deref()).await
        }
        Err(err) => Err(err),
    };
    let copy = tx.settle(outcome).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}
