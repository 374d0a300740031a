use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::auth::Actor;
use crate::database::entities::chart_versions;
use crate::server::app::AppState;
use crate::server::handlers::error_status;
use crate::services::{Comparison, DefinitionService};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VersionResponse {
    pub id: i32,
    pub definition_id: i32,
    pub version_number: i32,
    pub version_string: String,
    /// Full content snapshot at this version, not a delta
    #[schema(value_type = Object)]
    pub snapshot: Value,
    /// Diff against the approved head at append time
    #[schema(value_type = Option<Object>)]
    pub diff_summary: Option<Value>,
    /// Set only when this version was produced by a rollback
    pub rollback_source_version: Option<i32>,
    pub approved: bool,
    pub approved_by: Option<String>,
    pub approved_at: Option<String>,
    pub created_at: String,
    pub created_by: String,
}

impl From<chart_versions::Model> for VersionResponse {
    fn from(version: chart_versions::Model) -> Self {
        Self {
            id: version.id,
            definition_id: version.definition_id,
            version_number: version.version_number,
            version_string: version.version_string(),
            snapshot: serde_json::from_str(&version.snapshot).unwrap_or(Value::Null),
            diff_summary: version.diff_summary.clone(),
            rollback_source_version: version.rollback_source_version,
            approved: version.approved,
            approved_by: version.approved_by.clone(),
            approved_at: version.approved_at.map(|at| at.to_rfc3339()),
            created_at: version.created_at.to_rfc3339(),
            created_by: version.created_by,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RollbackRequest {
    /// Historical version whose content should be restored
    pub version_number: i32,
    /// Overrides the definition's default approval policy when set
    #[serde(default)]
    pub auto_approved: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CompareQuery {
    pub from: i32,
    pub to: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComparisonResponse {
    pub definition_id: i32,
    pub from_version: i32,
    pub to_version: i32,
    pub no_changes: bool,
    /// Per-field diff taking the from-version to the to-version
    #[schema(value_type = Object)]
    pub diff: Value,
}

impl From<Comparison> for ComparisonResponse {
    fn from(comparison: Comparison) -> Self {
        Self {
            definition_id: comparison.definition_id,
            from_version: comparison.from_version,
            to_version: comparison.to_version,
            no_changes: comparison.diff.is_empty(),
            diff: serde_json::to_value(&comparison.diff).unwrap_or(Value::Null),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/definitions/{id}/versions",
    params(
        ("id" = i32, Path, description = "Chart definition ID")
    ),
    responses(
        (status = 200, description = "Version ledger, ascending by version number", body = [VersionResponse]),
        (status = 404, description = "Definition not found")
    )
)]
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<VersionResponse>>, StatusCode> {
    let service = DefinitionService::new(state.db.clone());

    let versions = service.list_versions(id).await.map_err(error_status)?;

    Ok(Json(versions.into_iter().map(VersionResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/definitions/{id}/versions/{version}",
    params(
        ("id" = i32, Path, description = "Chart definition ID"),
        ("version" = i32, Path, description = "Version number")
    ),
    responses(
        (status = 200, description = "Version found", body = VersionResponse),
        (status = 404, description = "Version not found")
    )
)]
pub async fn get_version(
    State(state): State<AppState>,
    Path((id, version)): Path<(i32, i32)>,
) -> Result<Json<VersionResponse>, StatusCode> {
    let service = DefinitionService::new(state.db.clone());

    let version = service.get_version(id, version).await.map_err(error_status)?;

    Ok(Json(VersionResponse::from(version)))
}

#[utoipa::path(
    post,
    path = "/api/v1/definitions/{id}/versions/{version}/approve",
    params(
        ("id" = i32, Path, description = "Chart definition ID"),
        ("version" = i32, Path, description = "Version number")
    ),
    responses(
        (status = 200, description = "Version approved", body = VersionResponse),
        (status = 404, description = "Version not found"),
        (status = 409, description = "Version already approved")
    )
)]
pub async fn approve_version(
    State(state): State<AppState>,
    Path((id, version)): Path<(i32, i32)>,
    headers: HeaderMap,
) -> Result<Json<VersionResponse>, StatusCode> {
    let actor = Actor::from_headers(&headers);
    let service = DefinitionService::new(state.db.clone());

    let version = service
        .approve(&actor, id, version)
        .await
        .map_err(error_status)?;

    Ok(Json(VersionResponse::from(version)))
}

#[utoipa::path(
    post,
    path = "/api/v1/definitions/{id}/rollback",
    params(
        ("id" = i32, Path, description = "Chart definition ID")
    ),
    request_body = RollbackRequest,
    responses(
        (status = 201, description = "New version created from the historical snapshot", body = VersionResponse),
        (status = 404, description = "Definition or target version not found")
    )
)]
pub async fn rollback_definition(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    Json(payload): Json<RollbackRequest>,
) -> Result<(StatusCode, Json<VersionResponse>), StatusCode> {
    let actor = Actor::from_headers(&headers);
    let service = DefinitionService::new(state.db.clone());

    let version = service
        .rollback(&actor, id, payload.version_number, payload.auto_approved)
        .await
        .map_err(error_status)?;

    Ok((StatusCode::CREATED, Json(VersionResponse::from(version))))
}

#[utoipa::path(
    get,
    path = "/api/v1/definitions/{id}/compare",
    params(
        ("id" = i32, Path, description = "Chart definition ID"),
        CompareQuery
    ),
    responses(
        (status = 200, description = "Per-field comparison of two versions", body = ComparisonResponse),
        (status = 404, description = "Either version not found")
    )
)]
pub async fn compare_versions(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<ComparisonResponse>, StatusCode> {
    let service = DefinitionService::new(state.db.clone());

    let comparison = service
        .compare(id, query.from, query.to)
        .await
        .map_err(error_status)?;

    Ok(Json(ComparisonResponse::from(comparison)))
}
