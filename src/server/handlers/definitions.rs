use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::auth::Actor;
use crate::database::entities::chart_definitions;
use crate::server::app::AppState;
use crate::server::handlers::error_status;
use crate::services::{DefinitionService, DefinitionUpsertRequest};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpsertDefinitionRequest {
    /// 0 or absent creates a new definition
    #[serde(default)]
    pub definition_id: Option<i32>,
    pub dataset_id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub filter: Value,
    #[schema(value_type = Object)]
    pub visual: Value,
    #[schema(value_type = Object)]
    pub calculation: Value,
    /// When true the new version becomes the head immediately; otherwise it
    /// is held pending review
    #[serde(default)]
    pub auto_approved: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DefinitionResponse {
    pub id: i32,
    pub dataset_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    #[schema(value_type = Object)]
    pub filter: Value,
    #[schema(value_type = Object)]
    pub visual: Value,
    #[schema(value_type = Object)]
    pub calculation: Value,
    /// Highest approved version number; null until a first approval
    pub current_version: Option<i32>,
    pub auto_approve: bool,
    pub is_archived: bool,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: String,
    pub updated_by: String,
}

impl From<chart_definitions::Model> for DefinitionResponse {
    fn from(definition: chart_definitions::Model) -> Self {
        Self {
            id: definition.id,
            dataset_id: definition.dataset_id,
            name: definition.name.clone(),
            description: definition.description.clone(),
            tags: definition.tag_list(),
            filter: parse_content(&definition.filter_content),
            visual: parse_content(&definition.visual_content),
            calculation: parse_content(&definition.calculation_content),
            current_version: definition.current_version,
            auto_approve: definition.auto_approve,
            is_archived: definition.is_archived,
            created_at: definition.created_at.to_rfc3339(),
            created_by: definition.created_by.clone(),
            updated_at: definition.updated_at.to_rfc3339(),
            updated_by: definition.updated_by,
        }
    }
}

fn parse_content(content: &str) -> Value {
    serde_json::from_str(content).unwrap_or(Value::Null)
}

#[utoipa::path(
    get,
    path = "/api/v1/definitions",
    responses(
        (status = 200, description = "List chart definitions", body = [DefinitionResponse])
    )
)]
pub async fn list_definitions(
    State(state): State<AppState>,
) -> Result<Json<Vec<DefinitionResponse>>, StatusCode> {
    let service = DefinitionService::new(state.db.clone());

    let definitions = service.list_definitions().await.map_err(error_status)?;

    Ok(Json(
        definitions.into_iter().map(DefinitionResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/definitions",
    request_body = UpsertDefinitionRequest,
    responses(
        (status = 200, description = "Definition created or new version appended", body = DefinitionResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Definition or dataset not found")
    )
)]
pub async fn create_or_update_definition(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpsertDefinitionRequest>,
) -> Result<Json<DefinitionResponse>, StatusCode> {
    let actor = Actor::from_headers(&headers);
    let service = DefinitionService::new(state.db.clone());

    let request = DefinitionUpsertRequest {
        definition_id: payload.definition_id,
        dataset_id: payload.dataset_id,
        name: payload.name,
        description: payload.description,
        tags: payload.tags,
        filter: payload.filter,
        visual: payload.visual,
        calculation: payload.calculation,
        auto_approve: payload.auto_approved,
    };

    let (definition, _version) = service
        .create_or_update(&actor, request)
        .await
        .map_err(error_status)?;

    Ok(Json(DefinitionResponse::from(definition)))
}

#[utoipa::path(
    get,
    path = "/api/v1/definitions/{id}",
    params(
        ("id" = i32, Path, description = "Chart definition ID")
    ),
    responses(
        (status = 200, description = "Definition found", body = DefinitionResponse),
        (status = 404, description = "Definition not found")
    )
)]
pub async fn get_definition(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DefinitionResponse>, StatusCode> {
    let service = DefinitionService::new(state.db.clone());

    let definition = service.get_definition(id).await.map_err(error_status)?;

    Ok(Json(DefinitionResponse::from(definition)))
}

#[utoipa::path(
    post,
    path = "/api/v1/definitions/{id}/archive",
    params(
        ("id" = i32, Path, description = "Chart definition ID")
    ),
    responses(
        (status = 200, description = "Definition archived", body = DefinitionResponse),
        (status = 404, description = "Definition not found")
    )
)]
pub async fn archive_definition(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Json<DefinitionResponse>, StatusCode> {
    let actor = Actor::from_headers(&headers);
    let service = DefinitionService::new(state.db.clone());

    let definition = service.archive(&actor, id).await.map_err(error_status)?;

    Ok(Json(DefinitionResponse::from(definition)))
}
