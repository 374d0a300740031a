use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::database::entities::datasets;
use crate::server::app::AppState;
use crate::server::handlers::error_status;
use crate::services::DatasetService;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatasetResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub source: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<datasets::Model> for DatasetResponse {
    fn from(dataset: datasets::Model) -> Self {
        Self {
            id: dataset.id,
            name: dataset.name,
            description: dataset.description,
            source: dataset.source,
            is_active: dataset.is_active,
            created_at: dataset.created_at.to_rfc3339(),
            updated_at: dataset.updated_at.to_rfc3339(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/datasets",
    responses(
        (status = 200, description = "List catalogued datasets", body = [DatasetResponse])
    )
)]
pub async fn list_datasets(
    State(state): State<AppState>,
) -> Result<Json<Vec<DatasetResponse>>, StatusCode> {
    let service = DatasetService::new(state.db.clone());

    let datasets = service.list_datasets().await.map_err(error_status)?;

    Ok(Json(datasets.into_iter().map(DatasetResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/datasets/{id}",
    params(
        ("id" = i32, Path, description = "Dataset ID")
    ),
    responses(
        (status = 200, description = "Dataset found", body = DatasetResponse),
        (status = 404, description = "Dataset not found")
    )
)]
pub async fn get_dataset(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DatasetResponse>, StatusCode> {
    let service = DatasetService::new(state.db.clone());

    let dataset = service.get_dataset(id).await.map_err(error_status)?;

    Ok(Json(DatasetResponse::from(dataset)))
}
