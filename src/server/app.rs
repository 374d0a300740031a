use anyhow::Result;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{datasets, definitions, health, versions};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        definitions::list_definitions,
        definitions::create_or_update_definition,
        definitions::get_definition,
        definitions::archive_definition,
        versions::list_versions,
        versions::get_version,
        versions::approve_version,
        versions::rollback_definition,
        versions::compare_versions,
        datasets::list_datasets,
        datasets::get_dataset,
    ),
    components(schemas(
        definitions::UpsertDefinitionRequest,
        definitions::DefinitionResponse,
        versions::VersionResponse,
        versions::RollbackRequest,
        versions::ComparisonResponse,
        datasets::DatasetResponse,
    ))
)]
struct ApiDoc;

pub async fn create_app(db: DatabaseConnection, cors_origin: Option<&str>) -> Result<Router> {
    let state = AppState { db };

    let cors = match cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        // Health check endpoint
        .route("/health", get(health::health_check))
        // API v1 routes
        .nest("/api/v1", api_v1_routes())
        // Swagger UI
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Dataset catalog routes (read-only)
        .route("/datasets", get(datasets::list_datasets))
        .route("/datasets/:id", get(datasets::get_dataset))
        // Chart definition routes
        .route("/definitions", get(definitions::list_definitions))
        .route("/definitions", post(definitions::create_or_update_definition))
        .route("/definitions/:id", get(definitions::get_definition))
        .route("/definitions/:id/archive", post(definitions::archive_definition))
        // Version ledger routes
        .route("/definitions/:id/versions", get(versions::list_versions))
        .route("/definitions/:id/versions/:version", get(versions::get_version))
        .route(
            "/definitions/:id/versions/:version/approve",
            post(versions::approve_version),
        )
        .route("/definitions/:id/rollback", post(versions::rollback_definition))
        .route("/definitions/:id/compare", get(versions::compare_versions))
}
