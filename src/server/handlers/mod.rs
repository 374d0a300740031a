pub mod datasets;
pub mod definitions;
pub mod health;
pub mod versions;

use axum::http::StatusCode;
use tracing::error;

use crate::errors::DefinitionError;

/// Map engine errors onto transport status codes. Everything unexpected is
/// logged here and reported as a bare 500.
pub(crate) fn error_status(err: DefinitionError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_conflict() {
        StatusCode::CONFLICT
    } else if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if err.is_integrity_error() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        error!("Request failed: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
