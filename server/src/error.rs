use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::ProjectionError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::state::RegistryError;

/// Errores que devuelven los handlers HTTP.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// La proyección falló sobre un job ya guardado: error interno.
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// Cuerpo JSON que axum no pudo extraer.
    #[error("cuerpo inválido: {}", .0.body_text())]
    Json(#[from] JsonRejection),

    #[error("parámetros de query inválidos: {}", .0.body_text())]
    Query(#[from] QueryRejection),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Registry(RegistryError::Conflict { .. }) => StatusCode::CONFLICT,
            ApiError::Registry(RegistryError::InvalidResult(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Registry(RegistryError::Poisoned) | ApiError::Projection(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Json(rejection) => rejection.status(),
            ApiError::Query(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
