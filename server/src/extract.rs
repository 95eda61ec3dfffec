use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// `Json` cuyos rechazos salen como `ApiError` (cuerpo `{"detail": ..}`).
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Igual para los parámetros de query.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
