use crate::{
    domain::CredentialView,
    password::{PasswordError, PasswordService},
};
use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Deserialize)]
pub struct PasswordRequest {
    login: Uuid,
    password: String,
    #[serde(default)]
    one_time: bool,
    /// Defaults to now plus the configured lifetime.
    valid_until: Option<DateTime<Utc>>,
}

#[derive(ToSchema, Deserialize)]
pub struct CheckRequest {
    login: Uuid,
    password: String,
}

#[utoipa::path(
    put,
    path= "/api/v1/password",
    request_body = PasswordRequest,
    responses (
        (status = 201, description = "Password added", body = CredentialView, content_type = "application/json"),
        (status = 400, description = "Missing or invalid payload"),
        (status = 409, description = "The login already has this password"),
    ),
    tag= "password"
)]
// axum handler for adding a password
#[instrument(skip(service, payload))]
pub async fn add(
    service: Extension<Arc<PasswordService>>,
    payload: Option<Json<PasswordRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    if request.login.is_nil() {
        return (StatusCode::BAD_REQUEST, "Invalid login".to_string()).into_response();
    }

    if request.password.is_empty() {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    match service
        .add(
            request.login,
            &request.password,
            request.one_time,
            request.valid_until,
        )
        .await
    {
        Ok(credential) => {
            debug!(id = %credential.id, login = %request.login, "password created");
            (StatusCode::CREATED, Json(CredentialView::from(&credential))).into_response()
        }
        Err(PasswordError::AlreadyExists) => {
            debug!(login = %request.login, "password already exists");
            (StatusCode::CONFLICT, "Password already exists".to_string()).into_response()
        }
        Err(e) => {
            error!("Error adding password: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error adding password".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path= "/api/v1/password/check",
    request_body = CheckRequest,
    responses (
        (status = 200, description = "Password is valid"),
        (status = 400, description = "Missing or invalid payload"),
        (status = 403, description = "Password is invalid, expired or unknown"),
    ),
    tag= "password"
)]
// axum handler for checking a password
#[instrument(skip(service, payload))]
pub async fn check(
    service: Extension<Arc<PasswordService>>,
    payload: Option<Json<CheckRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string());
    };

    if request.login.is_nil() {
        return (StatusCode::BAD_REQUEST, "Invalid login".to_string());
    }

    if request.password.is_empty() {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string());
    }

    match service.check(request.login, &request.password).await {
        Ok(true) => (StatusCode::OK, "Password is valid".to_string()),
        Ok(false) => (StatusCode::FORBIDDEN, "Password is invalid".to_string()),
        Err(e) => {
            error!("Error checking password: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error checking password".to_string(),
            )
        }
    }
}

#[utoipa::path(
    delete,
    path= "/api/v1/password/{id}",
    params(("id" = Uuid, Path, description = "Password id")),
    responses (
        (status = 202, description = "Password scheduled for disablement"),
        (status = 400, description = "Invalid id"),
    ),
    tag= "password"
)]
// axum handler for revoking a password
#[instrument(skip(service))]
pub async fn revoke(service: Extension<Arc<PasswordService>>, Path(id): Path<Uuid>) -> StatusCode {
    service.revoke(id);
    StatusCode::ACCEPTED
}
