use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::handlers::valid_email;
use crate::engine::{normalize_email, CredentialEngine, LoginOutcome};

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginRequest {
    email: String,
    #[schema(value_type = String)]
    password: SecretString,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    account_id: Uuid,
    email: String,
    username: String,
    first_name: String,
    last_name: String,
    /// Highest-privilege role name, absent when none is assigned.
    role: Option<String>,
    last_login: Option<DateTime<Utc>>,
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = String),
        (status = 423, description = "Account temporarily locked", body = String)
    ),
    tag = "auth"
)]
#[instrument(skip(engine, payload))]
pub async fn login(
    engine: Extension<Arc<CredentialEngine>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    match engine.login(&email, &request.password, Utc::now()).await {
        Ok(LoginOutcome::Success { account, role }) => {
            let response = LoginResponse {
                account_id: account.account_id,
                email: account.email,
                username: account.username,
                first_name: account.first_name,
                last_name: account.last_name,
                role: role.map(|role| role.role_name),
                last_login: account.last_login,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        // Unknown accounts and wrong passwords read the same from outside.
        Ok(LoginOutcome::InvalidCredentials | LoginOutcome::NotFound) => (
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
        )
            .into_response(),
        Ok(LoginOutcome::AccountLocked { .. }) => (
            StatusCode::LOCKED,
            "Account locked, try again later".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Login failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string()).into_response()
        }
    }
}
