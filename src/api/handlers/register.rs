use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::handlers::{valid_email, valid_password};
use crate::engine::{normalize_email, CredentialEngine, NewRegistration, RegisterOutcome};

#[derive(ToSchema, Deserialize, Debug)]
pub struct RegisterRequest {
    email: String,
    username: String,
    first_name: String,
    last_name: String,
    #[schema(value_type = String)]
    password: SecretString,
    security_question_1: String,
    #[schema(value_type = String)]
    security_answer_1: SecretString,
    security_question_2: String,
    #[schema(value_type = String)]
    security_answer_2: SecretString,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    account_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error", body = String),
        (status = 409, description = "Email or username already registered", body = String)
    ),
    tag = "auth"
)]
#[instrument(skip(engine, payload))]
pub async fn register(
    engine: Extension<Arc<CredentialEngine>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }
    if !valid_password(request.password.expose_secret()) {
        return (StatusCode::BAD_REQUEST, "Password too short".to_string()).into_response();
    }
    if request.username.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing username".to_string()).into_response();
    }
    if request.security_question_1.trim().is_empty()
        || request.security_question_2.trim().is_empty()
        || request.security_answer_1.expose_secret().trim().is_empty()
        || request.security_answer_2.expose_secret().trim().is_empty()
    {
        return (
            StatusCode::BAD_REQUEST,
            "Both security questions need an answer".to_string(),
        )
            .into_response();
    }

    let registration = NewRegistration {
        email,
        username: request.username.trim().to_string(),
        first_name: request.first_name,
        last_name: request.last_name,
        password: request.password,
        security_question_1: request.security_question_1,
        security_answer_1: request.security_answer_1,
        security_question_2: request.security_question_2,
        security_answer_2: request.security_answer_2,
    };

    match engine.register(registration, Utc::now()).await {
        Ok(RegisterOutcome::Created { account_id }) => {
            (StatusCode::CREATED, Json(RegisterResponse { account_id })).into_response()
        }
        Ok(RegisterOutcome::EmailTaken) => (
            StatusCode::CONFLICT,
            "Email already registered".to_string(),
        )
            .into_response(),
        Ok(RegisterOutcome::UsernameTaken) => (
            StatusCode::CONFLICT,
            "Username already taken".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Registration failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response()
        }
    }
}
