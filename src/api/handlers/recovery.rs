//! The three password-reset endpoints.
//!
//! Each step hands the engine the ticket id from the previous one; the
//! engine decides whether the ticket still speaks for the account. A dead
//! or out-of-order ticket is always 410, so probing ids learns nothing.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::handlers::{valid_email, valid_password};
use crate::engine::{
    normalize_email, AnswersOutcome, CredentialEngine, IdentifyOutcome, ResetOutcome,
};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct IdentifyRequest {
    email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct IdentifyResponse {
    ticket_id: Uuid,
    question_1: String,
    question_2: String,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct AnswersRequest {
    ticket_id: Uuid,
    #[schema(value_type = String)]
    answer_1: SecretString,
    #[schema(value_type = String)]
    answer_2: SecretString,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AnswersResponse {
    ticket_id: Uuid,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct CompleteRequest {
    ticket_id: Uuid,
    #[schema(value_type = String)]
    new_password: SecretString,
}

#[utoipa::path(
    post,
    path = "/password-reset/identify",
    request_body = IdentifyRequest,
    responses(
        (status = 200, description = "Reset started, answer the questions", body = IdentifyResponse),
        (status = 404, description = "No account for that email", body = String),
        (status = 429, description = "Password changed too recently", body = String)
    ),
    tag = "recovery"
)]
#[instrument(skip(engine, payload))]
pub async fn identify(
    engine: Extension<Arc<CredentialEngine>>,
    payload: Option<Json<IdentifyRequest>>,
) -> impl IntoResponse {
    let request: IdentifyRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    match engine.identify(&email, Utc::now()).await {
        Ok(IdentifyOutcome::IdentityVerified {
            ticket_id,
            question_1,
            question_2,
        }) => (
            StatusCode::OK,
            Json(IdentifyResponse {
                ticket_id,
                question_1,
                question_2,
            }),
        )
            .into_response(),
        Ok(IdentifyOutcome::NotFound) => {
            (StatusCode::NOT_FOUND, "Unknown account".to_string()).into_response()
        }
        Ok(IdentifyOutcome::CooldownActive) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Password changed too recently".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Password reset identify failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Password reset failed".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/password-reset/answers",
    request_body = AnswersRequest,
    responses(
        (status = 200, description = "Answers accepted, set the new password", body = AnswersResponse),
        (status = 401, description = "Wrong answers", body = String),
        (status = 410, description = "Ticket expired or out of order", body = String)
    ),
    tag = "recovery"
)]
#[instrument(skip(engine, payload))]
pub async fn answers(
    engine: Extension<Arc<CredentialEngine>>,
    payload: Option<Json<AnswersRequest>>,
) -> impl IntoResponse {
    let request: AnswersRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match engine
        .verify_answers(
            request.ticket_id,
            &request.answer_1,
            &request.answer_2,
            Utc::now(),
        )
        .await
    {
        Ok(AnswersOutcome::QuestionsVerified { ticket_id }) => {
            (StatusCode::OK, Json(AnswersResponse { ticket_id })).into_response()
        }
        Ok(AnswersOutcome::WrongAnswers) => {
            (StatusCode::UNAUTHORIZED, "Wrong answers".to_string()).into_response()
        }
        Ok(AnswersOutcome::TicketExpired) => {
            (StatusCode::GONE, "Ticket expired".to_string()).into_response()
        }
        Err(err) => {
            error!("Password reset answers failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Password reset failed".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/password-reset/complete",
    request_body = CompleteRequest,
    responses(
        (status = 200, description = "Password replaced", body = String),
        (status = 409, description = "New password unchanged or previously used", body = String),
        (status = 410, description = "Ticket expired or out of order", body = String)
    ),
    tag = "recovery"
)]
#[instrument(skip(engine, payload))]
pub async fn complete(
    engine: Extension<Arc<CredentialEngine>>,
    payload: Option<Json<CompleteRequest>>,
) -> impl IntoResponse {
    let request: CompleteRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()),
    };

    if !valid_password(request.new_password.expose_secret()) {
        return (StatusCode::BAD_REQUEST, "Password too short".to_string());
    }

    match engine
        .complete_reset(request.ticket_id, &request.new_password, Utc::now())
        .await
    {
        Ok(ResetOutcome::Completed) => (StatusCode::OK, "Password updated".to_string()),
        Ok(ResetOutcome::PasswordUnchanged) => (
            StatusCode::CONFLICT,
            "New password must differ from the current one".to_string(),
        ),
        Ok(ResetOutcome::PasswordReused) => (
            StatusCode::CONFLICT,
            "Password was already used before".to_string(),
        ),
        Ok(ResetOutcome::TicketExpired) => (StatusCode::GONE, "Ticket expired".to_string()),
        Err(err) => {
            error!("Password reset completion failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Password reset failed".to_string(),
            )
        }
    }
}
