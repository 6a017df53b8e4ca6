use axum::response::IntoResponse;

use crate::api::APP_USER_AGENT;

/// Service banner for `/`; not part of the documented API.
pub async fn root() -> impl IntoResponse {
    APP_USER_AGENT
}
