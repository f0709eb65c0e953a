use axum::{body::Bytes, extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::payment::{CreatePaymentRequest, CreatePaymentResponse},
    middleware::AuthUser,
    utils::validation::ValidatedJson,
    AppState,
};

pub async fn create_payment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<CreatePaymentRequest>,
) -> Result<Json<CreatePaymentResponse>, AppError> {
    tracing::info!(user_id = %claims.sub, "Create payment requested");
    let response = state.payment_service.create_payment(req).await?;
    Ok(Json(response))
}

/// Gateway callback. Takes the raw body so malformed payloads still reach the audit log.
pub async fn webhook(State(state): State<AppState>, body: Bytes) -> Result<String, AppError> {
    let outcome = state.webhook_service.handle(&body).await?;
    Ok(outcome.message())
}
