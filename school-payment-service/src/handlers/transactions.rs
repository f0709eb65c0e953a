use axum::{
    extract::{Path, Query, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::transactions::{TransactionPage, TransactionQuery, TransactionStatusResponse},
    services::transactions::ListParams,
    AppState,
};

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<TransactionPage>, AppError> {
    let params = ListParams::from_query(query)?;
    let page = state.transaction_service.list(&params).await?;
    Ok(Json(page))
}

/// Same listing as [`list_transactions`], scoped to the school in the path.
pub async fn list_school_transactions(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<TransactionPage>, AppError> {
    let params = ListParams::from_query(TransactionQuery {
        school_id: Some(school_id),
        ..query
    })?;
    let page = state.transaction_service.list(&params).await?;
    Ok(Json(page))
}

pub async fn get_transaction_status(
    State(state): State<AppState>,
    Path(custom_order_id): Path<String>,
) -> Result<Json<TransactionStatusResponse>, AppError> {
    let status = state.transaction_service.status(&custom_order_id).await?;
    Ok(Json(status))
}
