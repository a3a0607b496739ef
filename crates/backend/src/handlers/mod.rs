use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::domain::errors::SettlementError;
use serde::Serialize;

pub mod a001_wallet;
pub mod a002_order;
pub mod a003_store_order;
pub mod a005_return_request;
pub mod a006_payout_bill;
pub mod a007_shipping_fee;
pub mod settlement;
pub mod sweeps;
pub mod sys_tasks;

/// Тело ошибки API: типизированная причина для ветвления на клиенте
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

/// Обёртка SettlementError для axum
pub struct ApiError(pub SettlementError);

impl From<SettlementError> for ApiError {
    fn from(e: SettlementError) -> Self {
        Self(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(SettlementError::Internal(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self.0 {
            SettlementError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            SettlementError::InvalidStateTransition(_) => (StatusCode::CONFLICT, "invalid_state"),
            SettlementError::NothingToPayout(_) => (StatusCode::CONFLICT, "nothing_to_payout"),
            SettlementError::InsufficientFunds { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_funds")
            }
            SettlementError::WalletLocked(_) => (StatusCode::LOCKED, "wallet_locked"),
            SettlementError::ReconciliationMismatch { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "reconciliation_mismatch")
            }
            SettlementError::Internal(e) => {
                // Внутренние детали в лог, наружу — общий ответ
                tracing::error!(error = ?e, "Internal server error");
                let body = ErrorResponse {
                    error: "internal_error".to_string(),
                    message: "An internal error occurred".to_string(),
                };
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.0.reason(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result-алиас обработчиков
pub type ApiResult<T> = Result<Json<T>, ApiError>;
