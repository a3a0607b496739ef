use axum::extract::Path;
use axum::Json;
use contracts::domain::a005_return_request::aggregate::{
    FaultType, ReturnRequest, ReturnRequestCreateDto, ReturnStatusChangeDto,
};
use contracts::domain::errors::SettlementError;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, ApiResult};
use crate::domain::a005_return_request::service::{self, AutoRefundStats, ShopAction};

/// POST /api/returns — открыть заявку на возврат
pub async fn create(Json(dto): Json<ReturnRequestCreateDto>) -> ApiResult<ReturnRequest> {
    let request = service::create(&dto).await?;
    Ok(Json(request))
}

/// GET /api/returns/:id
pub async fn get_by_id(Path(id): Path<Uuid>) -> ApiResult<ReturnRequest> {
    let request = service::get_by_id(id).await?;
    Ok(Json(request))
}

/// POST /api/returns/status-change — изменение статуса внешней стороной
pub async fn status_change(Json(dto): Json<ReturnStatusChangeDto>) -> ApiResult<ReturnRequest> {
    let request = service::apply_status_change(&dto).await?;
    Ok(Json(request))
}

#[derive(Deserialize)]
pub struct ShopActionRequest {
    pub action: ShopAction,
}

/// POST /api/returns/:id/shop-action — магазин принимает или оспаривает
pub async fn shop_action(
    Path(id): Path<Uuid>,
    Json(body): Json<ShopActionRequest>,
) -> ApiResult<ReturnRequest> {
    let request = service::shop_receive_or_dispute(id, body.action).await?;
    Ok(Json(request))
}

#[derive(Deserialize)]
pub struct ResolveRequest {
    #[serde(rename = "faultType")]
    pub fault_type: String,
}

/// POST /api/returns/:id/resolve — решение спора платформой
pub async fn resolve(
    Path(id): Path<Uuid>,
    Json(body): Json<ResolveRequest>,
) -> ApiResult<ReturnRequest> {
    let fault = FaultType::parse(&body.fault_type)
        .map_err(|e| ApiError(SettlementError::InvalidStateTransition(e)))?;
    let request = service::resolve_dispute(id, fault).await?;
    Ok(Json(request))
}

/// POST /api/returns/auto-refund — прогон автоворзвратов (и по расписанию,
/// и по требованию для тестов)
pub async fn auto_refund() -> ApiResult<AutoRefundStats> {
    let stats = service::auto_refund_unresponsive().await?;
    Ok(Json(stats))
}
