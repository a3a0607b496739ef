use axum::extract::Path;
use axum::Json;
use contracts::domain::a006_payout_bill::aggregate::{
    MarkBillPaidDto, PayoutBill, PayoutBillDetailDto,
};
use uuid::Uuid;

use super::ApiResult;
use crate::domain::a006_payout_bill::service;

/// POST /api/payout-bills/create/:store_ref — собрать счёт магазину
pub async fn create_for_store(Path(store_ref): Path<String>) -> ApiResult<PayoutBillDetailDto> {
    let detail = service::create_bill_for_store(&store_ref).await?;
    Ok(Json(detail))
}

/// GET /api/payout-bills/get-or-create/:store_ref — открытый счёт или новый
pub async fn get_or_create(Path(store_ref): Path<String>) -> ApiResult<PayoutBillDetailDto> {
    let detail = service::get_or_create_bill_for_store(&store_ref).await?;
    Ok(Json(detail))
}

/// GET /api/payout-bills/:id
pub async fn get_by_id(Path(id): Path<Uuid>) -> ApiResult<PayoutBillDetailDto> {
    let detail = service::get_detail(id).await?;
    Ok(Json(detail))
}

/// POST /api/payout-bills/:id/mark-paid — PENDING → PAID ровно один раз
pub async fn mark_paid(
    Path(id): Path<Uuid>,
    Json(dto): Json<MarkBillPaidDto>,
) -> ApiResult<PayoutBill> {
    let bill = service::mark_bill_paid(id, &dto).await?;
    Ok(Json(bill))
}

/// GET /api/payout-bills/store/:store_ref — история счетов магазина
pub async fn list_by_store(Path(store_ref): Path<String>) -> ApiResult<Vec<PayoutBill>> {
    let bills = service::list_by_store(&store_ref).await?;
    Ok(Json(bills))
}
