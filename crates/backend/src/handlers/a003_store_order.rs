use axum::extract::Path;
use axum::Json;
use contracts::domain::a003_store_order::aggregate::{DeliveryConfirmationDto, StoreOrder};
use serde::Serialize;
use uuid::Uuid;

use super::ApiResult;
use crate::domain::a003_store_order;

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// POST /api/delivery/confirmation — webhook службы доставки.
/// Ставит delivered_at, запуская отсчёт окна удержания.
pub async fn delivery_confirmation(
    Json(dto): Json<DeliveryConfirmationDto>,
) -> ApiResult<OkResponse> {
    a003_store_order::service::apply_delivery_confirmation(&dto).await?;
    Ok(Json(OkResponse { ok: true }))
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub refunded: f64,
}

/// POST /api/cancellation/order/:order_id — немедленная отмена
/// покупателем, только пока заказ PENDING
pub async fn customer_cancel(Path(order_id): Path<Uuid>) -> ApiResult<CancelResponse> {
    let refunded = a003_store_order::service::customer_cancel_if_pending(order_id).await?;
    Ok(Json(CancelResponse { refunded }))
}

/// POST /api/cancellation/store-order/:id/request — запрос отмены подзаказа
pub async fn request_cancel(Path(store_order_id): Path<Uuid>) -> ApiResult<StoreOrder> {
    let store_order = a003_store_order::service::request_cancel(store_order_id).await?;
    Ok(Json(store_order))
}

/// POST /api/cancellation/store-order/:id/approve — одобрение магазином
pub async fn approve_cancel(Path(store_order_id): Path<Uuid>) -> ApiResult<CancelResponse> {
    let refunded = a003_store_order::service::shop_approve_cancel(store_order_id).await?;
    Ok(Json(CancelResponse { refunded }))
}

/// POST /api/cancellation/store-order/:id/reject — отклонение магазином
pub async fn reject_cancel(Path(store_order_id): Path<Uuid>) -> ApiResult<StoreOrder> {
    let store_order = a003_store_order::service::shop_reject_cancel(store_order_id).await?;
    Ok(Json(store_order))
}
