use axum::extract::Path;
use axum::Json;
use contracts::domain::a002_order::aggregate::{Order, OrderIntakeDto};
use contracts::domain::a003_store_order::aggregate::StoreOrder;
use contracts::domain::a004_order_item::aggregate::OrderItem;
use contracts::domain::errors::SettlementError;
use serde::Serialize;
use uuid::Uuid;

use super::ApiResult;
use crate::domain::a002_order;

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub id: String,
}

/// POST /api/orders — приём заказа (checkout отдаёт готовые строки)
pub async fn create(Json(dto): Json<OrderIntakeDto>) -> ApiResult<OrderCreatedResponse> {
    let id = a002_order::service::create(dto)
        .await
        .map_err(SettlementError::Internal)?;
    Ok(Json(OrderCreatedResponse { id: id.to_string() }))
}

#[derive(Serialize)]
pub struct OrderDetailResponse {
    pub order: Order,
    #[serde(rename = "storeOrders")]
    pub store_orders: Vec<StoreOrder>,
    pub items: Vec<OrderItem>,
}

/// GET /api/orders/:id — заказ с подзаказами и строками
pub async fn get_by_id(Path(id): Path<Uuid>) -> ApiResult<OrderDetailResponse> {
    let detail = a002_order::service::get_detail(id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("order {}", id)))?;
    let (order, store_orders, items) = detail;
    Ok(Json(OrderDetailResponse {
        order,
        store_orders,
        items,
    }))
}
