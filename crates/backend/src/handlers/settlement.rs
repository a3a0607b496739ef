use axum::extract::Path;
use axum::Json;
use contracts::domain::a002_order::aggregate::PaymentConfirmationDto;
use serde::Serialize;
use uuid::Uuid;

use super::ApiResult;
use crate::domain::a002_order::settlement;

/// POST /api/settlement/payment-confirmation — webhook платёжного шлюза.
/// Повторная доставка возвращает duplicate=true без повторных проводок.
pub async fn payment_confirmation(
    Json(dto): Json<PaymentConfirmationDto>,
) -> ApiResult<settlement::SettlementOutcome> {
    let outcome = settlement::settle_payment(&dto).await?;
    Ok(Json(outcome))
}

#[derive(Serialize)]
pub struct ReleaseResponse {
    pub released: bool,
}

/// POST /api/settlement/release/:order_id — высвобождение после окна
/// удержания (обычно вызывается обходом u501)
pub async fn release(Path(order_id): Path<Uuid>) -> ApiResult<ReleaseResponse> {
    let released = settlement::release_after_hold(order_id).await?;
    Ok(Json(ReleaseResponse { released }))
}

#[derive(Serialize)]
pub struct RefundResponse {
    pub refunded: f64,
}

/// POST /api/settlement/refund-order/:order_id — полный реверс расчёта
pub async fn refund_order(Path(order_id): Path<Uuid>) -> ApiResult<RefundResponse> {
    let refunded = settlement::refund_whole_order(order_id).await?;
    Ok(Json(RefundResponse { refunded }))
}

/// POST /api/settlement/refund-store-order/:store_order_id — реверс доли магазина
pub async fn refund_store_order(
    Path(store_order_id): Path<Uuid>,
) -> ApiResult<RefundResponse> {
    let refunded = settlement::refund_store_part(store_order_id).await?;
    Ok(Json(RefundResponse { refunded }))
}
