use axum::Json;
use contracts::domain::a007_shipping_fee::aggregate::{
    ShippingFee, ShippingFeeReconciliationDto,
};

use super::ApiResult;
use crate::domain::a007_shipping_fee::service;

/// POST /api/shipping-fee/reconciliation — фактический тариф от службы
/// доставки; перерасход относится на магазин при выплате
pub async fn reconciliation(
    Json(dto): Json<ShippingFeeReconciliationDto>,
) -> ApiResult<ShippingFee> {
    let fee = service::apply_reconciliation(&dto).await?;
    Ok(Json(fee))
}
