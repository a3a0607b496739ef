use contracts::domain::a007_shipping_fee::aggregate::{
    ShippingFee, ShippingFeeReconciliationDto,
};
use contracts::domain::common::AggregateId;
use contracts::domain::errors::SettlementError;
use uuid::Uuid;

use super::repository;
use crate::domain::a003_store_order;
use crate::shared::money;

/// Сверка фактического тарифа доставки:
/// extra_for_store = max(actual - estimated, 0).
///
/// Повторная сверка обновляет запись, пока она не включена в счёт.
pub async fn apply_reconciliation(
    dto: &ShippingFeeReconciliationDto,
) -> Result<ShippingFee, SettlementError> {
    let store_order_id = Uuid::parse_str(&dto.store_order_id)
        .map_err(|_| SettlementError::NotFound(format!("store order {}", dto.store_order_id)))?;
    let store_order = a003_store_order::repository::get_by_id(store_order_id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("store order {}", store_order_id)))?;

    let actual = money::round_money(dto.actual_fee);
    let extra = money::round_money((actual - store_order.shipping_fee_estimated).max(0.0));
    let store_order_ref = store_order.base.id.as_string();

    if let Some(mut existing) = repository::find_by_store_order(&store_order_ref)
        .await
        .map_err(SettlementError::Internal)?
    {
        if existing.payout_bill_ref.is_some() {
            return Err(SettlementError::InvalidStateTransition(
                "Shipping fee is already included in a payout bill".to_string(),
            ));
        }
        existing.actual_fee = actual;
        existing.extra_for_store = extra;
        repository::update_actual(&existing)
            .await
            .map_err(SettlementError::Internal)?;
        return Ok(existing);
    }

    let fee = ShippingFee::new_for_insert(
        format!("SHF-{}", store_order.base.code),
        store_order_ref,
        store_order.store_ref.clone(),
        store_order.shipping_fee_estimated,
        actual,
        extra,
    );
    repository::insert(&fee)
        .await
        .map_err(SettlementError::Internal)?;
    tracing::info!(store_order = %fee.store_order_ref, extra, "Shipping fee reconciled");
    Ok(fee)
}

#[cfg(test)]
mod tests {
    use crate::shared::money;

    #[test]
    fn extra_is_never_negative() {
        // actual below estimate: store owes nothing
        let extra = money::round_money((8.0f64 - 10.0).max(0.0));
        assert_eq!(extra, 0.0);
        let extra = money::round_money((12.5f64 - 10.0).max(0.0));
        assert_eq!(extra, 2.5);
    }
}
