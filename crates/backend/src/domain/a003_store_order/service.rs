use contracts::domain::a002_order::aggregate::{OrderStatus, SettlementState};
use contracts::domain::a003_store_order::aggregate::{
    CancelRequestState, DeliveryConfirmationDto, StoreOrder, StoreOrderStatus,
};
use contracts::domain::common::AggregateId;
use contracts::domain::errors::SettlementError;
use uuid::Uuid;

use super::repository;
use crate::domain::a002_order::{self, settlement};
use crate::domain::a004_order_item;

fn parse_id(raw: &str, what: &str) -> Result<Uuid, SettlementError> {
    Uuid::parse_str(raw).map_err(|_| SettlementError::NotFound(format!("{} {}", what, raw)))
}

async fn load(id: Uuid) -> Result<StoreOrder, SettlementError> {
    repository::get_by_id(id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("store order {}", id)))
}

async fn save(
    mut store_order: StoreOrder,
) -> Result<StoreOrder, SettlementError> {
    let expected_version = store_order.base.metadata.version;
    store_order.before_write();
    let updated = repository::update_state_in(
        crate::shared::data::db::get_connection(),
        &store_order,
        expected_version,
    )
    .await
    .map_err(SettlementError::Internal)?;
    if !updated {
        return Err(SettlementError::Internal(anyhow::anyhow!(
            "concurrent update of store order {}",
            store_order.base.id.as_string()
        )));
    }
    Ok(store_order)
}

/// Подтверждение вручения от службы доставки: ставит delivered_at на
/// подзаказ и его строки, запуская отсчёт окна удержания.
/// Поздние подтверждения на строки досинхронизирует u501 (обход 3).
pub async fn apply_delivery_confirmation(
    dto: &DeliveryConfirmationDto,
) -> Result<(), SettlementError> {
    let id = parse_id(&dto.store_order_id, "store order")?;
    let mut store_order = load(id).await?;

    if store_order.status == StoreOrderStatus::Cancelled {
        return Err(SettlementError::InvalidStateTransition(
            "Cancelled store order cannot be delivered".to_string(),
        ));
    }
    if store_order.delivered_at.is_some() {
        // Повторный webhook вручения — no-op
        return Ok(());
    }

    store_order.delivered_at = Some(dto.delivered_at);
    store_order.status = StoreOrderStatus::Delivered;
    let store_order = save(store_order).await?;

    let items = a004_order_item::repository::list_by_store_order_in(
        crate::shared::data::db::get_connection(),
        &store_order.base.id.as_string(),
    )
    .await
    .map_err(SettlementError::Internal)?;
    for item in items {
        if item.delivered_at.is_none() {
            a004_order_item::repository::set_delivered_at(item.base.id.value(), dto.delivered_at)
                .await
                .map_err(SettlementError::Internal)?;
        }
    }
    tracing::info!(store_order = %store_order.base.id.as_string(), "Delivery confirmed");
    Ok(())
}

/// Отмена всего заказа покупателем без одобрения магазинов.
///
/// Разрешена только пока родительский заказ в PENDING. Если оплата уже
/// расчитана (settlement_state == HELD), полный реверс выполняется до
/// смены статусов.
pub async fn customer_cancel_if_pending(order_id: Uuid) -> Result<f64, SettlementError> {
    let order = a002_order::repository::get_by_id(order_id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("order {}", order_id)))?;

    if order.status != OrderStatus::Pending {
        return Err(SettlementError::InvalidStateTransition(
            "Order status must be PENDING to cancel immediately".to_string(),
        ));
    }

    let refunded = match order.settlement_state {
        SettlementState::Held => settlement::refund_whole_order(order_id).await?,
        SettlementState::None | SettlementState::Refunded => 0.0,
        SettlementState::Released => {
            return Err(SettlementError::InvalidStateTransition(
                "Order funds are already released; use the return flow instead".to_string(),
            ));
        }
    };

    // Статусы меняются после реверса; повторный вызов после сбоя между
    // шагами доведёт отмену до конца (реверс уже идемпотентен)
    let order_ref = order.base.id.as_string();
    let store_orders = repository::list_by_order(&order_ref)
        .await
        .map_err(SettlementError::Internal)?;
    for store_order in store_orders {
        if store_order.status != StoreOrderStatus::Cancelled {
            let mut so = store_order;
            so.status = StoreOrderStatus::Cancelled;
            save(so).await?;
        }
    }

    // Реверс поднял версию заказа: для смены статуса нужен свежий агрегат
    let order = a002_order::repository::get_by_id(order_id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("order {}", order_id)))?;
    cancel_parent(order).await?;

    tracing::info!(order = %order_ref, refunded, "Order cancelled by customer");
    Ok(refunded)
}

/// Запрос отмены подзаказа покупателем: только из AWAITING_SHIPMENT
pub async fn request_cancel(store_order_id: Uuid) -> Result<StoreOrder, SettlementError> {
    let mut store_order = load(store_order_id).await?;

    if store_order.status != StoreOrderStatus::AwaitingShipment {
        return Err(SettlementError::InvalidStateTransition(
            "Store order must be AWAITING_SHIPMENT to request cancellation".to_string(),
        ));
    }
    if store_order.cancel_state == CancelRequestState::Requested {
        // Повторный запрос — no-op
        return Ok(store_order);
    }

    store_order.cancel_state = CancelRequestState::Requested;
    save(store_order).await
}

/// Одобрение отмены магазином: реверс доли подзаказа + CANCELLED.
/// Когда отменены все подзаказы, родительский заказ тоже гаснет.
pub async fn shop_approve_cancel(store_order_id: Uuid) -> Result<f64, SettlementError> {
    let store_order = load(store_order_id).await?;

    if store_order.cancel_state != CancelRequestState::Requested {
        return Err(SettlementError::InvalidStateTransition(
            "Cancellation must be REQUESTED before the shop can approve it".to_string(),
        ));
    }

    let refunded = settlement::refund_store_part(store_order_id).await?;

    let mut store_order = load(store_order_id).await?;
    store_order.cancel_state = CancelRequestState::Approved;
    store_order.status = StoreOrderStatus::Cancelled;
    let store_order = save(store_order).await?;

    let order_id = parse_id(&store_order.order_ref, "order")?;
    let order = a002_order::repository::get_by_id(order_id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("order {}", order_id)))?;
    let siblings = repository::list_by_order(&store_order.order_ref)
        .await
        .map_err(SettlementError::Internal)?;
    if siblings
        .iter()
        .all(|so| so.status == StoreOrderStatus::Cancelled)
    {
        cancel_parent(order).await?;
    }

    tracing::info!(store_order = %store_order.base.id.as_string(), refunded,
        "Store order cancellation approved");
    Ok(refunded)
}

/// Отклонение отмены магазином: REQUESTED → REJECTED
pub async fn shop_reject_cancel(store_order_id: Uuid) -> Result<StoreOrder, SettlementError> {
    let mut store_order = load(store_order_id).await?;

    if store_order.cancel_state != CancelRequestState::Requested {
        return Err(SettlementError::InvalidStateTransition(
            "Cancellation must be REQUESTED before the shop can reject it".to_string(),
        ));
    }

    store_order.cancel_state = CancelRequestState::Rejected;
    save(store_order).await
}

async fn cancel_parent(
    order: contracts::domain::a002_order::aggregate::Order,
) -> Result<(), SettlementError> {
    if order.status == OrderStatus::Cancelled {
        return Ok(());
    }
    let mut order = order;
    let expected_version = order.base.metadata.version;
    order.status = OrderStatus::Cancelled;
    order.before_write();
    let updated = a002_order::repository::update_state_in(
        crate::shared::data::db::get_connection(),
        &order,
        expected_version,
    )
    .await
    .map_err(SettlementError::Internal)?;
    if !updated {
        return Err(SettlementError::Internal(anyhow::anyhow!(
            "concurrent update of order {} during cancellation",
            order.base.id.as_string()
        )));
    }
    Ok(())
}
