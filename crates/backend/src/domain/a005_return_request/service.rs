use chrono::{Duration, Utc};
use contracts::domain::a005_return_request::aggregate::{
    FaultType, ReturnRequest, ReturnRequestCreateDto, ReturnStatus, ReturnStatusChangeDto,
};
use contracts::domain::a008_return_shipping_fee::aggregate::ReturnShippingFee;
use contracts::domain::common::AggregateId;
use contracts::domain::errors::SettlementError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repository;
use crate::domain::a002_order::settlement;
use crate::domain::{a003_store_order, a004_order_item, a008_return_shipping_fee};
use crate::shared::config;

/// Действие магазина по заявке
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShopAction {
    /// Магазин принял возврат: деньги покупателю
    Receive,
    /// Магазин оспаривает возврат
    Dispute,
}

async fn load(id: Uuid) -> Result<ReturnRequest, SettlementError> {
    repository::get_by_id(id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("return request {}", id)))
}

async fn save(mut request: ReturnRequest) -> Result<ReturnRequest, SettlementError> {
    let expected_version = request.base.metadata.version;
    request.before_write();
    let updated = repository::update_state(&request, expected_version)
        .await
        .map_err(SettlementError::Internal)?;
    if !updated {
        return Err(SettlementError::Internal(anyhow::anyhow!(
            "concurrent update of return request {}",
            request.base.id.as_string()
        )));
    }
    Ok(request)
}

pub async fn get_by_id(id: Uuid) -> Result<ReturnRequest, SettlementError> {
    load(id).await
}

/// Открыть заявку на возврат по строке заказа
pub async fn create(dto: &ReturnRequestCreateDto) -> Result<ReturnRequest, SettlementError> {
    let item_id = Uuid::parse_str(&dto.order_item_id)
        .map_err(|_| SettlementError::NotFound(format!("order item {}", dto.order_item_id)))?;
    let item = a004_order_item::service::get_by_id(item_id).await?;

    if item.is_returned {
        return Err(SettlementError::InvalidStateTransition(
            "Order item is already returned".to_string(),
        ));
    }
    if item.is_payout {
        return Err(SettlementError::InvalidStateTransition(
            "Order item is already paid out to the store".to_string(),
        ));
    }
    if let Some(existing) = repository::latest_for_item(&dto.order_item_id)
        .await
        .map_err(SettlementError::Internal)?
    {
        if !existing.status.is_terminal() {
            return Err(SettlementError::InvalidStateTransition(
                "An active return request already exists for this item".to_string(),
            ));
        }
    }

    let order = crate::domain::a002_order::repository::get_by_id(
        Uuid::parse_str(&item.order_ref)
            .map_err(|_| SettlementError::NotFound(format!("order {}", item.order_ref)))?,
    )
    .await
    .map_err(SettlementError::Internal)?
    .ok_or_else(|| SettlementError::NotFound(format!("order {}", item.order_ref)))?;

    let mut request = ReturnRequest::new_for_insert(
        format!("RET-{}", Uuid::new_v4()),
        item.base.id.as_string(),
        order.customer_ref.clone(),
        item.store_ref.clone(),
        item.gross_line_total,
    );
    request.base.comment = dto.comment.clone();
    repository::insert(&request)
        .await
        .map_err(SettlementError::Internal)?;
    tracing::info!(return_request = %request.base.id.as_string(),
        item = %request.order_item_ref, "Return request opened");
    Ok(request)
}

/// Изменение статуса возврата внешней стороной: применяется к
/// последней заявке по строке. Терминализация в REFUNDED кредитует
/// покупателя (идемпотентно по ключу дедупликации).
pub async fn apply_status_change(
    dto: &ReturnStatusChangeDto,
) -> Result<ReturnRequest, SettlementError> {
    let request = repository::latest_for_item(&dto.order_item_id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| {
            SettlementError::NotFound(format!("return request for item {}", dto.order_item_id))
        })?;
    if request.status.is_terminal() {
        return Err(SettlementError::InvalidStateTransition(format!(
            "Return request is already terminal ({})",
            request.status.as_str()
        )));
    }

    let new_status =
        ReturnStatus::parse(&dto.status).map_err(SettlementError::InvalidStateTransition)?;
    let mut request = request;
    if let Some(fault) = &dto.fault_type {
        request.fault_type =
            FaultType::parse(fault).map_err(SettlementError::InvalidStateTransition)?;
    }

    if new_status.is_refunded() {
        settlement::refund_for_return(&request).await?;
        charge_return_shipping_if_shop_fault(&request).await?;
        request.closed_at = Some(Utc::now());
    } else if new_status.is_terminal() {
        request.closed_at = Some(Utc::now());
    } else if new_status == ReturnStatus::Dispute && request.dispute_opened_at.is_none() {
        request.dispute_opened_at = Some(Utc::now());
    }
    request.status = new_status;
    save(request).await
}

/// Магазин принимает возврат или открывает спор
pub async fn shop_receive_or_dispute(
    id: Uuid,
    action: ShopAction,
) -> Result<ReturnRequest, SettlementError> {
    let mut request = load(id).await?;

    match request.status {
        ReturnStatus::Pending | ReturnStatus::Approved | ReturnStatus::Shipping => {}
        other => {
            return Err(SettlementError::InvalidStateTransition(format!(
                "Return request must be open to act on it, current status is {}",
                other.as_str()
            )));
        }
    }

    request.shop_responded_at = Some(Utc::now());
    match action {
        ShopAction::Receive => {
            settlement::refund_for_return(&request).await?;
            charge_return_shipping_if_shop_fault(&request).await?;
            request.status = ReturnStatus::Refunded;
            request.closed_at = Some(Utc::now());
        }
        ShopAction::Dispute => {
            request.status = ReturnStatus::Dispute;
            request.dispute_opened_at = Some(Utc::now());
        }
    }
    save(request).await
}

/// Решение спора: вина покупателя закрывает заявку отказом, иначе
/// возврат исполняется за счёт виновной стороны
pub async fn resolve_dispute(
    id: Uuid,
    fault_type: FaultType,
) -> Result<ReturnRequest, SettlementError> {
    let mut request = load(id).await?;

    if request.status != ReturnStatus::Dispute {
        return Err(SettlementError::InvalidStateTransition(
            "Return request must be in DISPUTE to resolve it".to_string(),
        ));
    }

    request.fault_type = fault_type;
    request.closed_at = Some(Utc::now());
    if fault_type == FaultType::Customer {
        request.status = ReturnStatus::Rejected;
    } else {
        settlement::refund_for_return(&request).await?;
        charge_return_shipping_if_shop_fault(&request).await?;
        request.status = ReturnStatus::Refunded;
    }
    save(request).await
}

/// Статистика прогона автоворзвратов
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoRefundStats {
    pub disputes_checked: usize,
    pub complaints_checked: usize,
    pub refunded: usize,
    pub failed: usize,
}

/// Автовозврат по неотвеченным спорам (3 дня) и жалобам (2 дня).
///
/// Идемпотентность: флаг auto_refund_executed плюс ключи дедупликации
/// проводок — повторный прогон в тот же день не кредитует второй раз.
/// Ошибка по одной заявке логируется и не прерывает остальные.
pub async fn auto_refund_unresponsive() -> Result<AutoRefundStats, SettlementError> {
    let cfg = config::settlement_config();
    let now = Utc::now();
    let mut stats = AutoRefundStats::default();

    let disputes = repository::list_unanswered_disputes(
        now - Duration::days(cfg.dispute_auto_refund_days),
    )
    .await
    .map_err(SettlementError::Internal)?;
    stats.disputes_checked = disputes.len();

    let complaints = repository::list_unanswered_complaints(
        now - Duration::days(cfg.complaint_auto_refund_days),
    )
    .await
    .map_err(SettlementError::Internal)?;
    stats.complaints_checked = complaints.len();

    for request in disputes.into_iter().chain(complaints) {
        if request.auto_refund_executed {
            continue;
        }
        let request_ref = request.base.id.as_string();
        match auto_refund_one(request).await {
            Ok(()) => stats.refunded += 1,
            Err(e) => {
                stats.failed += 1;
                tracing::error!(return_request = %request_ref, error = %e,
                    "Auto-refund failed, will retry on next run");
            }
        }
    }

    tracing::info!(?stats, "Auto-refund sweep finished");
    Ok(stats)
}

async fn auto_refund_one(mut request: ReturnRequest) -> Result<(), SettlementError> {
    // Деньги идут первыми: кредит идемпотентен по ключу дедупликации,
    // так что сбой между шагами доводится повторным прогоном
    settlement::refund_for_return(&request).await?;
    charge_return_shipping_if_shop_fault(&request).await?;
    request.status = ReturnStatus::AutoRefunded;
    request.auto_refund_executed = true;
    request.closed_at = Some(Utc::now());
    save(request).await?;
    Ok(())
}

/// Возврат по вине магазина несёт сбор за обратную доставку: размер равен
/// оценке доставки родительского подзаказа, попадает в ближайший счёт
async fn charge_return_shipping_if_shop_fault(
    request: &ReturnRequest,
) -> Result<(), SettlementError> {
    if request.fault_type != FaultType::Shop {
        return Ok(());
    }
    let request_ref = request.base.id.as_string();
    if a008_return_shipping_fee::repository::exists_for_return(&request_ref)
        .await
        .map_err(SettlementError::Internal)?
    {
        return Ok(());
    }

    let item_id = Uuid::parse_str(&request.order_item_ref)
        .map_err(|_| SettlementError::NotFound(format!("order item {}", request.order_item_ref)))?;
    let item = a004_order_item::service::get_by_id(item_id).await?;
    let store_order_id = Uuid::parse_str(&item.store_order_ref).map_err(|_| {
        SettlementError::NotFound(format!("store order {}", item.store_order_ref))
    })?;
    let Some(store_order) = a003_store_order::repository::get_by_id(store_order_id)
        .await
        .map_err(SettlementError::Internal)?
    else {
        return Ok(());
    };
    if store_order.shipping_fee_estimated <= 0.0 {
        return Ok(());
    }

    let fee = ReturnShippingFee::new_for_insert(
        format!("RSF-{}", request.base.code),
        request_ref,
        request.store_ref.clone(),
        store_order.shipping_fee_estimated,
    );
    a008_return_shipping_fee::repository::insert(&fee)
        .await
        .map_err(SettlementError::Internal)?;
    Ok(())
}
