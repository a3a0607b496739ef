//! Агрегация счетов на выплату магазинам.
//!
//! Счёт собирает допущенные невыплаченные строки, перерасходы доставки и
//! сборы за обратную доставку; состав фиксируется в транзакции создания.
//! markBillAsPaid — единственная точка, где строки считаются выплаченными;
//! корзины кошельков при этом не трогаются (счёт — авторитетная запись
//! о выплате, сверка идёт по регистру и суммам счетов).

use anyhow::anyhow;
use chrono::Utc;
use contracts::domain::a006_payout_bill::aggregate::{
    MarkBillPaidDto, PayoutBill, PayoutBillDetailDto, PayoutBillStatus,
};
use contracts::domain::common::AggregateId;
use contracts::domain::errors::SettlementError;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use super::repository;
use crate::domain::{a004_order_item, a007_shipping_fee, a008_return_shipping_fee};
use crate::shared::data::db::get_connection;
use crate::shared::money;

/// Создать счёт магазину из всех невыставленных позиций.
///
/// Пустой набор кандидатов — это NothingToPayout: сигнал вызывающему,
/// не сбой. Пока у магазина есть открытый счёт, второй не создаётся.
pub async fn create_bill_for_store(store_ref: &str) -> Result<PayoutBillDetailDto, SettlementError> {
    let txn = get_connection()
        .begin()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;

    if let Some(existing) = repository::find_pending_by_store_in(&txn, store_ref)
        .await
        .map_err(SettlementError::Internal)?
    {
        return Err(SettlementError::InvalidStateTransition(format!(
            "Store already has a pending payout bill {}",
            existing.base.code
        )));
    }

    let items = a004_order_item::repository::list_payout_candidates_in(&txn, store_ref)
        .await
        .map_err(SettlementError::Internal)?;
    let shipping_fees = a007_shipping_fee::repository::list_unbilled_for_store_in(&txn, store_ref)
        .await
        .map_err(SettlementError::Internal)?;
    let return_fees =
        a008_return_shipping_fee::repository::list_unbilled_for_store_in(&txn, store_ref)
            .await
            .map_err(SettlementError::Internal)?;

    if items.is_empty() && shipping_fees.is_empty() && return_fees.is_empty() {
        return Err(SettlementError::NothingToPayout(store_ref.to_string()));
    }

    let mut bill = PayoutBill::new_for_insert(
        format!("BILL-{}", Uuid::new_v4()),
        store_ref.to_string(),
    );
    let bill_ref = bill.base.id.as_string();

    let total_gross = money::sum(items.iter().map(|i| i.gross_line_total));
    let total_platform_fee = money::sum(
        items
            .iter()
            .map(|i| money::platform_fee_amount(i.gross_line_total, i.platform_fee_percentage)),
    );
    let total_shipping_order_fee = money::sum(shipping_fees.iter().map(|f| f.extra_for_store));
    let total_return_shipping_fee = money::sum(return_fees.iter().map(|f| f.amount));
    let total_net_payout = money::sum([
        total_gross,
        -total_platform_fee,
        -total_shipping_order_fee,
        -total_return_shipping_fee,
    ]);

    bill.total_gross = total_gross;
    bill.total_platform_fee = total_platform_fee;
    bill.total_shipping_order_fee = total_shipping_order_fee;
    bill.total_return_shipping_fee = total_return_shipping_fee;
    bill.total_net_payout = total_net_payout;

    repository::insert_in(&txn, &bill)
        .await
        .map_err(SettlementError::Internal)?;

    // Состав фиксируется на строках: проигранный CAS означает, что строку
    // параллельно изменил другой процесс — счёт не создаётся, позиции
    // вернутся в кандидаты на следующем прогоне
    let mut item_refs = Vec::with_capacity(items.len());
    for item in &items {
        let fee = money::platform_fee_amount(item.gross_line_total, item.platform_fee_percentage);
        let attached = a004_order_item::repository::attach_to_bill_in(
            &txn,
            item.base.id.value(),
            &bill_ref,
            fee,
            item.shipping_extra_for_store,
            item.base.metadata.version,
        )
        .await
        .map_err(SettlementError::Internal)?;
        if !attached {
            return Err(SettlementError::Internal(anyhow!(
                "order item {} changed concurrently while building payout bill",
                item.base.id.as_string()
            )));
        }
        item_refs.push(item.base.id.as_string());
    }

    let mut shipping_fee_refs = Vec::with_capacity(shipping_fees.len());
    for fee in &shipping_fees {
        let attached =
            a007_shipping_fee::repository::attach_to_bill_in(&txn, fee.base.id.value(), &bill_ref)
                .await
                .map_err(SettlementError::Internal)?;
        if !attached {
            return Err(SettlementError::Internal(anyhow!(
                "shipping fee {} changed concurrently while building payout bill",
                fee.base.id.as_string()
            )));
        }
        shipping_fee_refs.push(fee.base.id.as_string());
    }

    let mut return_shipping_fee_refs = Vec::with_capacity(return_fees.len());
    for fee in &return_fees {
        let attached = a008_return_shipping_fee::repository::attach_to_bill_in(
            &txn,
            fee.base.id.value(),
            &bill_ref,
        )
        .await
        .map_err(SettlementError::Internal)?;
        if !attached {
            return Err(SettlementError::Internal(anyhow!(
                "return shipping fee {} changed concurrently while building payout bill",
                fee.base.id.as_string()
            )));
        }
        return_shipping_fee_refs.push(fee.base.id.as_string());
    }

    txn.commit()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;

    tracing::info!(bill = %bill_ref, store = store_ref, net = total_net_payout,
        items = item_refs.len(), "Payout bill created");
    Ok(PayoutBillDetailDto {
        bill,
        item_refs,
        shipping_fee_refs,
        return_shipping_fee_refs,
    })
}

/// Существующий открытый счёт магазина или новый (один открытый
/// счёт на магазин одновременно)
pub async fn get_or_create_bill_for_store(
    store_ref: &str,
) -> Result<PayoutBillDetailDto, SettlementError> {
    if let Some(existing) = repository::find_pending_by_store_in(get_connection(), store_ref)
        .await
        .map_err(SettlementError::Internal)?
    {
        return get_detail(existing.base.id.value()).await;
    }
    create_bill_for_store(store_ref).await
}

/// Счёт со ссылками на состав
pub async fn get_detail(bill_id: Uuid) -> Result<PayoutBillDetailDto, SettlementError> {
    let db = get_connection();
    let bill = repository::get_by_id(bill_id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("payout bill {}", bill_id)))?;
    let bill_ref = bill.base.id.as_string();
    let items = a004_order_item::repository::list_by_bill_in(db, &bill_ref)
        .await
        .map_err(SettlementError::Internal)?;
    let shipping_fees = a007_shipping_fee::repository::list_by_bill_in(db, &bill_ref)
        .await
        .map_err(SettlementError::Internal)?;
    let return_fees = a008_return_shipping_fee::repository::list_by_bill_in(db, &bill_ref)
        .await
        .map_err(SettlementError::Internal)?;
    Ok(PayoutBillDetailDto {
        bill,
        item_refs: items.iter().map(|i| i.base.id.as_string()).collect(),
        shipping_fee_refs: shipping_fees.iter().map(|f| f.base.id.as_string()).collect(),
        return_shipping_fee_refs: return_fees.iter().map(|f| f.base.id.as_string()).collect(),
    })
}

/// PENDING → PAID ровно один раз; в той же транзакции строки счёта
/// получают is_payout = true, сборы — paid_by_shop = true
pub async fn mark_bill_paid(
    bill_id: Uuid,
    dto: &MarkBillPaidDto,
) -> Result<PayoutBill, SettlementError> {
    let txn = get_connection()
        .begin()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;

    let mut bill = repository::get_by_id_in(&txn, bill_id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("payout bill {}", bill_id)))?;

    if bill.status == PayoutBillStatus::Paid {
        return Err(SettlementError::InvalidStateTransition(
            "Payout bill is already PAID".to_string(),
        ));
    }

    let expected_version = bill.base.metadata.version;
    bill.status = PayoutBillStatus::Paid;
    bill.payment_reference = Some(dto.reference.clone());
    bill.receipt_url = dto.receipt_url.clone();
    bill.note = dto.note.clone();
    bill.paid_at = Some(Utc::now());
    bill.before_write();

    let updated = repository::mark_paid_in(&txn, &bill, expected_version)
        .await
        .map_err(SettlementError::Internal)?;
    if !updated {
        return Err(SettlementError::InvalidStateTransition(
            "Payout bill was paid concurrently".to_string(),
        ));
    }

    let bill_ref = bill.base.id.as_string();
    let items_flipped = a004_order_item::repository::mark_paid_by_bill_in(&txn, &bill_ref)
        .await
        .map_err(SettlementError::Internal)?;
    a007_shipping_fee::repository::mark_paid_by_bill_in(&txn, &bill_ref)
        .await
        .map_err(SettlementError::Internal)?;
    a008_return_shipping_fee::repository::mark_paid_by_bill_in(&txn, &bill_ref)
        .await
        .map_err(SettlementError::Internal)?;

    txn.commit()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;

    tracing::info!(bill = %bill_ref, reference = %dto.reference, items_flipped,
        "Payout bill marked as paid");
    Ok(bill)
}

pub async fn list_by_store(store_ref: &str) -> Result<Vec<PayoutBill>, SettlementError> {
    repository::list_by_store(store_ref)
        .await
        .map_err(SettlementError::Internal)
}
