//! Расчёт по заказу: движение денег покупатель → платформа → магазины.
//!
//! Последовательность для успешной оплаты фиксированная: информационная
//! запись покупателю → удержание платформы → распределение по магазинам.
//! Все шаги одного вызова выполняются в одной транзакции: частично
//! проведённого расчёта не существует для других операций.

use anyhow::anyhow;
use chrono::Utc;
use contracts::domain::a001_wallet::aggregate::{BalanceBucket, WalletKind};
use contracts::domain::a002_order::aggregate::{Order, PaymentConfirmationDto, SettlementState};
use contracts::domain::a005_return_request::aggregate::{FaultType, ReturnRequest};
use contracts::domain::common::AggregateId;
use contracts::domain::errors::SettlementError;
use contracts::projections::p900_wallet_ledger::dto::LedgerEntryKind;
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repository;
use crate::domain::a001_wallet::service::{self as wallet_service, AdjustParams};
use crate::domain::{a003_store_order, a004_order_item};
use crate::shared::data::db::get_connection;
use crate::shared::money;

/// Владелец единственного кошелька платформы
pub const PLATFORM_OWNER: &str = "platform";

/// Результат расчёта подтверждённой оплаты
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementOutcome {
    #[serde(rename = "orderRef")]
    pub order_ref: String,
    #[serde(rename = "heldAmount")]
    pub held_amount: f64,
    pub allocations: Vec<StoreAllocation>,
    /// Повторная доставка webhook'а: ничего не проведено
    pub duplicate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreAllocation {
    #[serde(rename = "storeRef")]
    pub store_ref: String,
    pub amount: f64,
}

fn parse_order_id(raw: &str) -> Result<Uuid, SettlementError> {
    Uuid::parse_str(raw).map_err(|_| SettlementError::NotFound(format!("order {}", raw)))
}

async fn load_order<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Order, SettlementError> {
    repository::get_by_id_in(db, id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("order {}", id)))
}

/// Группировка строк заказа по магазинам; суммы точные (Decimal)
async fn store_shares<C: ConnectionTrait>(
    db: &C,
    order_ref: &str,
) -> Result<Vec<StoreAllocation>, SettlementError> {
    let items = a004_order_item::repository::list_by_order_in(db, order_ref)
        .await
        .map_err(SettlementError::Internal)?;
    let mut shares: Vec<StoreAllocation> = Vec::new();
    for item in &items {
        match shares.iter_mut().find(|s| s.store_ref == item.store_ref) {
            Some(share) => share.amount = money::sum([share.amount, item.gross_line_total]),
            None => shares.push(StoreAllocation {
                store_ref: item.store_ref.clone(),
                amount: money::round_money(item.gross_line_total),
            }),
        }
    }
    Ok(shares)
}

/// Расчёт подтверждённой оплаты (шаги 1-3 + перевод расчёта в HELD).
///
/// Повторная доставка webhook'а гасится дважды: по settlement_state заказа
/// и по существующей проводке (order, PENDING_HOLD) кошелька платформы.
pub async fn settle_payment(
    dto: &PaymentConfirmationDto,
) -> Result<SettlementOutcome, SettlementError> {
    if dto.result_code != "0" && dto.result_code.to_uppercase() != "SUCCESS" {
        return Err(SettlementError::InvalidStateTransition(format!(
            "Payment confirmation with result code {} is not successful",
            dto.result_code
        )));
    }
    let order_id = parse_order_id(&dto.order_id)?;

    let txn = get_connection()
        .begin()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;

    let mut order = load_order(&txn, order_id).await?;
    let order_ref = order.base.id.as_string();

    // Идемпотентность по явному состоянию расчёта
    if order.settlement_state != SettlementState::None {
        tracing::info!(order = %order_ref, state = order.settlement_state.as_str(),
            "Duplicate payment confirmation ignored");
        return Ok(SettlementOutcome {
            order_ref,
            held_amount: 0.0,
            allocations: Vec::new(),
            duplicate: true,
        });
    }

    let platform = wallet_service::ensure_wallet_in(&txn, WalletKind::Platform, PLATFORM_OWNER)
        .await
        .map_err(SettlementError::Internal)?;
    let platform_ref = platform.base.id.as_string();

    // Страховка от гонки двух webhook'ов: проводка удержания уже есть
    let held_already = crate::projections::p900_wallet_ledger::repository::exists_for_order(
        &txn,
        &platform_ref,
        &order_ref,
        LedgerEntryKind::PendingHold.as_str(),
    )
    .await
    .map_err(SettlementError::Internal)?;
    if held_already {
        tracing::warn!(order = %order_ref, "PENDING_HOLD ledger entry already present, skipping");
        return Ok(SettlementOutcome {
            order_ref,
            held_amount: 0.0,
            allocations: Vec::new(),
            duplicate: true,
        });
    }

    let amount = money::round_money(dto.amount_confirmed);
    let shares = store_shares(&txn, &order_ref).await?;
    let allocated: f64 = money::sum(shares.iter().map(|s| s.amount));

    // Инвариант сверки: распределение по магазинам == удержанная сумма.
    // Расхождение фатально для расчёта заказа и не корректируется молча.
    if !money::money_eq(allocated, amount) {
        tracing::error!(order = %order_ref, held = amount, allocated,
            "Settlement reconciliation mismatch, halting settlement for manual review");
        return Err(SettlementError::ReconciliationMismatch {
            order: order_ref,
            expected: amount,
            allocated,
        });
    }

    // Шаг 1: информационная запись покупателю (оплата прошла через шлюз,
    // баланс кошелька не дебетуется)
    let customer = wallet_service::ensure_wallet_in(&txn, WalletKind::Customer, &dto.customer_id)
        .await
        .map_err(SettlementError::Internal)?;
    wallet_service::record_informational_in(
        &txn,
        &customer,
        LedgerEntryKind::Deposit,
        Some(order_ref.clone()),
        Some(format!("order:{}:customer-payment", order_ref)),
        amount,
        format!("Gateway payment for order {}", order.base.code),
    )
    .await?;

    // Шаг 2: удержание на кошельке платформы
    for bucket in [
        BalanceBucket::PendingBalance,
        BalanceBucket::TotalBalance,
        BalanceBucket::ReceivedTotal,
    ] {
        wallet_service::adjust_in(
            &txn,
            AdjustParams {
                wallet_id: platform.base.id.value(),
                bucket,
                delta: amount,
                kind: LedgerEntryKind::PendingHold,
                order_ref: Some(order_ref.clone()),
                dedup_key: Some(wallet_service::order_dedup_key(
                    &order_ref,
                    &platform_ref,
                    LedgerEntryKind::PendingHold,
                    bucket,
                )),
                description: format!("Hold for order {}", order.base.code),
            },
        )
        .await?;
    }

    // Шаг 3: распределение удержания по кошелькам магазинов
    for share in &shares {
        let store = wallet_service::ensure_wallet_in(&txn, WalletKind::Store, &share.store_ref)
            .await
            .map_err(SettlementError::Internal)?;
        let store_wallet_ref = store.base.id.as_string();
        for bucket in [BalanceBucket::PendingBalance, BalanceBucket::TotalRevenue] {
            wallet_service::adjust_in(
                &txn,
                AdjustParams {
                    wallet_id: store.base.id.value(),
                    bucket,
                    delta: share.amount,
                    kind: LedgerEntryKind::PendingHold,
                    order_ref: Some(order_ref.clone()),
                    dedup_key: Some(wallet_service::order_dedup_key(
                        &order_ref,
                        &store_wallet_ref,
                        LedgerEntryKind::PendingHold,
                        bucket,
                    )),
                    description: format!(
                        "Pending allocation for order {} store {}",
                        order.base.code, share.store_ref
                    ),
                },
            )
            .await?;
        }
    }

    // Статус заказа не меняется: PENDING до начала исполнения магазинами,
    // факт оплаты фиксируют paid_at и settlement_state
    let expected_version = order.base.metadata.version;
    order.settlement_state = SettlementState::Held;
    order.paid_at = Some(Utc::now());
    order.before_write();
    let updated = repository::update_state_in(&txn, &order, expected_version)
        .await
        .map_err(SettlementError::Internal)?;
    if !updated {
        return Err(SettlementError::Internal(anyhow!(
            "concurrent update of order {} during settlement",
            order_ref
        )));
    }

    txn.commit()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;

    tracing::info!(order = %order_ref, amount, stores = shares.len(), "Payment settled");
    Ok(SettlementOutcome {
        order_ref,
        held_amount: amount,
        allocations: shares,
        duplicate: false,
    })
}

/// Высвобождение после окна удержания: pending → done у платформы,
/// pending → available у магазинов. HELD → RELEASED ровно один раз.
///
/// Авторитетный триггер — eligibility-обход (u501); повторный вызов на
/// уже высвобожденном заказе — no-op (Ok(false)).
pub async fn release_after_hold(order_id: Uuid) -> Result<bool, SettlementError> {
    let txn = get_connection()
        .begin()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;

    let mut order = load_order(&txn, order_id).await?;
    let order_ref = order.base.id.as_string();

    match order.settlement_state {
        SettlementState::Released => return Ok(false),
        SettlementState::Held => {}
        state => {
            return Err(SettlementError::InvalidStateTransition(format!(
                "Order settlement must be HELD to release, current state is {}",
                state.as_str()
            )));
        }
    }

    let store_orders = a003_store_order::repository::list_by_order_in(&txn, &order_ref)
        .await
        .map_err(SettlementError::Internal)?;
    let releasable: Vec<_> = store_orders
        .iter()
        .filter(|so| !so.settlement_refunded)
        .collect();
    let released_total = money::sum(releasable.iter().map(|so| so.subtotal));

    if released_total > 0.0 {
        let platform = wallet_service::ensure_wallet_in(&txn, WalletKind::Platform, PLATFORM_OWNER)
            .await
            .map_err(SettlementError::Internal)?;
        let platform_ref = platform.base.id.as_string();
        wallet_service::adjust_in(
            &txn,
            AdjustParams {
                wallet_id: platform.base.id.value(),
                bucket: BalanceBucket::PendingBalance,
                delta: -released_total,
                kind: LedgerEntryKind::ReleasePending,
                order_ref: Some(order_ref.clone()),
                dedup_key: Some(wallet_service::order_dedup_key(
                    &order_ref,
                    &platform_ref,
                    LedgerEntryKind::ReleasePending,
                    BalanceBucket::PendingBalance,
                )),
                description: format!("Release hold for order {}", order.base.code),
            },
        )
        .await?;
        wallet_service::adjust_in(
            &txn,
            AdjustParams {
                wallet_id: platform.base.id.value(),
                bucket: BalanceBucket::DoneBalance,
                delta: released_total,
                kind: LedgerEntryKind::Release,
                order_ref: Some(order_ref.clone()),
                dedup_key: Some(wallet_service::order_dedup_key(
                    &order_ref,
                    &platform_ref,
                    LedgerEntryKind::Release,
                    BalanceBucket::DoneBalance,
                )),
                description: format!("Release hold for order {}", order.base.code),
            },
        )
        .await?;

        for store_order in &releasable {
            let store =
                wallet_service::ensure_wallet_in(&txn, WalletKind::Store, &store_order.store_ref)
                    .await
                    .map_err(SettlementError::Internal)?;
            let store_order_ref = store_order.base.id.as_string();
            wallet_service::adjust_in(
                &txn,
                AdjustParams {
                    wallet_id: store.base.id.value(),
                    bucket: BalanceBucket::PendingBalance,
                    delta: -store_order.subtotal,
                    kind: LedgerEntryKind::ReleasePending,
                    order_ref: Some(order_ref.clone()),
                    dedup_key: Some(format!("store_order:{}:release:pending", store_order_ref)),
                    description: format!("Release pending for store order {}", store_order.base.code),
                },
            )
            .await?;
            wallet_service::adjust_in(
                &txn,
                AdjustParams {
                    wallet_id: store.base.id.value(),
                    bucket: BalanceBucket::AvailableBalance,
                    delta: store_order.subtotal,
                    kind: LedgerEntryKind::Release,
                    order_ref: Some(order_ref.clone()),
                    dedup_key: Some(format!("store_order:{}:release:available", store_order_ref)),
                    description: format!(
                        "Funds available after hold for store order {}",
                        store_order.base.code
                    ),
                },
            )
            .await?;
        }
    }

    let expected_version = order.base.metadata.version;
    order.settlement_state = SettlementState::Released;
    order.before_write();
    let updated = repository::update_state_in(&txn, &order, expected_version)
        .await
        .map_err(SettlementError::Internal)?;
    if !updated {
        return Err(SettlementError::Internal(anyhow!(
            "concurrent update of order {} during release",
            order_ref
        )));
    }

    txn.commit()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;
    tracing::info!(order = %order_ref, amount = released_total, "Hold released");
    Ok(true)
}

/// Полный реверс расчёта заказа до высвобождения: удержание платформы и
/// распределения магазинов снимаются, покупатель получает кредит на
/// кошелёк. availableBalance не затрагивается никогда.
pub async fn refund_whole_order(order_id: Uuid) -> Result<f64, SettlementError> {
    let txn = get_connection()
        .begin()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;

    let mut order = load_order(&txn, order_id).await?;
    let order_ref = order.base.id.as_string();

    match order.settlement_state {
        SettlementState::Refunded => return Ok(0.0),
        SettlementState::Held => {}
        SettlementState::None => {
            return Err(SettlementError::InvalidStateTransition(
                "Order settlement is not held; there is nothing to refund".to_string(),
            ));
        }
        SettlementState::Released => {
            return Err(SettlementError::InvalidStateTransition(
                "Order funds are already released; use the return flow instead".to_string(),
            ));
        }
    }

    let store_orders = a003_store_order::repository::list_by_order_in(&txn, &order_ref)
        .await
        .map_err(SettlementError::Internal)?;
    let mut refund_total = 0.0;

    for store_order in &store_orders {
        if store_order.settlement_refunded {
            continue;
        }
        reverse_store_allocation(&txn, store_order, &order_ref).await?;
        refund_total = money::sum([refund_total, store_order.subtotal]);
    }

    if refund_total > 0.0 {
        reverse_platform_hold(&txn, &order_ref, refund_total).await?;
        credit_customer(
            &txn,
            &order.customer_ref,
            refund_total,
            Some(order_ref.clone()),
            format!("order:{}:customer-refund", order_ref),
            format!("Refund for cancelled order {}", order.base.code),
        )
        .await?;
    }

    let expected_version = order.base.metadata.version;
    order.settlement_state = SettlementState::Refunded;
    order.before_write();
    let updated = repository::update_state_in(&txn, &order, expected_version)
        .await
        .map_err(SettlementError::Internal)?;
    if !updated {
        return Err(SettlementError::Internal(anyhow!(
            "concurrent update of order {} during refund",
            order_ref
        )));
    }

    txn.commit()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;
    tracing::info!(order = %order_ref, amount = refund_total, "Whole order refunded");
    Ok(refund_total)
}

/// Реверс расчёта одного подзаказа (отмена до отгрузки, одобренная
/// магазином). Остальные подзаказы заказа не затрагиваются.
pub async fn refund_store_part(store_order_id: Uuid) -> Result<f64, SettlementError> {
    let txn = get_connection()
        .begin()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;

    let mut store_order = a003_store_order::repository::get_by_id_in(&txn, store_order_id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("store order {}", store_order_id)))?;
    if store_order.settlement_refunded {
        return Ok(0.0);
    }

    let order_id = parse_order_id(&store_order.order_ref)?;
    let order = load_order(&txn, order_id).await?;
    let order_ref = order.base.id.as_string();

    match order.settlement_state {
        SettlementState::Held => {}
        SettlementState::None | SettlementState::Refunded => return Ok(0.0),
        SettlementState::Released => {
            return Err(SettlementError::InvalidStateTransition(
                "Order funds are already released; use the return flow instead".to_string(),
            ));
        }
    }

    reverse_store_allocation(&txn, &store_order, &order_ref).await?;
    reverse_platform_hold(&txn, &store_order.base.id.as_string(), store_order.subtotal).await?;
    credit_customer(
        &txn,
        &order.customer_ref,
        store_order.subtotal,
        Some(order_ref.clone()),
        format!("store_order:{}:customer-refund", store_order.base.id.as_string()),
        format!("Refund for cancelled store order {}", store_order.base.code),
    )
    .await?;

    let amount = store_order.subtotal;
    let expected_version = store_order.base.metadata.version;
    store_order.settlement_refunded = true;
    store_order.before_write();
    let updated = a003_store_order::repository::update_state_in(&txn, &store_order, expected_version)
        .await
        .map_err(SettlementError::Internal)?;
    if !updated {
        return Err(SettlementError::Internal(anyhow!(
            "concurrent update of store order {} during refund",
            store_order.base.id.as_string()
        )));
    }

    txn.commit()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;
    tracing::info!(store_order = %store_order.base.id.as_string(), amount, "Store part refunded");
    Ok(amount)
}

/// Возврат по заявке после вручения. Покупатель всегда получает кредит;
/// источник средств зависит от стадии расчёта и виновной стороны:
/// до высвобождения — снятие удержаний, после — availableBalance магазина
/// при вине магазина, иначе doneBalance платформы.
pub async fn refund_for_return(request: &ReturnRequest) -> Result<f64, SettlementError> {
    let item_id = Uuid::parse_str(&request.order_item_ref)
        .map_err(|_| SettlementError::NotFound(format!("order item {}", request.order_item_ref)))?;

    let txn = get_connection()
        .begin()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;

    let item = a004_order_item::repository::get_by_id_in(&txn, item_id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("order item {}", item_id)))?;
    let order_id = parse_order_id(&item.order_ref)?;
    let order = load_order(&txn, order_id).await?;
    let order_ref = order.base.id.as_string();
    let amount = money::round_money(request.amount);
    let return_ref = request.base.id.as_string();

    match order.settlement_state {
        SettlementState::Held => {
            // Средства ещё удержаны: снимаем долю строки с pending обеих сторон
            let store = wallet_service::ensure_wallet_in(&txn, WalletKind::Store, &item.store_ref)
                .await
                .map_err(SettlementError::Internal)?;
            wallet_service::adjust_in(
                &txn,
                AdjustParams {
                    wallet_id: store.base.id.value(),
                    bucket: BalanceBucket::PendingBalance,
                    delta: -amount,
                    kind: LedgerEntryKind::Refund,
                    order_ref: Some(order_ref.clone()),
                    dedup_key: Some(format!("return:{}:store-pending", return_ref)),
                    description: format!("Return {} before release", request.base.code),
                },
            )
            .await?;
            reverse_platform_hold(&txn, &return_ref, amount).await?;
        }
        SettlementState::Released => {
            let platform =
                wallet_service::ensure_wallet_in(&txn, WalletKind::Platform, PLATFORM_OWNER)
                    .await
                    .map_err(SettlementError::Internal)?;
            if request.fault_type == FaultType::Shop {
                // Вина магазина: возврат за счёт его высвобожденных средств
                let store =
                    wallet_service::ensure_wallet_in(&txn, WalletKind::Store, &item.store_ref)
                        .await
                        .map_err(SettlementError::Internal)?;
                wallet_service::adjust_in(
                    &txn,
                    AdjustParams {
                        wallet_id: store.base.id.value(),
                        bucket: BalanceBucket::AvailableBalance,
                        delta: -amount,
                        kind: LedgerEntryKind::Refund,
                        order_ref: Some(order_ref.clone()),
                        dedup_key: Some(format!("return:{}:store-available", return_ref)),
                        description: format!("Return {} charged to store", request.base.code),
                    },
                )
                .await?;
            } else {
                // Платформа абсорбирует возврат из высвобожденных средств
                for (bucket, kind, key) in [
                    (
                        BalanceBucket::DoneBalance,
                        LedgerEntryKind::Refund,
                        format!("return:{}:platform-done", return_ref),
                    ),
                    (
                        BalanceBucket::TotalBalance,
                        LedgerEntryKind::Refund,
                        format!("return:{}:platform-total", return_ref),
                    ),
                ] {
                    wallet_service::adjust_in(
                        &txn,
                        AdjustParams {
                            wallet_id: platform.base.id.value(),
                            bucket,
                            delta: -amount,
                            kind,
                            order_ref: Some(order_ref.clone()),
                            dedup_key: Some(key),
                            description: format!(
                                "Return {} absorbed by platform",
                                request.base.code
                            ),
                        },
                    )
                    .await?;
                }
            }
            wallet_service::adjust_in(
                &txn,
                AdjustParams {
                    wallet_id: platform.base.id.value(),
                    bucket: BalanceBucket::RefundedTotal,
                    delta: amount,
                    kind: LedgerEntryKind::Refund,
                    order_ref: Some(order_ref.clone()),
                    dedup_key: Some(format!("return:{}:platform-refunded", return_ref)),
                    description: format!("Return {} refunded", request.base.code),
                },
            )
            .await?;
        }
        SettlementState::None | SettlementState::Refunded => {
            // Нечего реверсировать: оплата не расчитывалась или уже возвращена
            tracing::warn!(return_request = %return_ref, order = %order_ref,
                state = order.settlement_state.as_str(),
                "Return refund requested with no held funds");
            return Ok(0.0);
        }
    }

    credit_customer(
        &txn,
        &request.customer_ref,
        amount,
        Some(order_ref.clone()),
        format!("return:{}:customer-credit", return_ref),
        format!("Refund for return {}", request.base.code),
    )
    .await?;

    txn.commit()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;
    tracing::info!(return_request = %return_ref, amount, "Return refunded to customer wallet");
    Ok(amount)
}

/// Снять удержание платформы на указанную сумму (реверс шага 2).
/// `scope_ref` делает ключи дедупликации уникальными для вызывающей операции.
async fn reverse_platform_hold<C: ConnectionTrait>(
    db: &C,
    scope_ref: &str,
    amount: f64,
) -> Result<(), SettlementError> {
    let platform = wallet_service::ensure_wallet_in(db, WalletKind::Platform, PLATFORM_OWNER)
        .await
        .map_err(SettlementError::Internal)?;
    for (bucket, delta) in [
        (BalanceBucket::PendingBalance, -amount),
        (BalanceBucket::TotalBalance, -amount),
        (BalanceBucket::RefundedTotal, amount),
    ] {
        wallet_service::adjust_in(
            db,
            AdjustParams {
                wallet_id: platform.base.id.value(),
                bucket,
                delta,
                kind: LedgerEntryKind::Refund,
                order_ref: None,
                dedup_key: Some(format!("refund:{}:platform:{}", scope_ref, bucket.as_str())),
                description: format!("Reverse platform hold ({})", scope_ref),
            },
        )
        .await?;
    }
    Ok(())
}

/// Снять распределение подзаказа с pending-корзины магазина
async fn reverse_store_allocation<C: ConnectionTrait>(
    db: &C,
    store_order: &contracts::domain::a003_store_order::aggregate::StoreOrder,
    order_ref: &str,
) -> Result<(), SettlementError> {
    let store = wallet_service::ensure_wallet_in(db, WalletKind::Store, &store_order.store_ref)
        .await
        .map_err(SettlementError::Internal)?;
    wallet_service::adjust_in(
        db,
        AdjustParams {
            wallet_id: store.base.id.value(),
            bucket: BalanceBucket::PendingBalance,
            delta: -store_order.subtotal,
            kind: LedgerEntryKind::Refund,
            order_ref: Some(order_ref.to_string()),
            dedup_key: Some(format!(
                "store_order:{}:refund:pending",
                store_order.base.id.as_string()
            )),
            description: format!("Reverse allocation for store order {}", store_order.base.code),
        },
    )
    .await?;
    Ok(())
}

/// Кредит на кошелёк покупателя
async fn credit_customer<C: ConnectionTrait>(
    db: &C,
    customer_ref: &str,
    amount: f64,
    order_ref: Option<String>,
    dedup_key: String,
    description: String,
) -> Result<(), SettlementError> {
    let customer = wallet_service::ensure_wallet_in(db, WalletKind::Customer, customer_ref)
        .await
        .map_err(SettlementError::Internal)?;
    wallet_service::adjust_in(
        db,
        AdjustParams {
            wallet_id: customer.base.id.value(),
            bucket: BalanceBucket::Balance,
            delta: amount,
            kind: LedgerEntryKind::Refund,
            order_ref,
            dedup_key: Some(dedup_key),
            description,
        },
    )
    .await?;
    Ok(())
}
