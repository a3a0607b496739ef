//! Обход допуска к выплате (u501).
//!
//! Три идемпотентных прохода: бэкофилл delivered_at с родительской
//! отгрузки, продвижение eligible_for_payout после окна удержания,
//! пометка is_returned по завершённым возвратам. После продвижения
//! заказы, у которых все строки допущены или возвращены, высвобождаются
//! (единственный авторитетный триггер release_after_hold).
//!
//! Ошибка по одной строке логируется и не прерывает обход; строка
//! будет обработана следующим прогоном.

use anyhow::Result;
use chrono::Utc;
use contracts::domain::a002_order::aggregate::SettlementState;
use contracts::domain::common::AggregateId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::a002_order::{self, settlement};
use crate::domain::{a003_store_order, a004_order_item, a005_return_request};
use crate::shared::config;

/// Итоги одного прогона обхода
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepStats {
    pub backfilled: usize,
    pub checked: usize,
    pub promoted: usize,
    pub blocked_by_return: usize,
    #[serde(rename = "returnedFlagged")]
    pub returned_flagged: usize,
    #[serde(rename = "releasedOrders")]
    pub released_orders: usize,
    pub failed: usize,
}

pub async fn run() -> Result<SweepStats> {
    let hold_days = config::settlement_config().hold_days;
    let now = Utc::now();
    let mut stats = SweepStats::default();

    backfill_delivered_at(&mut stats).await?;
    promote_eligibility(hold_days, now, &mut stats).await?;
    flag_returned_items(&mut stats).await?;

    tracing::info!(?stats, "Payout eligibility sweep finished");
    Ok(stats)
}

/// Проход 1: поздние подтверждения вручения — перенос delivered_at
/// с подзаказа на строки, где он ещё пуст
async fn backfill_delivered_at(stats: &mut SweepStats) -> Result<()> {
    let candidates = a004_order_item::repository::list_pending_eligibility().await?;
    for item in candidates.iter().filter(|i| i.delivered_at.is_none()) {
        let item_ref = item.base.id.as_string();
        let result: Result<bool> = async {
            let store_order_id = Uuid::parse_str(&item.store_order_ref)?;
            let Some(store_order) =
                a003_store_order::repository::get_by_id(store_order_id).await?
            else {
                return Ok(false);
            };
            let Some(delivered_at) = store_order.delivered_at else {
                return Ok(false);
            };
            a004_order_item::repository::set_delivered_at(item.base.id.value(), delivered_at)
                .await
        }
        .await;
        match result {
            Ok(true) => stats.backfilled += 1,
            Ok(false) => {}
            Err(e) => {
                stats.failed += 1;
                tracing::error!(item = %item_ref, error = %e,
                    "Delivered-at backfill failed for item, continuing sweep");
            }
        }
    }
    Ok(())
}

/// Проход 2: продвижение флага допуска после окна удержания,
/// если по строке нет блокирующей заявки на возврат
async fn promote_eligibility(
    hold_days: i64,
    now: chrono::DateTime<Utc>,
    stats: &mut SweepStats,
) -> Result<()> {
    let candidates = a004_order_item::repository::list_pending_eligibility().await?;
    stats.checked = candidates.len();
    let mut touched_orders: Vec<String> = Vec::new();

    for item in candidates {
        let item_ref = item.base.id.as_string();
        let Some(delivered_at) = item.delivered_at else {
            continue; // ещё не вручено
        };
        if !a004_order_item::service::is_past_hold_window(delivered_at, hold_days, now) {
            continue; // окно удержания не истекло
        }

        let result: Result<bool> = async {
            if let Some(request) =
                a005_return_request::repository::latest_for_item(&item_ref).await?
            {
                if request.status.blocks_payout() {
                    return Ok(false);
                }
            }
            let fee = crate::shared::money::platform_fee_amount(
                item.gross_line_total,
                item.platform_fee_percentage,
            );
            a004_order_item::repository::mark_eligible(
                item.base.id.value(),
                item.base.metadata.version,
                fee,
            )
            .await
        }
        .await;

        match result {
            Ok(true) => {
                stats.promoted += 1;
                if !touched_orders.contains(&item.order_ref) {
                    touched_orders.push(item.order_ref.clone());
                }
            }
            Ok(false) => stats.blocked_by_return += 1,
            Err(e) => {
                stats.failed += 1;
                tracing::error!(item = %item_ref, error = %e,
                    "Eligibility promotion failed for item, continuing sweep");
            }
        }
    }

    // Высвобождение заказов, у которых не осталось строк в ожидании
    for order_ref in touched_orders {
        match try_release_order(&order_ref).await {
            Ok(true) => stats.released_orders += 1,
            Ok(false) => {}
            Err(e) => {
                stats.failed += 1;
                tracing::error!(order = %order_ref, error = %e,
                    "Order release failed, continuing sweep");
            }
        }
    }
    Ok(())
}

/// Высвободить заказ, если все его строки допущены или возвращены
async fn try_release_order(order_ref: &str) -> Result<bool> {
    let order_id = Uuid::parse_str(order_ref)?;
    let Some(order) = a002_order::repository::get_by_id(order_id).await? else {
        return Ok(false);
    };
    if order.settlement_state != SettlementState::Held {
        return Ok(false);
    }
    let items = a004_order_item::repository::list_by_order(order_ref).await?;
    if items
        .iter()
        .any(|i| !i.eligible_for_payout && !i.is_returned)
    {
        return Ok(false);
    }
    let released = settlement::release_after_hold(order_id).await?;
    Ok(released)
}

/// Проход 3: строки завершённых возвратов навсегда исключаются из
/// агрегации выплат (is_returned монотонен)
async fn flag_returned_items(stats: &mut SweepStats) -> Result<()> {
    let refunded = a005_return_request::repository::list_refunded().await?;
    for request in refunded {
        let item_ref = request.order_item_ref.clone();
        let result: Result<bool> = async {
            let item_id = Uuid::parse_str(&item_ref)?;
            let Some(item) = a004_order_item::repository::get_by_id(item_id).await? else {
                return Ok(false);
            };
            if item.is_returned {
                return Ok(false); // уже помечена — повторный прогон
            }
            a004_order_item::repository::mark_returned_in(
                crate::shared::data::db::get_connection(),
                item.base.id.value(),
                item.base.metadata.version,
            )
            .await
        }
        .await;
        match result {
            Ok(true) => stats.returned_flagged += 1,
            Ok(false) => {}
            Err(e) => {
                stats.failed += 1;
                tracing::error!(item = %item_ref, error = %e,
                    "Return flagging failed for item, continuing sweep");
            }
        }
    }
    Ok(())
}
