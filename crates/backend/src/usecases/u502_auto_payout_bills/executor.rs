//! Автосоздание счетов на выплату (u502).
//!
//! Обходит магазины с невыставленными позициями и вызывает
//! get_or_create: открытый счёт переиспользуется, дубликаты не создаются.
//! Сбой по одному магазину не прерывает остальных.

use anyhow::Result;
use contracts::domain::errors::SettlementError;
use serde::{Deserialize, Serialize};

use crate::domain::{a004_order_item, a006_payout_bill, a007_shipping_fee, a008_return_shipping_fee};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoBillStats {
    #[serde(rename = "storesChecked")]
    pub stores_checked: usize,
    #[serde(rename = "billsCreated")]
    pub bills_created: usize,
    #[serde(rename = "billsReused")]
    pub bills_reused: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub async fn run() -> Result<AutoBillStats> {
    let mut stores = a004_order_item::repository::distinct_stores_with_candidates().await?;
    for store in a007_shipping_fee::repository::distinct_stores_with_unbilled().await? {
        if !stores.contains(&store) {
            stores.push(store);
        }
    }
    for store in a008_return_shipping_fee::repository::distinct_stores_with_unbilled().await? {
        if !stores.contains(&store) {
            stores.push(store);
        }
    }

    let mut stats = AutoBillStats {
        stores_checked: stores.len(),
        ..Default::default()
    };

    for store_ref in stores {
        let existing =
            a006_payout_bill::repository::find_pending_by_store_in(
                crate::shared::data::db::get_connection(),
                &store_ref,
            )
            .await;
        let had_pending = matches!(existing, Ok(Some(_)));

        match a006_payout_bill::service::get_or_create_bill_for_store(&store_ref).await {
            Ok(_) if had_pending => stats.bills_reused += 1,
            Ok(_) => stats.bills_created += 1,
            Err(SettlementError::NothingToPayout(_)) => stats.skipped += 1,
            Err(e) => {
                stats.failed += 1;
                tracing::error!(store = %store_ref, error = %e,
                    "Auto bill creation failed for store, continuing");
            }
        }
    }

    tracing::info!(?stats, "Auto payout bill sweep finished");
    Ok(stats)
}
