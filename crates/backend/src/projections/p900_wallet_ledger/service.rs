use anyhow::Result;
use contracts::projections::p900_wallet_ledger::dto::{
    LedgerListRequest, LedgerListResponse, WalletLedgerEntryDto,
};

use super::repository::{self, Model};
use crate::shared::money;

pub fn to_dto(m: &Model) -> WalletLedgerEntryDto {
    WalletLedgerEntryDto {
        id: m.id.clone(),
        wallet_ref: m.wallet_ref.clone(),
        wallet_kind: m.wallet_kind.clone(),
        bucket: m.bucket.clone(),
        amount: m.amount,
        kind: m.kind.clone(),
        order_ref: m.order_ref.clone(),
        balance_after: m.balance_after,
        description: m.description.clone(),
        created_at: m.created_at.to_rfc3339(),
    }
}

/// Страница проводок кошелька
pub async fn list(wallet_ref: &str, request: &LedgerListRequest) -> Result<LedgerListResponse> {
    let (models, total) = repository::list_page(
        wallet_ref,
        request.kind.as_deref(),
        request.limit,
        request.offset,
    )
    .await?;
    let has_more = request.offset + (models.len() as u64) < total;
    Ok(LedgerListResponse {
        items: models.iter().map(to_dto).collect(),
        total_count: total,
        has_more,
    })
}

/// Свернуть регистр кошелька: корзина -> восстановленное значение.
///
/// Информационные записи (bucket IS NULL) в свёртку не входят: они не
/// меняли баланс при создании.
pub async fn replay_buckets(wallet_ref: &str) -> Result<(Vec<(String, f64)>, usize)> {
    let entries = repository::list_for_wallet(wallet_ref).await?;
    let mut folded: Vec<(String, f64)> = Vec::new();
    for entry in &entries {
        let Some(bucket) = &entry.bucket else {
            continue;
        };
        match folded.iter_mut().find(|(name, _)| name == bucket) {
            Some((_, value)) => *value = money::sum([*value, entry.amount]),
            None => folded.push((bucket.clone(), money::round_money(entry.amount))),
        }
    }
    Ok((folded, entries.len()))
}
