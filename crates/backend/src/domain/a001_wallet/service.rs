use anyhow::anyhow;
use contracts::domain::a001_wallet::aggregate::{
    BalanceBucket, Wallet, WalletKind, WalletSummaryDto,
};
use contracts::domain::common::AggregateId;
use contracts::domain::errors::SettlementError;
use contracts::projections::p900_wallet_ledger::dto::{
    LedgerEntryKind, LedgerReplayMismatch, LedgerReplayReport, WalletLedgerEntryDto,
};
use sea_orm::{ConnectionTrait, TransactionTrait};
use uuid::Uuid;

use super::repository;
use crate::projections::p900_wallet_ledger::{repository as ledger_repository, service as ledger_service};
use crate::shared::data::db::get_connection;
use crate::shared::money;

/// Параметры атомарной корректировки корзины кошелька
#[derive(Debug, Clone)]
pub struct AdjustParams {
    pub wallet_id: Uuid,
    pub bucket: BalanceBucket,
    pub delta: f64,
    pub kind: LedgerEntryKind,
    pub order_ref: Option<String>,
    /// Ключ дедупликации: при повторе возвращается существующая проводка
    pub dedup_key: Option<String>,
    pub description: String,
}

/// Ключ дедупликации для проводок, порождаемых webhook'ами:
/// одна проводка на (заказ, кошелёк, вид, корзина)
pub fn order_dedup_key(
    order_ref: &str,
    wallet_ref: &str,
    kind: LedgerEntryKind,
    bucket: BalanceBucket,
) -> String {
    format!(
        "order:{}:wallet:{}:{}:{}",
        order_ref,
        wallet_ref,
        kind.as_str(),
        bucket.as_str()
    )
}

/// Кошелёк владельца; создаётся при первом обращении
pub async fn ensure_wallet_in<C: ConnectionTrait>(
    db: &C,
    kind: WalletKind,
    owner_ref: &str,
) -> anyhow::Result<Wallet> {
    if let Some(wallet) = repository::get_by_owner_in(db, kind, owner_ref).await? {
        return Ok(wallet);
    }
    let wallet = Wallet::new_for_insert(kind, owner_ref.to_string());
    repository::insert_in(db, &wallet).await?;
    Ok(wallet)
}

/// Корректировка корзины и append проводки в переданной транзакции.
///
/// Проверки: кошелёк существует, не LOCKED, корзина не уходит в минус.
/// Обновление кошелька идёт через optimistic CAS по version.
pub async fn adjust_in<C: ConnectionTrait>(
    db: &C,
    params: AdjustParams,
) -> Result<WalletLedgerEntryDto, SettlementError> {
    // Дедупликация до каких-либо изменений
    if let Some(key) = &params.dedup_key {
        if let Some(existing) = ledger_repository::find_by_dedup_key(db, key)
            .await
            .map_err(SettlementError::Internal)?
        {
            tracing::debug!(dedup_key = %key, "Duplicate ledger write suppressed");
            return Ok(ledger_service::to_dto(&existing));
        }
    }

    let mut wallet = repository::get_by_id_in(db, params.wallet_id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("wallet {}", params.wallet_id)))?;

    if wallet.status == contracts::domain::a001_wallet::aggregate::WalletStatus::Locked {
        return Err(SettlementError::WalletLocked(wallet.base.id.as_string()));
    }

    let current = wallet.bucket_value(params.bucket);
    let new_value = money::sum([current, params.delta]);
    if new_value < 0.0 && !money::money_eq(new_value, 0.0) {
        return Err(SettlementError::InsufficientFunds {
            wallet: wallet.base.id.as_string(),
            bucket: params.bucket.as_str().to_string(),
            requested: money::round_money(-params.delta),
            available: current,
        });
    }

    let expected_version = wallet.base.metadata.version;
    wallet.set_bucket_value(params.bucket, new_value);
    wallet.before_write();

    let updated = repository::update_balances_in(db, &wallet, expected_version)
        .await
        .map_err(SettlementError::Internal)?;
    if !updated {
        return Err(SettlementError::Internal(anyhow!(
            "concurrent update of wallet {}, adjustment not applied",
            wallet.base.id.as_string()
        )));
    }

    let entry = ledger_repository::insert_in(
        db,
        ledger_repository::NewLedgerEntry {
            wallet_ref: wallet.base.id.as_string(),
            wallet_kind: wallet.kind.as_str().to_string(),
            bucket: Some(params.bucket.as_str().to_string()),
            amount: money::round_money(params.delta),
            kind: params.kind.as_str().to_string(),
            order_ref: params.order_ref.clone(),
            dedup_key: params.dedup_key.clone(),
            balance_after: new_value,
            description: params.description.clone(),
        },
    )
    .await
    .map_err(SettlementError::Internal)?;

    Ok(ledger_service::to_dto(&entry))
}

/// Корректировка в собственной транзакции (корзина + проводка атомарно)
pub async fn adjust(params: AdjustParams) -> Result<WalletLedgerEntryDto, SettlementError> {
    let txn = get_connection()
        .begin()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;
    let dto = adjust_in(&txn, params).await?;
    txn.commit()
        .await
        .map_err(|e| SettlementError::Internal(e.into()))?;
    Ok(dto)
}

/// Информационная проводка без влияния на корзины (bucket = NULL).
/// Используется для фиксации оплат, прошедших вне кошелька (шлюз).
pub async fn record_informational_in<C: ConnectionTrait>(
    db: &C,
    wallet: &Wallet,
    kind: LedgerEntryKind,
    order_ref: Option<String>,
    dedup_key: Option<String>,
    amount: f64,
    description: String,
) -> Result<WalletLedgerEntryDto, SettlementError> {
    if let Some(key) = &dedup_key {
        if let Some(existing) = ledger_repository::find_by_dedup_key(db, key)
            .await
            .map_err(SettlementError::Internal)?
        {
            return Ok(ledger_service::to_dto(&existing));
        }
    }
    let entry = ledger_repository::insert_in(
        db,
        ledger_repository::NewLedgerEntry {
            wallet_ref: wallet.base.id.as_string(),
            wallet_kind: wallet.kind.as_str().to_string(),
            bucket: None,
            amount: money::round_money(amount),
            kind: kind.as_str().to_string(),
            order_ref,
            dedup_key,
            balance_after: wallet.balance,
            description,
        },
    )
    .await
    .map_err(SettlementError::Internal)?;
    Ok(ledger_service::to_dto(&entry))
}

/// Сводка по корзинам кошелька владельца
pub async fn summary(
    kind: WalletKind,
    owner_ref: &str,
) -> Result<WalletSummaryDto, SettlementError> {
    let wallet = repository::get_by_owner_in(get_connection(), kind, owner_ref)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| {
            SettlementError::NotFound(format!("{} wallet for {}", kind.as_str(), owner_ref))
        })?;
    Ok(WalletSummaryDto::from(&wallet))
}

pub async fn get_by_id(id: Uuid) -> Result<Wallet, SettlementError> {
    repository::get_by_id(id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("wallet {}", id)))
}

/// Replay-сверка: свёртка регистра против хранимых корзин.
///
/// Информационные записи исключаются; расхождение любой корзины попадает
/// в отчёт. Пустой список mismatches == регистр воспроизводит баланс.
pub async fn verify_ledger(wallet_id: Uuid) -> Result<LedgerReplayReport, SettlementError> {
    let wallet = get_by_id(wallet_id).await?;
    let wallet_ref = wallet.base.id.as_string();
    let (folded, entries_replayed) = ledger_service::replay_buckets(&wallet_ref)
        .await
        .map_err(SettlementError::Internal)?;

    let buckets = [
        BalanceBucket::Balance,
        BalanceBucket::PendingBalance,
        BalanceBucket::AvailableBalance,
        BalanceBucket::DepositBalance,
        BalanceBucket::TotalRevenue,
        BalanceBucket::TotalBalance,
        BalanceBucket::DoneBalance,
        BalanceBucket::ReceivedTotal,
        BalanceBucket::RefundedTotal,
    ];

    let mut mismatches = Vec::new();
    for bucket in buckets {
        let stored = wallet.bucket_value(bucket);
        let replayed = folded
            .iter()
            .find(|(name, _)| name == bucket.as_str())
            .map(|(_, value)| *value)
            .unwrap_or(0.0);
        if !money::money_eq(stored, replayed) {
            mismatches.push(LedgerReplayMismatch {
                bucket: bucket.as_str().to_string(),
                replayed,
                stored,
            });
        }
    }

    if !mismatches.is_empty() {
        tracing::error!(
            wallet = %wallet_ref,
            ?mismatches,
            "Wallet ledger replay diverged from stored balances"
        );
    }

    Ok(LedgerReplayReport {
        wallet_ref,
        mismatches,
        entries_replayed,
    })
}
