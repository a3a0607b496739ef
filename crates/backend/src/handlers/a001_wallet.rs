use axum::extract::{Path, Query};
use axum::Json;
use contracts::domain::a001_wallet::aggregate::{WalletKind, WalletSummaryDto};
use contracts::domain::errors::SettlementError;
use contracts::projections::p900_wallet_ledger::dto::{
    LedgerListRequest, LedgerListResponse, LedgerReplayReport,
};
use uuid::Uuid;

use super::{ApiError, ApiResult};
use crate::domain::a001_wallet;
use crate::projections::p900_wallet_ledger;

/// GET /api/wallet/summary/:kind/:owner_ref — сводка по корзинам
pub async fn get_summary(
    Path((kind, owner_ref)): Path<(String, String)>,
) -> ApiResult<WalletSummaryDto> {
    let kind = WalletKind::parse(&kind.to_uppercase())
        .map_err(|e| ApiError(SettlementError::InvalidStateTransition(e)))?;
    let summary = a001_wallet::service::summary(kind, &owner_ref).await?;
    Ok(Json(summary))
}

/// GET /api/wallet/:wallet_ref/ledger — страница проводок с фильтром по виду
pub async fn get_ledger(
    Path(wallet_ref): Path<Uuid>,
    Query(request): Query<LedgerListRequest>,
) -> ApiResult<LedgerListResponse> {
    // Кошелёк должен существовать (404 иначе)
    a001_wallet::service::get_by_id(wallet_ref).await?;
    let page = p900_wallet_ledger::service::list(&wallet_ref.to_string(), &request)
        .await
        .map_err(SettlementError::Internal)?;
    Ok(Json(page))
}

/// GET /api/wallet/:wallet_ref/verify — replay-сверка регистра
pub async fn verify_ledger(Path(wallet_ref): Path<Uuid>) -> ApiResult<LedgerReplayReport> {
    let report = a001_wallet::service::verify_ledger(wallet_ref).await?;
    Ok(Json(report))
}
