use axum::Json;
use contracts::domain::errors::SettlementError;

use super::ApiResult;
use crate::usecases::{u501_payout_eligibility, u502_auto_payout_bills};

/// POST /api/sweeps/eligibility — прогон обхода допуска по требованию
/// (планировщик дергает его же по расписанию)
pub async fn run_eligibility(
) -> ApiResult<u501_payout_eligibility::executor::SweepStats> {
    let stats = u501_payout_eligibility::executor::run()
        .await
        .map_err(SettlementError::Internal)?;
    Ok(Json(stats))
}

/// POST /api/sweeps/auto-bills — прогон автосоздания счетов по требованию
pub async fn run_auto_bills(
) -> ApiResult<u502_auto_payout_bills::executor::AutoBillStats> {
    let stats = u502_auto_payout_bills::executor::run()
        .await
        .map_err(SettlementError::Internal)?;
    Ok(Json(stats))
}
