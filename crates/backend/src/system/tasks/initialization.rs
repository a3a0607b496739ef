use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use super::logger::TaskLogger;
use super::managers;
use super::registry::TaskManagerRegistry;
use super::service;
use super::worker::ScheduledTaskWorker;

/// Интервал опроса планировщика, секунд
const WORKER_INTERVAL_SECONDS: u64 = 60;

/// Регистрация трёх регламентных обходов расчётного контура.
/// Повторный запуск ничего не дублирует.
pub async fn seed_default_tasks() -> Result<()> {
    service::ensure_task(
        "u501_payout_eligibility",
        "Допуск строк к выплате после окна удержания",
        managers::u501_payout_eligibility::TASK_TYPE,
        // каждые 30 минут
        "0 */30 * * * *",
    )
    .await?;
    service::ensure_task(
        "u502_auto_payout_bills",
        "Автосоздание счетов на выплату магазинам",
        managers::u502_auto_payout_bills::TASK_TYPE,
        // раз в час
        "0 0 * * * *",
    )
    .await?;
    service::ensure_task(
        "u503_auto_refund_returns",
        "Автовозврат по неотвеченным спорам и жалобам",
        managers::u503_auto_refund_returns::TASK_TYPE,
        // раз в час со сдвигом
        "0 15 * * * *",
    )
    .await?;
    Ok(())
}

/// Собрать реестр менеджеров и запустить фоновый воркер
pub fn spawn_task_worker(log_dir: PathBuf) -> Result<()> {
    let mut registry = TaskManagerRegistry::new();
    registry.register(managers::u501_payout_eligibility::U501PayoutEligibilityManager);
    registry.register(managers::u502_auto_payout_bills::U502AutoPayoutBillsManager);
    registry.register(managers::u503_auto_refund_returns::U503AutoRefundReturnsManager);

    let logger = Arc::new(TaskLogger::new(log_dir)?);
    let worker = ScheduledTaskWorker::new(Arc::new(registry), logger, WORKER_INTERVAL_SECONDS);

    tokio::spawn(async move {
        worker.run_loop().await;
    });
    Ok(())
}
