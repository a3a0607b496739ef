use anyhow::Result;
use async_trait::async_trait;
use contracts::system::tasks::aggregate::ScheduledTask;
use std::sync::Arc;

use crate::system::tasks::logger::TaskLogger;
use crate::system::tasks::manager::TaskManager;
use crate::usecases::u501_payout_eligibility::executor;

pub const TASK_TYPE: &str = "u501_payout_eligibility";

/// Менеджер обхода допуска к выплате (u501)
pub struct U501PayoutEligibilityManager;

#[async_trait]
impl TaskManager for U501PayoutEligibilityManager {
    fn task_type(&self) -> &'static str {
        TASK_TYPE
    }

    async fn run(
        &self,
        _task: &ScheduledTask,
        session_id: &str,
        logger: Arc<TaskLogger>,
    ) -> Result<()> {
        logger.write_log(session_id, "Starting payout eligibility sweep...")?;
        let stats = executor::run().await?;
        logger.write_log(
            session_id,
            &format!(
                "Eligibility sweep done: checked={} promoted={} blocked={} released_orders={} returned={} backfilled={} failed={}",
                stats.checked,
                stats.promoted,
                stats.blocked_by_return,
                stats.released_orders,
                stats.returned_flagged,
                stats.backfilled,
                stats.failed
            ),
        )?;
        Ok(())
    }
}
