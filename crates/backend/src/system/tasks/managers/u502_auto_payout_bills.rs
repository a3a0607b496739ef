use anyhow::Result;
use async_trait::async_trait;
use contracts::system::tasks::aggregate::ScheduledTask;
use std::sync::Arc;

use crate::system::tasks::logger::TaskLogger;
use crate::system::tasks::manager::TaskManager;
use crate::usecases::u502_auto_payout_bills::executor;

pub const TASK_TYPE: &str = "u502_auto_payout_bills";

/// Менеджер автосоздания счетов на выплату (u502)
pub struct U502AutoPayoutBillsManager;

#[async_trait]
impl TaskManager for U502AutoPayoutBillsManager {
    fn task_type(&self) -> &'static str {
        TASK_TYPE
    }

    async fn run(
        &self,
        _task: &ScheduledTask,
        session_id: &str,
        logger: Arc<TaskLogger>,
    ) -> Result<()> {
        logger.write_log(session_id, "Starting auto payout bill sweep...")?;
        let stats = executor::run().await?;
        logger.write_log(
            session_id,
            &format!(
                "Auto bill sweep done: stores={} created={} reused={} skipped={} failed={}",
                stats.stores_checked,
                stats.bills_created,
                stats.bills_reused,
                stats.skipped,
                stats.failed
            ),
        )?;
        Ok(())
    }
}
