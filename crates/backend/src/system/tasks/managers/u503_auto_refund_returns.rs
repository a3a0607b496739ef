use anyhow::Result;
use async_trait::async_trait;
use contracts::system::tasks::aggregate::ScheduledTask;
use std::sync::Arc;

use crate::system::tasks::logger::TaskLogger;
use crate::system::tasks::manager::TaskManager;
use crate::usecases::u503_auto_refund_returns::executor;

pub const TASK_TYPE: &str = "u503_auto_refund_returns";

/// Менеджер автоворзвратов по молчанию магазина (u503)
pub struct U503AutoRefundReturnsManager;

#[async_trait]
impl TaskManager for U503AutoRefundReturnsManager {
    fn task_type(&self) -> &'static str {
        TASK_TYPE
    }

    async fn run(
        &self,
        _task: &ScheduledTask,
        session_id: &str,
        logger: Arc<TaskLogger>,
    ) -> Result<()> {
        logger.write_log(session_id, "Starting auto-refund sweep...")?;
        let stats = executor::run().await?;
        logger.write_log(
            session_id,
            &format!(
                "Auto-refund sweep done: disputes={} complaints={} refunded={} failed={}",
                stats.disputes_checked, stats.complaints_checked, stats.refunded, stats.failed
            ),
        )?;
        Ok(())
    }
}
