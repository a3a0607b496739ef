use anyhow::Result;
use async_trait::async_trait;
use contracts::system::tasks::aggregate::ScheduledTask;
use std::sync::Arc;

use super::logger::TaskLogger;

/// Исполнитель регламентного задания одного типа
#[async_trait]
pub trait TaskManager: Send + Sync {
    /// Ключ типа задания (совпадает с task_type в sys_tasks)
    fn task_type(&self) -> &'static str;

    /// Выполнить задание; session_id идентифицирует конкретный запуск
    async fn run(
        &self,
        task: &ScheduledTask,
        session_id: &str,
        logger: Arc<TaskLogger>,
    ) -> Result<()>;
}
