//! Автовозврат по молчанию магазина (u503).
//!
//! Споры без ответа 3 дня и открытые жалобы без реакции 2 дня
//! закрываются в AUTO_REFUNDED с кредитом покупателю ровно один раз
//! (флаг auto_refund_executed + ключи дедупликации проводок).

use anyhow::Result;

use crate::domain::a005_return_request::service::{self, AutoRefundStats};

pub async fn run() -> Result<AutoRefundStats> {
    let stats = service::auto_refund_unresponsive().await?;
    Ok(stats)
}
