use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use contracts::domain::a005_return_request::aggregate::{
    FaultType, ReturnRequest, ReturnRequestId, ReturnStatus,
};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a005_return_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub order_item_ref: String,
    pub customer_ref: String,
    pub store_ref: String,
    pub amount: f64,
    pub status: String,
    pub fault_type: String,
    pub auto_refund_executed: bool,
    pub opened_at: Option<DateTime<Utc>>,
    pub dispute_opened_at: Option<DateTime<Utc>>,
    pub shop_responded_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn to_domain(m: Model) -> Result<ReturnRequest> {
    let metadata = EntityMetadata {
        created_at: m.created_at.unwrap_or_else(Utc::now),
        updated_at: m.updated_at.unwrap_or_else(Utc::now),
        is_deleted: m.is_deleted,
        is_posted: m.is_posted,
        version: m.version,
    };
    let uuid = Uuid::parse_str(&m.id)?;
    let status = ReturnStatus::parse(&m.status).map_err(|e| anyhow!(e))?;
    let fault_type = FaultType::parse(&m.fault_type).map_err(|e| anyhow!(e))?;
    let opened_at = m.opened_at.unwrap_or(metadata.created_at);
    Ok(ReturnRequest {
        base: BaseAggregate::with_metadata(
            ReturnRequestId(uuid),
            m.code,
            m.description,
            m.comment,
            metadata,
        ),
        order_item_ref: m.order_item_ref,
        customer_ref: m.customer_ref,
        store_ref: m.store_ref,
        amount: m.amount,
        status,
        fault_type,
        auto_refund_executed: m.auto_refund_executed,
        opened_at,
        dispute_opened_at: m.dispute_opened_at,
        shop_responded_at: m.shop_responded_at,
        closed_at: m.closed_at,
    })
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn get_by_id(id: Uuid) -> Result<Option<ReturnRequest>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    result.map(to_domain).transpose()
}

pub async fn insert(request: &ReturnRequest) -> Result<Uuid> {
    let uuid = request.base.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        code: Set(request.base.code.clone()),
        description: Set(request.base.description.clone()),
        comment: Set(request.base.comment.clone()),
        order_item_ref: Set(request.order_item_ref.clone()),
        customer_ref: Set(request.customer_ref.clone()),
        store_ref: Set(request.store_ref.clone()),
        amount: Set(request.amount),
        status: Set(request.status.as_str().to_string()),
        fault_type: Set(request.fault_type.as_str().to_string()),
        auto_refund_executed: Set(request.auto_refund_executed),
        opened_at: Set(Some(request.opened_at)),
        dispute_opened_at: Set(request.dispute_opened_at),
        shop_responded_at: Set(request.shop_responded_at),
        closed_at: Set(request.closed_at),
        is_deleted: Set(request.base.metadata.is_deleted),
        is_posted: Set(request.base.metadata.is_posted),
        created_at: Set(Some(request.base.metadata.created_at)),
        updated_at: Set(Some(request.base.metadata.updated_at)),
        version: Set(request.base.metadata.version),
    };
    active.insert(conn()).await?;
    Ok(uuid)
}

/// Последняя (по времени открытия) заявка на возврат по строке заказа
pub async fn latest_for_item(order_item_ref: &str) -> Result<Option<ReturnRequest>> {
    let result = Entity::find()
        .filter(Column::OrderItemRef.eq(order_item_ref))
        .filter(Column::IsDeleted.eq(false))
        .order_by_desc(Column::OpenedAt)
        .order_by_desc(Column::Id)
        .one(conn())
        .await?;
    result.map(to_domain).transpose()
}

/// Заявки по строке, возврат по которым состоялся (для u501, обход 2)
pub async fn list_refunded() -> Result<Vec<ReturnRequest>> {
    let models = Entity::find()
        .filter(
            Column::Status.is_in([
                ReturnStatus::Refunded.as_str(),
                ReturnStatus::AutoRefunded.as_str(),
            ]),
        )
        .filter(Column::IsDeleted.eq(false))
        .all(conn())
        .await?;
    models.into_iter().map(to_domain).collect()
}

/// Споры без ответа магазина, открытые раньше cutoff (таймер 3 дня)
pub async fn list_unanswered_disputes(cutoff: DateTime<Utc>) -> Result<Vec<ReturnRequest>> {
    let models = Entity::find()
        .filter(Column::Status.eq(ReturnStatus::Dispute.as_str()))
        .filter(Column::AutoRefundExecuted.eq(false))
        .filter(Column::DisputeOpenedAt.lte(cutoff))
        .filter(Column::IsDeleted.eq(false))
        .all(conn())
        .await?;
    models.into_iter().map(to_domain).collect()
}

/// Открытые жалобы без реакции магазина, старше cutoff (таймер 2 дня)
pub async fn list_unanswered_complaints(cutoff: DateTime<Utc>) -> Result<Vec<ReturnRequest>> {
    let models = Entity::find()
        .filter(Column::Status.eq(ReturnStatus::Pending.as_str()))
        .filter(Column::AutoRefundExecuted.eq(false))
        .filter(Column::ShopRespondedAt.is_null())
        .filter(Column::OpenedAt.lte(cutoff))
        .filter(Column::IsDeleted.eq(false))
        .all(conn())
        .await?;
    models.into_iter().map(to_domain).collect()
}

/// Обновить состояние заявки с optimistic-проверкой версии
pub async fn update_state(
    request: &ReturnRequest,
    expected_version: i32,
) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::Status, Expr::value(request.status.as_str()))
        .col_expr(Column::FaultType, Expr::value(request.fault_type.as_str()))
        .col_expr(
            Column::AutoRefundExecuted,
            Expr::value(request.auto_refund_executed),
        )
        .col_expr(
            Column::DisputeOpenedAt,
            Expr::value(request.dispute_opened_at),
        )
        .col_expr(
            Column::ShopRespondedAt,
            Expr::value(request.shop_responded_at),
        )
        .col_expr(Column::ClosedAt, Expr::value(request.closed_at))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(Column::Version, Expr::value(request.base.metadata.version))
        .filter(Column::Id.eq(request.base.id.as_string()))
        .filter(Column::Version.eq(expected_version))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}
