use anyhow::{anyhow, Result};
use chrono::Utc;
use contracts::domain::a002_order::aggregate::{Order, OrderId, OrderStatus, SettlementState};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub customer_ref: String,
    pub total_amount: f64,
    pub status: String,
    pub settlement_state: String,
    pub paid_at: Option<chrono::DateTime<chrono::Utc>>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn to_domain(m: Model) -> Result<Order> {
    let metadata = EntityMetadata {
        created_at: m.created_at.unwrap_or_else(Utc::now),
        updated_at: m.updated_at.unwrap_or_else(Utc::now),
        is_deleted: m.is_deleted,
        is_posted: m.is_posted,
        version: m.version,
    };
    let uuid = Uuid::parse_str(&m.id)?;
    Ok(Order {
        base: BaseAggregate::with_metadata(
            OrderId(uuid),
            m.code,
            m.description,
            m.comment,
            metadata,
        ),
        customer_ref: m.customer_ref,
        total_amount: m.total_amount,
        status: OrderStatus::parse(&m.status).map_err(|e| anyhow!(e))?,
        settlement_state: SettlementState::parse(&m.settlement_state).map_err(|e| anyhow!(e))?,
        paid_at: m.paid_at,
    })
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn get_by_id(id: Uuid) -> Result<Option<Order>> {
    get_by_id_in(conn(), id).await
}

pub async fn get_by_id_in<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Order>> {
    let result = Entity::find_by_id(id.to_string()).one(db).await?;
    result.map(to_domain).transpose()
}

pub async fn insert_in<C: ConnectionTrait>(db: &C, order: &Order) -> Result<Uuid> {
    let uuid = order.base.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        code: Set(order.base.code.clone()),
        description: Set(order.base.description.clone()),
        comment: Set(order.base.comment.clone()),
        customer_ref: Set(order.customer_ref.clone()),
        total_amount: Set(order.total_amount),
        status: Set(order.status.as_str().to_string()),
        settlement_state: Set(order.settlement_state.as_str().to_string()),
        paid_at: Set(order.paid_at),
        is_deleted: Set(order.base.metadata.is_deleted),
        is_posted: Set(order.base.metadata.is_posted),
        created_at: Set(Some(order.base.metadata.created_at)),
        updated_at: Set(Some(order.base.metadata.updated_at)),
        version: Set(order.base.metadata.version),
    };
    active.insert(db).await?;
    Ok(uuid)
}

/// Обновить статусы заказа с optimistic-проверкой версии
pub async fn update_state_in<C: ConnectionTrait>(
    db: &C,
    order: &Order,
    expected_version: i32,
) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::Status, Expr::value(order.status.as_str()))
        .col_expr(
            Column::SettlementState,
            Expr::value(order.settlement_state.as_str()),
        )
        .col_expr(Column::PaidAt, Expr::value(order.paid_at))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(Column::Version, Expr::value(order.base.metadata.version))
        .filter(Column::Id.eq(order.base.id.as_string()))
        .filter(Column::Version.eq(expected_version))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
