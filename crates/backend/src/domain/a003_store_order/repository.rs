use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use contracts::domain::a003_store_order::aggregate::{
    CancelRequestState, StoreOrder, StoreOrderId, StoreOrderStatus,
};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_store_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub order_ref: String,
    pub store_ref: String,
    pub subtotal: f64,
    pub shipping_fee_estimated: f64,
    pub delivered_at: Option<DateTime<Utc>>,
    pub status: String,
    pub cancel_state: String,
    pub settlement_refunded: bool,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn to_domain(m: Model) -> Result<StoreOrder> {
    let metadata = EntityMetadata {
        created_at: m.created_at.unwrap_or_else(Utc::now),
        updated_at: m.updated_at.unwrap_or_else(Utc::now),
        is_deleted: m.is_deleted,
        is_posted: m.is_posted,
        version: m.version,
    };
    let uuid = Uuid::parse_str(&m.id)?;
    Ok(StoreOrder {
        base: BaseAggregate::with_metadata(
            StoreOrderId(uuid),
            m.code,
            m.description,
            m.comment,
            metadata,
        ),
        order_ref: m.order_ref,
        store_ref: m.store_ref,
        subtotal: m.subtotal,
        shipping_fee_estimated: m.shipping_fee_estimated,
        delivered_at: m.delivered_at,
        status: StoreOrderStatus::parse(&m.status).map_err(|e| anyhow!(e))?,
        cancel_state: CancelRequestState::parse(&m.cancel_state).map_err(|e| anyhow!(e))?,
        settlement_refunded: m.settlement_refunded,
    })
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn get_by_id(id: Uuid) -> Result<Option<StoreOrder>> {
    get_by_id_in(conn(), id).await
}

pub async fn get_by_id_in<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<StoreOrder>> {
    let result = Entity::find_by_id(id.to_string()).one(db).await?;
    result.map(to_domain).transpose()
}

pub async fn list_by_order_in<C: ConnectionTrait>(
    db: &C,
    order_ref: &str,
) -> Result<Vec<StoreOrder>> {
    let models = Entity::find()
        .filter(Column::OrderRef.eq(order_ref))
        .filter(Column::IsDeleted.eq(false))
        .all(db)
        .await?;
    models.into_iter().map(to_domain).collect()
}

pub async fn list_by_order(order_ref: &str) -> Result<Vec<StoreOrder>> {
    list_by_order_in(conn(), order_ref).await
}

pub async fn insert_in<C: ConnectionTrait>(db: &C, store_order: &StoreOrder) -> Result<Uuid> {
    let uuid = store_order.base.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        code: Set(store_order.base.code.clone()),
        description: Set(store_order.base.description.clone()),
        comment: Set(store_order.base.comment.clone()),
        order_ref: Set(store_order.order_ref.clone()),
        store_ref: Set(store_order.store_ref.clone()),
        subtotal: Set(store_order.subtotal),
        shipping_fee_estimated: Set(store_order.shipping_fee_estimated),
        delivered_at: Set(store_order.delivered_at),
        status: Set(store_order.status.as_str().to_string()),
        cancel_state: Set(store_order.cancel_state.as_str().to_string()),
        settlement_refunded: Set(store_order.settlement_refunded),
        is_deleted: Set(store_order.base.metadata.is_deleted),
        is_posted: Set(store_order.base.metadata.is_posted),
        created_at: Set(Some(store_order.base.metadata.created_at)),
        updated_at: Set(Some(store_order.base.metadata.updated_at)),
        version: Set(store_order.base.metadata.version),
    };
    active.insert(db).await?;
    Ok(uuid)
}

/// Обновить состояние подзаказа с optimistic-проверкой версии
pub async fn update_state_in<C: ConnectionTrait>(
    db: &C,
    store_order: &StoreOrder,
    expected_version: i32,
) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::Status, Expr::value(store_order.status.as_str()))
        .col_expr(
            Column::CancelState,
            Expr::value(store_order.cancel_state.as_str()),
        )
        .col_expr(Column::DeliveredAt, Expr::value(store_order.delivered_at))
        .col_expr(
            Column::SettlementRefunded,
            Expr::value(store_order.settlement_refunded),
        )
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(
            Column::Version,
            Expr::value(store_order.base.metadata.version),
        )
        .filter(Column::Id.eq(store_order.base.id.as_string()))
        .filter(Column::Version.eq(expected_version))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
