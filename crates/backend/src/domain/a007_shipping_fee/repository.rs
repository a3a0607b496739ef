use anyhow::Result;
use chrono::Utc;
use contracts::domain::a007_shipping_fee::aggregate::{ShippingFee, ShippingFeeId};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a007_shipping_fee")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub store_order_ref: String,
    pub store_ref: String,
    pub estimated_fee: f64,
    pub actual_fee: f64,
    pub extra_for_store: f64,
    pub paid_by_shop: bool,
    pub payout_bill_ref: Option<String>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<Utc>>,
    pub updated_at: Option<chrono::DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn to_domain(m: Model) -> Result<ShippingFee> {
    let metadata = EntityMetadata {
        created_at: m.created_at.unwrap_or_else(Utc::now),
        updated_at: m.updated_at.unwrap_or_else(Utc::now),
        is_deleted: m.is_deleted,
        is_posted: m.is_posted,
        version: m.version,
    };
    let uuid = Uuid::parse_str(&m.id)?;
    Ok(ShippingFee {
        base: BaseAggregate::with_metadata(
            ShippingFeeId(uuid),
            m.code,
            m.description,
            m.comment,
            metadata,
        ),
        store_order_ref: m.store_order_ref,
        store_ref: m.store_ref,
        estimated_fee: m.estimated_fee,
        actual_fee: m.actual_fee,
        extra_for_store: m.extra_for_store,
        paid_by_shop: m.paid_by_shop,
        payout_bill_ref: m.payout_bill_ref,
    })
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn insert(fee: &ShippingFee) -> Result<Uuid> {
    let uuid = fee.base.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        code: Set(fee.base.code.clone()),
        description: Set(fee.base.description.clone()),
        comment: Set(fee.base.comment.clone()),
        store_order_ref: Set(fee.store_order_ref.clone()),
        store_ref: Set(fee.store_ref.clone()),
        estimated_fee: Set(fee.estimated_fee),
        actual_fee: Set(fee.actual_fee),
        extra_for_store: Set(fee.extra_for_store),
        paid_by_shop: Set(fee.paid_by_shop),
        payout_bill_ref: Set(fee.payout_bill_ref.clone()),
        is_deleted: Set(fee.base.metadata.is_deleted),
        is_posted: Set(fee.base.metadata.is_posted),
        created_at: Set(Some(fee.base.metadata.created_at)),
        updated_at: Set(Some(fee.base.metadata.updated_at)),
        version: Set(fee.base.metadata.version),
    };
    active.insert(conn()).await?;
    Ok(uuid)
}

pub async fn find_by_store_order(store_order_ref: &str) -> Result<Option<ShippingFee>> {
    let result = Entity::find()
        .filter(Column::StoreOrderRef.eq(store_order_ref))
        .filter(Column::IsDeleted.eq(false))
        .one(conn())
        .await?;
    result.map(to_domain).transpose()
}

/// Невыставленные перерасходы доставки магазина (extra > 0)
pub async fn list_unbilled_for_store_in<C: ConnectionTrait>(
    db: &C,
    store_ref: &str,
) -> Result<Vec<ShippingFee>> {
    let models = Entity::find()
        .filter(Column::StoreRef.eq(store_ref))
        .filter(Column::PaidByShop.eq(false))
        .filter(Column::PayoutBillRef.is_null())
        .filter(Column::ExtraForStore.gt(0.0))
        .filter(Column::IsDeleted.eq(false))
        .all(db)
        .await?;
    models.into_iter().map(to_domain).collect()
}

/// Магазины с невыставленными перерасходами
pub async fn distinct_stores_with_unbilled() -> Result<Vec<String>> {
    use sea_orm::QuerySelect;
    let stores: Vec<String> = Entity::find()
        .select_only()
        .column(Column::StoreRef)
        .distinct()
        .filter(Column::PaidByShop.eq(false))
        .filter(Column::PayoutBillRef.is_null())
        .filter(Column::ExtraForStore.gt(0.0))
        .filter(Column::IsDeleted.eq(false))
        .into_tuple()
        .all(conn())
        .await?;
    Ok(stores)
}

pub async fn attach_to_bill_in<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    bill_ref: &str,
) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::PayoutBillRef, Expr::value(bill_ref))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::PayoutBillRef.is_null())
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn mark_paid_by_bill_in<C: ConnectionTrait>(db: &C, bill_ref: &str) -> Result<u64> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::PaidByShop, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::PayoutBillRef.eq(bill_ref))
        .filter(Column::PaidByShop.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn list_by_bill_in<C: ConnectionTrait>(db: &C, bill_ref: &str) -> Result<Vec<ShippingFee>> {
    let models = Entity::find()
        .filter(Column::PayoutBillRef.eq(bill_ref))
        .all(db)
        .await?;
    models.into_iter().map(to_domain).collect()
}

/// Обновить фактический тариф до включения в счёт
pub async fn update_actual(fee: &ShippingFee) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::ActualFee, Expr::value(fee.actual_fee))
        .col_expr(Column::ExtraForStore, Expr::value(fee.extra_for_store))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(fee.base.id.as_string()))
        .filter(Column::PayoutBillRef.is_null())
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}
