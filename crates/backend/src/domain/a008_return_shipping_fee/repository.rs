use anyhow::Result;
use chrono::Utc;
use contracts::domain::a008_return_shipping_fee::aggregate::{
    ReturnShippingFee, ReturnShippingFeeId,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a008_return_shipping_fee")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub return_request_ref: String,
    pub store_ref: String,
    pub amount: f64,
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

pub fn to_domain(m: Model) -> Result<ReturnShippingFee> {
    let metadata = EntityMetadata {
        created_at: m.created_at.unwrap_or_else(Utc::now),
        updated_at: m.updated_at.unwrap_or_else(Utc::now),
        is_deleted: m.is_deleted,
        is_posted: m.is_posted,
        version: m.version,
    };
    let uuid = Uuid::parse_str(&m.id)?;
    Ok(ReturnShippingFee {
        base: BaseAggregate::with_metadata(
            ReturnShippingFeeId(uuid),
            m.code,
            m.description,
            m.comment,
            metadata,
        ),
        return_request_ref: m.return_request_ref,
        store_ref: m.store_ref,
        amount: m.amount,
        paid_by_shop: m.paid_by_shop,
        payout_bill_ref: m.payout_bill_ref,
    })
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn insert(fee: &ReturnShippingFee) -> Result<Uuid> {
    let uuid = fee.base.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        code: Set(fee.base.code.clone()),
        description: Set(fee.base.description.clone()),
        comment: Set(fee.base.comment.clone()),
        return_request_ref: Set(fee.return_request_ref.clone()),
        store_ref: Set(fee.store_ref.clone()),
        amount: Set(fee.amount),
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

pub async fn exists_for_return(return_request_ref: &str) -> Result<bool> {
    use sea_orm::PaginatorTrait;
    let count = Entity::find()
        .filter(Column::ReturnRequestRef.eq(return_request_ref))
        .filter(Column::IsDeleted.eq(false))
        .count(conn())
        .await?;
    Ok(count > 0)
}

/// Невыставленные сборы за обратную доставку магазина
pub async fn list_unbilled_for_store_in<C: ConnectionTrait>(
    db: &C,
    store_ref: &str,
) -> Result<Vec<ReturnShippingFee>> {
    let models = Entity::find()
        .filter(Column::StoreRef.eq(store_ref))
        .filter(Column::PaidByShop.eq(false))
        .filter(Column::PayoutBillRef.is_null())
        .filter(Column::IsDeleted.eq(false))
        .all(db)
        .await?;
    models.into_iter().map(to_domain).collect()
}

/// Магазины с невыставленными сборами за обратную доставку
pub async fn distinct_stores_with_unbilled() -> Result<Vec<String>> {
    use sea_orm::QuerySelect;
    let stores: Vec<String> = Entity::find()
        .select_only()
        .column(Column::StoreRef)
        .distinct()
        .filter(Column::PaidByShop.eq(false))
        .filter(Column::PayoutBillRef.is_null())
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

pub async fn list_by_bill_in<C: ConnectionTrait>(
    db: &C,
    bill_ref: &str,
) -> Result<Vec<ReturnShippingFee>> {
    let models = Entity::find()
        .filter(Column::PayoutBillRef.eq(bill_ref))
        .all(db)
        .await?;
    models.into_iter().map(to_domain).collect()
}
