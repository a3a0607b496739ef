use anyhow::{anyhow, Result};
use chrono::Utc;
use contracts::domain::a006_payout_bill::aggregate::{
    PayoutBill, PayoutBillId, PayoutBillStatus,
};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a006_payout_bill")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub store_ref: String,
    pub status: String,
    pub total_gross: f64,
    pub total_platform_fee: f64,
    pub total_shipping_order_fee: f64,
    pub total_return_shipping_fee: f64,
    pub total_net_payout: f64,
    pub payment_reference: Option<String>,
    pub receipt_url: Option<String>,
    pub note: Option<String>,
    pub paid_at: Option<chrono::DateTime<Utc>>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<Utc>>,
    pub updated_at: Option<chrono::DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn to_domain(m: Model) -> Result<PayoutBill> {
    let metadata = EntityMetadata {
        created_at: m.created_at.unwrap_or_else(Utc::now),
        updated_at: m.updated_at.unwrap_or_else(Utc::now),
        is_deleted: m.is_deleted,
        is_posted: m.is_posted,
        version: m.version,
    };
    let uuid = Uuid::parse_str(&m.id)?;
    Ok(PayoutBill {
        base: BaseAggregate::with_metadata(
            PayoutBillId(uuid),
            m.code,
            m.description,
            m.comment,
            metadata,
        ),
        store_ref: m.store_ref,
        status: PayoutBillStatus::parse(&m.status).map_err(|e| anyhow!(e))?,
        total_gross: m.total_gross,
        total_platform_fee: m.total_platform_fee,
        total_shipping_order_fee: m.total_shipping_order_fee,
        total_return_shipping_fee: m.total_return_shipping_fee,
        total_net_payout: m.total_net_payout,
        payment_reference: m.payment_reference,
        receipt_url: m.receipt_url,
        note: m.note,
        paid_at: m.paid_at,
    })
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn get_by_id(id: Uuid) -> Result<Option<PayoutBill>> {
    get_by_id_in(conn(), id).await
}

pub async fn get_by_id_in<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<PayoutBill>> {
    let result = Entity::find_by_id(id.to_string()).one(db).await?;
    result.map(to_domain).transpose()
}

pub async fn insert_in<C: ConnectionTrait>(db: &C, bill: &PayoutBill) -> Result<Uuid> {
    let uuid = bill.base.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        code: Set(bill.base.code.clone()),
        description: Set(bill.base.description.clone()),
        comment: Set(bill.base.comment.clone()),
        store_ref: Set(bill.store_ref.clone()),
        status: Set(bill.status.as_str().to_string()),
        total_gross: Set(bill.total_gross),
        total_platform_fee: Set(bill.total_platform_fee),
        total_shipping_order_fee: Set(bill.total_shipping_order_fee),
        total_return_shipping_fee: Set(bill.total_return_shipping_fee),
        total_net_payout: Set(bill.total_net_payout),
        payment_reference: Set(bill.payment_reference.clone()),
        receipt_url: Set(bill.receipt_url.clone()),
        note: Set(bill.note.clone()),
        paid_at: Set(bill.paid_at),
        is_deleted: Set(bill.base.metadata.is_deleted),
        is_posted: Set(bill.base.metadata.is_posted),
        created_at: Set(Some(bill.base.metadata.created_at)),
        updated_at: Set(Some(bill.base.metadata.updated_at)),
        version: Set(bill.base.metadata.version),
    };
    active.insert(db).await?;
    Ok(uuid)
}

/// Открытый (PENDING) счёт магазина — не больше одного одновременно
pub async fn find_pending_by_store_in<C: ConnectionTrait>(
    db: &C,
    store_ref: &str,
) -> Result<Option<PayoutBill>> {
    let result = Entity::find()
        .filter(Column::StoreRef.eq(store_ref))
        .filter(Column::Status.eq(PayoutBillStatus::Pending.as_str()))
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    result.map(to_domain).transpose()
}

pub async fn list_by_store(store_ref: &str) -> Result<Vec<PayoutBill>> {
    let models = Entity::find()
        .filter(Column::StoreRef.eq(store_ref))
        .filter(Column::IsDeleted.eq(false))
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?;
    models.into_iter().map(to_domain).collect()
}

/// Перевод счёта в PAID с optimistic-проверкой версии и статуса.
/// rows_affected == 0 означает конкурентную оплату или уже оплаченный счёт.
pub async fn mark_paid_in<C: ConnectionTrait>(
    db: &C,
    bill: &PayoutBill,
    expected_version: i32,
) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::Status, Expr::value(PayoutBillStatus::Paid.as_str()))
        .col_expr(
            Column::PaymentReference,
            Expr::value(bill.payment_reference.clone()),
        )
        .col_expr(Column::ReceiptUrl, Expr::value(bill.receipt_url.clone()))
        .col_expr(Column::Note, Expr::value(bill.note.clone()))
        .col_expr(Column::PaidAt, Expr::value(bill.paid_at))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(Column::Version, Expr::value(bill.base.metadata.version))
        .filter(Column::Id.eq(bill.base.id.as_string()))
        .filter(Column::Version.eq(expected_version))
        .filter(Column::Status.eq(PayoutBillStatus::Pending.as_str()))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
