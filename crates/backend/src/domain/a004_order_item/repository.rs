use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::domain::a004_order_item::aggregate::{OrderItem, OrderItemId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a004_order_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub store_order_ref: String,
    pub order_ref: String,
    pub store_ref: String,
    pub product_ref: String,
    pub quantity: i32,
    pub gross_line_total: f64,
    pub platform_fee_percentage: f64,
    pub platform_fee_amount: f64,
    pub shipping_extra_for_store: f64,
    pub cost_of_goods: f64,
    pub delivered_at: Option<DateTime<Utc>>,
    pub eligible_for_payout: bool,
    pub is_payout: bool,
    pub is_returned: bool,
    pub payout_bill_ref: Option<String>,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn to_domain(m: Model) -> Result<OrderItem> {
    let metadata = EntityMetadata {
        created_at: m.created_at.unwrap_or_else(Utc::now),
        updated_at: m.updated_at.unwrap_or_else(Utc::now),
        is_deleted: m.is_deleted,
        is_posted: m.is_posted,
        version: m.version,
    };
    let uuid = Uuid::parse_str(&m.id)?;
    Ok(OrderItem {
        base: BaseAggregate::with_metadata(
            OrderItemId(uuid),
            m.code,
            m.description,
            m.comment,
            metadata,
        ),
        store_order_ref: m.store_order_ref,
        order_ref: m.order_ref,
        store_ref: m.store_ref,
        product_ref: m.product_ref,
        quantity: m.quantity,
        gross_line_total: m.gross_line_total,
        platform_fee_percentage: m.platform_fee_percentage,
        platform_fee_amount: m.platform_fee_amount,
        shipping_extra_for_store: m.shipping_extra_for_store,
        cost_of_goods: m.cost_of_goods,
        delivered_at: m.delivered_at,
        eligible_for_payout: m.eligible_for_payout,
        is_payout: m.is_payout,
        is_returned: m.is_returned,
        payout_bill_ref: m.payout_bill_ref,
    })
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn get_by_id(id: Uuid) -> Result<Option<OrderItem>> {
    get_by_id_in(conn(), id).await
}

pub async fn get_by_id_in<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<OrderItem>> {
    let result = Entity::find_by_id(id.to_string()).one(db).await?;
    result.map(to_domain).transpose()
}

pub async fn insert_in<C: ConnectionTrait>(db: &C, item: &OrderItem) -> Result<Uuid> {
    let uuid = item.base.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        code: Set(item.base.code.clone()),
        description: Set(item.base.description.clone()),
        comment: Set(item.base.comment.clone()),
        store_order_ref: Set(item.store_order_ref.clone()),
        order_ref: Set(item.order_ref.clone()),
        store_ref: Set(item.store_ref.clone()),
        product_ref: Set(item.product_ref.clone()),
        quantity: Set(item.quantity),
        gross_line_total: Set(item.gross_line_total),
        platform_fee_percentage: Set(item.platform_fee_percentage),
        platform_fee_amount: Set(item.platform_fee_amount),
        shipping_extra_for_store: Set(item.shipping_extra_for_store),
        cost_of_goods: Set(item.cost_of_goods),
        delivered_at: Set(item.delivered_at),
        eligible_for_payout: Set(item.eligible_for_payout),
        is_payout: Set(item.is_payout),
        is_returned: Set(item.is_returned),
        payout_bill_ref: Set(item.payout_bill_ref.clone()),
        is_deleted: Set(item.base.metadata.is_deleted),
        is_posted: Set(item.base.metadata.is_posted),
        created_at: Set(Some(item.base.metadata.created_at)),
        updated_at: Set(Some(item.base.metadata.updated_at)),
        version: Set(item.base.metadata.version),
    };
    active.insert(db).await?;
    Ok(uuid)
}

pub async fn list_by_order_in<C: ConnectionTrait>(db: &C, order_ref: &str) -> Result<Vec<OrderItem>> {
    let models = Entity::find()
        .filter(Column::OrderRef.eq(order_ref))
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Code)
        .all(db)
        .await?;
    models.into_iter().map(to_domain).collect()
}

pub async fn list_by_order(order_ref: &str) -> Result<Vec<OrderItem>> {
    list_by_order_in(conn(), order_ref).await
}

pub async fn list_by_store_order_in<C: ConnectionTrait>(
    db: &C,
    store_order_ref: &str,
) -> Result<Vec<OrderItem>> {
    let models = Entity::find()
        .filter(Column::StoreOrderRef.eq(store_order_ref))
        .filter(Column::IsDeleted.eq(false))
        .all(db)
        .await?;
    models.into_iter().map(to_domain).collect()
}

/// Кандидаты eligibility-обхода: не допущенные и не выплаченные строки
pub async fn list_pending_eligibility() -> Result<Vec<OrderItem>> {
    let models = Entity::find()
        .filter(Column::EligibleForPayout.eq(false))
        .filter(Column::IsPayout.eq(false))
        .filter(Column::IsReturned.eq(false))
        .filter(Column::IsDeleted.eq(false))
        .all(conn())
        .await?;
    models.into_iter().map(to_domain).collect()
}

/// Кандидаты в счёт на выплату: допущены, не выплачены, не возвращены,
/// ещё не включены в счёт
pub async fn list_payout_candidates_in<C: ConnectionTrait>(
    db: &C,
    store_ref: &str,
) -> Result<Vec<OrderItem>> {
    let models = Entity::find()
        .filter(Column::StoreRef.eq(store_ref))
        .filter(Column::EligibleForPayout.eq(true))
        .filter(Column::IsPayout.eq(false))
        .filter(Column::IsReturned.eq(false))
        .filter(Column::PayoutBillRef.is_null())
        .filter(Column::IsDeleted.eq(false))
        .all(db)
        .await?;
    models.into_iter().map(to_domain).collect()
}

/// Магазины, у которых есть строки-кандидаты на выплату
pub async fn distinct_stores_with_candidates() -> Result<Vec<String>> {
    use sea_orm::QuerySelect;
    let stores: Vec<String> = Entity::find()
        .select_only()
        .column(Column::StoreRef)
        .distinct()
        .filter(Column::EligibleForPayout.eq(true))
        .filter(Column::IsPayout.eq(false))
        .filter(Column::IsReturned.eq(false))
        .filter(Column::PayoutBillRef.is_null())
        .filter(Column::IsDeleted.eq(false))
        .into_tuple()
        .all(conn())
        .await?;
    Ok(stores)
}

/// CAS-переключение флага eligible_for_payout (по версии строки).
/// Вместе с флагом фиксируется рассчитанная комиссия платформы.
/// Возвращает false при конкурентном изменении строки.
pub async fn mark_eligible(
    id: Uuid,
    expected_version: i32,
    platform_fee_amount: f64,
) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::EligibleForPayout, Expr::value(true))
        .col_expr(Column::PlatformFeeAmount, Expr::value(platform_fee_amount))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(Column::Version, Expr::value(expected_version + 1))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::Version.eq(expected_version))
        .filter(Column::EligibleForPayout.eq(false))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

/// CAS-переключение флага is_returned
pub async fn mark_returned_in<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    expected_version: i32,
) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::IsReturned, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(Column::Version, Expr::value(expected_version + 1))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::Version.eq(expected_version))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Бэкофилл delivered_at из родительской отгрузки
pub async fn set_delivered_at(id: Uuid, delivered_at: DateTime<Utc>) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::DeliveredAt, Expr::value(delivered_at))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::DeliveredAt.is_null())
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

/// Включить строку в счёт на выплату; фиксирует рассчитанную комиссию
/// и перерасход доставки на момент выставления
pub async fn attach_to_bill_in<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    bill_ref: &str,
    platform_fee_amount: f64,
    shipping_extra_for_store: f64,
    expected_version: i32,
) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::PayoutBillRef, Expr::value(bill_ref))
        .col_expr(Column::PlatformFeeAmount, Expr::value(platform_fee_amount))
        .col_expr(
            Column::ShippingExtraForStore,
            Expr::value(shipping_extra_for_store),
        )
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(Column::Version, Expr::value(expected_version + 1))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::Version.eq(expected_version))
        .filter(Column::PayoutBillRef.is_null())
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Пометить строки счёта выплаченными (вызывается при оплате счёта)
pub async fn mark_paid_by_bill_in<C: ConnectionTrait>(db: &C, bill_ref: &str) -> Result<u64> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::IsPayout, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::PayoutBillRef.eq(bill_ref))
        .filter(Column::IsPayout.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Строки, включённые в счёт
pub async fn list_by_bill_in<C: ConnectionTrait>(db: &C, bill_ref: &str) -> Result<Vec<OrderItem>> {
    let models = Entity::find()
        .filter(Column::PayoutBillRef.eq(bill_ref))
        .all(db)
        .await?;
    models.into_iter().map(to_domain).collect()
}
