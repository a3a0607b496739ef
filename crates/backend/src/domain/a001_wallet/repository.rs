use anyhow::{anyhow, Result};
use chrono::Utc;
use contracts::domain::a001_wallet::aggregate::{Wallet, WalletId, WalletKind, WalletStatus};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_wallet")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub kind: String,
    pub owner_ref: String,
    pub status: String,
    pub balance: f64,
    pub pending_balance: f64,
    pub available_balance: f64,
    pub deposit_balance: f64,
    pub total_revenue: f64,
    pub total_balance: f64,
    pub done_balance: f64,
    pub received_total: f64,
    pub refunded_total: f64,
    pub is_deleted: bool,
    pub is_posted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Модель -> агрегат. Порча enum-колонок в БД — ошибка, не умолчание:
/// для денежных данных молчаливый fallback недопустим.
pub fn to_domain(m: Model) -> Result<Wallet> {
    let metadata = EntityMetadata {
        created_at: m.created_at.unwrap_or_else(Utc::now),
        updated_at: m.updated_at.unwrap_or_else(Utc::now),
        is_deleted: m.is_deleted,
        is_posted: m.is_posted,
        version: m.version,
    };
    let uuid = Uuid::parse_str(&m.id)?;
    let kind = WalletKind::parse(&m.kind).map_err(|e| anyhow!(e))?;
    let status = WalletStatus::parse(&m.status).map_err(|e| anyhow!(e))?;

    Ok(Wallet {
        base: BaseAggregate::with_metadata(
            WalletId(uuid),
            m.code,
            m.description,
            m.comment,
            metadata,
        ),
        kind,
        owner_ref: m.owner_ref,
        status,
        balance: m.balance,
        pending_balance: m.pending_balance,
        available_balance: m.available_balance,
        deposit_balance: m.deposit_balance,
        total_revenue: m.total_revenue,
        total_balance: m.total_balance,
        done_balance: m.done_balance,
        received_total: m.received_total,
        refunded_total: m.refunded_total,
    })
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

pub async fn get_by_id(id: Uuid) -> Result<Option<Wallet>> {
    get_by_id_in(conn(), id).await
}

pub async fn get_by_id_in<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Wallet>> {
    let result = Entity::find_by_id(id.to_string()).one(db).await?;
    result.map(to_domain).transpose()
}

pub async fn get_by_owner_in<C: ConnectionTrait>(
    db: &C,
    kind: WalletKind,
    owner_ref: &str,
) -> Result<Option<Wallet>> {
    let result = Entity::find()
        .filter(Column::Kind.eq(kind.as_str()))
        .filter(Column::OwnerRef.eq(owner_ref))
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    result.map(to_domain).transpose()
}

pub async fn insert_in<C: ConnectionTrait>(db: &C, wallet: &Wallet) -> Result<Uuid> {
    let uuid = wallet.base.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        code: Set(wallet.base.code.clone()),
        description: Set(wallet.base.description.clone()),
        comment: Set(wallet.base.comment.clone()),
        kind: Set(wallet.kind.as_str().to_string()),
        owner_ref: Set(wallet.owner_ref.clone()),
        status: Set(wallet.status.as_str().to_string()),
        balance: Set(wallet.balance),
        pending_balance: Set(wallet.pending_balance),
        available_balance: Set(wallet.available_balance),
        deposit_balance: Set(wallet.deposit_balance),
        total_revenue: Set(wallet.total_revenue),
        total_balance: Set(wallet.total_balance),
        done_balance: Set(wallet.done_balance),
        received_total: Set(wallet.received_total),
        refunded_total: Set(wallet.refunded_total),
        is_deleted: Set(wallet.base.metadata.is_deleted),
        is_posted: Set(wallet.base.metadata.is_posted),
        created_at: Set(Some(wallet.base.metadata.created_at)),
        updated_at: Set(Some(wallet.base.metadata.updated_at)),
        version: Set(wallet.base.metadata.version),
    };
    active.insert(db).await?;
    Ok(uuid)
}

/// Сохранить корзины кошелька с optimistic-проверкой версии.
///
/// Возвращает false, если версия в БД уже не равна expected_version
/// (конкурентная корректировка) — вызывающий обязан повторить чтение.
pub async fn update_balances_in<C: ConnectionTrait>(
    db: &C,
    wallet: &Wallet,
    expected_version: i32,
) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::Status, Expr::value(wallet.status.as_str()))
        .col_expr(Column::Balance, Expr::value(wallet.balance))
        .col_expr(Column::PendingBalance, Expr::value(wallet.pending_balance))
        .col_expr(
            Column::AvailableBalance,
            Expr::value(wallet.available_balance),
        )
        .col_expr(Column::DepositBalance, Expr::value(wallet.deposit_balance))
        .col_expr(Column::TotalRevenue, Expr::value(wallet.total_revenue))
        .col_expr(Column::TotalBalance, Expr::value(wallet.total_balance))
        .col_expr(Column::DoneBalance, Expr::value(wallet.done_balance))
        .col_expr(Column::ReceivedTotal, Expr::value(wallet.received_total))
        .col_expr(Column::RefundedTotal, Expr::value(wallet.refunded_total))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .col_expr(Column::Version, Expr::value(wallet.base.metadata.version))
        .filter(Column::Id.eq(wallet.base.id.as_string()))
        .filter(Column::Version.eq(expected_version))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Административная смена статуса (заморозка/разморозка)
pub async fn set_status(id: Uuid, status: WalletStatus) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let result = Entity::update_many()
        .col_expr(Column::Status, Expr::value(status.as_str()))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}
