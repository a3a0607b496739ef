use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::data::db::get_connection;

/// Модель записи регистра проводок кошелька.
///
/// Регистр append-only: записи не обновляются и не удаляются, это
/// единственный аудиторский след для восстановления баланса кошелька.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "p900_wallet_ledger")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub wallet_ref: String,
    pub wallet_kind: String,
    #[sea_orm(nullable)]
    pub bucket: Option<String>,
    pub amount: f64,
    pub kind: String,
    #[sea_orm(nullable)]
    pub order_ref: Option<String>,
    /// Контентно-адресуемый ключ дедупликации (UNIQUE в схеме):
    /// защита от повторной доставки webhook'ов
    #[sea_orm(nullable)]
    pub dedup_key: Option<String>,
    pub balance_after: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// Данные новой проводки
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub wallet_ref: String,
    pub wallet_kind: String,
    pub bucket: Option<String>,
    pub amount: f64,
    pub kind: String,
    pub order_ref: Option<String>,
    pub dedup_key: Option<String>,
    pub balance_after: f64,
    pub description: String,
}

/// Вставить проводку в рамках переданного соединения/транзакции
pub async fn insert_in<C: ConnectionTrait>(db: &C, entry: NewLedgerEntry) -> Result<Model> {
    let model = Model {
        id: Uuid::new_v4().to_string(),
        wallet_ref: entry.wallet_ref,
        wallet_kind: entry.wallet_kind,
        bucket: entry.bucket,
        amount: entry.amount,
        kind: entry.kind,
        order_ref: entry.order_ref,
        dedup_key: entry.dedup_key,
        balance_after: entry.balance_after,
        description: entry.description,
        created_at: Utc::now(),
    };
    let active = ActiveModel {
        id: Set(model.id.clone()),
        wallet_ref: Set(model.wallet_ref.clone()),
        wallet_kind: Set(model.wallet_kind.clone()),
        bucket: Set(model.bucket.clone()),
        amount: Set(model.amount),
        kind: Set(model.kind.clone()),
        order_ref: Set(model.order_ref.clone()),
        dedup_key: Set(model.dedup_key.clone()),
        balance_after: Set(model.balance_after),
        description: Set(model.description.clone()),
        created_at: Set(model.created_at),
    };
    active.insert(db).await?;
    Ok(model)
}

/// Найти проводку по ключу дедупликации
pub async fn find_by_dedup_key<C: ConnectionTrait>(
    db: &C,
    dedup_key: &str,
) -> Result<Option<Model>> {
    let found = Entity::find()
        .filter(Column::DedupKey.eq(dedup_key))
        .one(db)
        .await?;
    Ok(found)
}

/// Есть ли проводка данного вида по заказу в данном кошельке
pub async fn exists_for_order<C: ConnectionTrait>(
    db: &C,
    wallet_ref: &str,
    order_ref: &str,
    kind: &str,
) -> Result<bool> {
    let count = Entity::find()
        .filter(Column::WalletRef.eq(wallet_ref))
        .filter(Column::OrderRef.eq(order_ref))
        .filter(Column::Kind.eq(kind))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Все проводки кошелька в порядке создания (для replay-сверки)
pub async fn list_for_wallet(wallet_ref: &str) -> Result<Vec<Model>> {
    let models = Entity::find()
        .filter(Column::WalletRef.eq(wallet_ref))
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(conn())
        .await?;
    Ok(models)
}

/// Страница проводок кошелька с опциональным фильтром по виду
pub async fn list_page(
    wallet_ref: &str,
    kind: Option<&str>,
    limit: u64,
    offset: u64,
) -> Result<(Vec<Model>, u64)> {
    let mut query = Entity::find().filter(Column::WalletRef.eq(wallet_ref));
    if let Some(kind) = kind {
        query = query.filter(Column::Kind.eq(kind));
    }
    let total = query.clone().count(conn()).await?;
    let models = query
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .limit(limit)
        .offset(offset)
        .all(conn())
        .await?;
    Ok((models, total))
}
