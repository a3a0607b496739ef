use anyhow::{anyhow, Result};
use contracts::domain::a002_order::aggregate::{Order, OrderIntakeDto};
use contracts::domain::a003_store_order::aggregate::StoreOrder;
use contracts::domain::a004_order_item::aggregate::OrderItem;
use contracts::domain::common::AggregateId;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use super::repository;
use crate::domain::{a003_store_order, a004_order_item};
use crate::shared::config;
use crate::shared::data::db::get_connection;
use crate::shared::money;

/// Приём заказа: родительский заказ + подзаказы магазинов + строки,
/// в одной транзакции. Сумма заказа равна сумме строк (без доставки).
pub async fn create(dto: OrderIntakeDto) -> Result<Uuid> {
    if dto.store_orders.is_empty() {
        return Err(anyhow!("Order must contain at least one store order"));
    }
    let default_fee = config::settlement_config().platform_fee_percentage_default;

    let code = dto
        .code
        .clone()
        .unwrap_or_else(|| format!("ORD-{}", Uuid::new_v4()));

    let mut subtotals: Vec<f64> = Vec::new();
    for store_order in &dto.store_orders {
        if store_order.items.is_empty() {
            return Err(anyhow!(
                "Store order for {} has no items",
                store_order.store_ref
            ));
        }
        subtotals.push(money::sum(
            store_order.items.iter().map(|i| i.gross_line_total),
        ));
    }
    let total_amount = money::sum(subtotals.iter().copied());

    let mut order = Order::new_for_insert(code.clone(), dto.customer_ref.clone(), total_amount);
    order.base.comment = dto.comment.clone();
    order
        .validate()
        .map_err(|e| anyhow!("Validation failed: {}", e))?;

    let txn = get_connection().begin().await?;

    let order_id = repository::insert_in(&txn, &order).await?;
    let order_ref = order_id.to_string();

    for (idx, store_order_dto) in dto.store_orders.iter().enumerate() {
        let store_order_code = format!("{}-S{}", code, idx + 1);
        let store_order = StoreOrder::new_for_insert(
            store_order_code.clone(),
            order_ref.clone(),
            store_order_dto.store_ref.clone(),
            subtotals[idx],
            store_order_dto.shipping_fee_estimated,
        );
        let store_order_id = a003_store_order::repository::insert_in(&txn, &store_order).await?;

        for (item_idx, item_dto) in store_order_dto.items.iter().enumerate() {
            let item = OrderItem::new_for_insert(
                format!("{}-I{}", store_order_code, item_idx + 1),
                store_order_id.to_string(),
                order_ref.clone(),
                store_order_dto.store_ref.clone(),
                item_dto.product_ref.clone(),
                item_dto.quantity,
                item_dto.gross_line_total,
                item_dto.platform_fee_percentage.unwrap_or(default_fee),
                item_dto.cost_of_goods,
            );
            item.validate()
                .map_err(|e| anyhow!("Validation failed: {}", e))?;
            a004_order_item::repository::insert_in(&txn, &item).await?;
        }
    }

    txn.commit().await?;
    tracing::info!(order = %order_ref, code = %code, amount = total_amount, "Order accepted");
    Ok(order_id)
}

pub async fn get_by_id(id: Uuid) -> Result<Option<Order>> {
    repository::get_by_id(id).await
}

/// Заказ вместе с подзаказами и строками
pub async fn get_detail(id: Uuid) -> Result<Option<(Order, Vec<StoreOrder>, Vec<OrderItem>)>> {
    let Some(order) = repository::get_by_id(id).await? else {
        return Ok(None);
    };
    let order_ref = order.base.id.as_string();
    let store_orders = a003_store_order::repository::list_by_order(&order_ref).await?;
    let items = a004_order_item::repository::list_by_order(&order_ref).await?;
    Ok(Some((order, store_orders, items)))
}
