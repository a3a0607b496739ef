//! Общие помощники интеграционных тестов.
//!
//! Соединение с БД — глобальное на процесс, поэтому каждый тестовый
//! бинарь инициализирует собственный временный файл sqlite и прогоняет
//! свой сценарий в одном #[tokio::test].

use backend::shared::data::db;
use contracts::domain::a002_order::aggregate::{
    OrderIntakeDto, OrderItemIntakeDto, PaymentConfirmationDto, StoreOrderIntakeDto,
};
use uuid::Uuid;

pub async fn init_test_db() {
    let path = std::env::temp_dir().join(format!("settlement-test-{}.db", Uuid::new_v4()));
    db::initialize_database(Some(&path.to_string_lossy()))
        .await
        .expect("test database init");
}

/// Заказ из (магазин, оценка доставки, строки (сумма, %комиссии))
pub fn intake(
    customer_ref: &str,
    stores: &[(&str, f64, &[(f64, f64)])],
) -> OrderIntakeDto {
    OrderIntakeDto {
        code: None,
        customer_ref: customer_ref.to_string(),
        store_orders: stores
            .iter()
            .map(|(store_ref, shipping, items)| StoreOrderIntakeDto {
                store_ref: store_ref.to_string(),
                shipping_fee_estimated: *shipping,
                items: items
                    .iter()
                    .map(|(gross, pct)| OrderItemIntakeDto {
                        product_ref: format!("product-{}", Uuid::new_v4()),
                        quantity: 1,
                        gross_line_total: *gross,
                        platform_fee_percentage: Some(*pct),
                        cost_of_goods: gross * 0.6,
                    })
                    .collect(),
            })
            .collect(),
        comment: None,
    }
}

pub fn payment(order_id: Uuid, customer_ref: &str, amount: f64) -> PaymentConfirmationDto {
    PaymentConfirmationDto {
        customer_id: customer_ref.to_string(),
        order_id: order_id.to_string(),
        amount_confirmed: amount,
        result_code: "0".to_string(),
    }
}

#[track_caller]
pub fn assert_money_eq(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.005,
        "expected {} but got {}",
        expected,
        actual
    );
}
