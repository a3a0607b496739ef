mod common;

use backend::domain::a001_wallet::service as wallet_service;
use backend::domain::a002_order::{service as order_service, settlement};
use backend::domain::a003_store_order::service as store_order_service;
use backend::domain::a004_order_item::repository as item_repository;
use backend::domain::a005_return_request::service as return_service;
use backend::domain::a006_payout_bill::service as bill_service;
use backend::domain::a007_shipping_fee::service as shipping_fee_service;
use backend::usecases::u501_payout_eligibility::executor as eligibility_sweep;
use chrono::{Duration, Utc};
use common::{assert_money_eq, init_test_db, intake, payment};
use contracts::domain::a001_wallet::aggregate::WalletKind;
use contracts::domain::a003_store_order::aggregate::DeliveryConfirmationDto;
use contracts::domain::a005_return_request::aggregate::ReturnRequestCreateDto;
use contracts::domain::a006_payout_bill::aggregate::MarkBillPaidDto;
use contracts::domain::a007_shipping_fee::aggregate::ShippingFeeReconciliationDto;
use contracts::domain::common::AggregateId;
use contracts::domain::errors::SettlementError;
use uuid::Uuid;

/// Полный контур выплаты: вручение → окно удержания → допуск →
/// высвобождение → счёт → оплата счёта, плюс граничные случаи окна,
/// эксклюзивность выплаты и исключение возвращённых строк.
#[tokio::test]
async fn payout_pipeline_from_delivery_to_paid_bill() {
    init_test_db().await;

    // Заказ: магазин A (100, комиссия 5%, доставка оценкой 10),
    // магазин B (50, комиссия 5%)
    let order_id = order_service::create(intake(
        "cust-1",
        &[("store-a", 10.0, &[(100.0, 5.0)]), ("store-b", 0.0, &[(50.0, 5.0)])],
    ))
    .await
    .expect("order intake");
    settlement::settle_payment(&payment(order_id, "cust-1", 150.0))
        .await
        .expect("settlement");

    let (_, store_orders, items) = order_service::get_detail(order_id)
        .await
        .expect("detail")
        .expect("order exists");
    assert_eq!(store_orders.len(), 2);
    assert_eq!(items.len(), 2);

    // Вручение 8 дней назад: окно удержания (7 дней) уже истекло
    for store_order in &store_orders {
        store_order_service::apply_delivery_confirmation(&DeliveryConfirmationDto {
            store_order_id: store_order.base.id.as_string(),
            delivered_at: Utc::now() - Duration::days(8),
        })
        .await
        .expect("delivery confirmation");
    }

    // --- обход допуска: строки допущены, заказ высвобожден ---
    let stats = eligibility_sweep::run().await.expect("sweep");
    assert_eq!(stats.promoted, 2);
    assert_eq!(stats.released_orders, 1);
    assert_eq!(stats.failed, 0);

    let items = item_repository::list_by_order(&order_id.to_string())
        .await
        .expect("items");
    assert!(items.iter().all(|i| i.eligible_for_payout));
    assert!(items.iter().all(|i| !i.is_payout));
    let item_a = items.iter().find(|i| i.store_ref == "store-a").unwrap();
    assert_money_eq(item_a.platform_fee_amount, 5.0); // 100 * 5%

    let platform = wallet_service::summary(WalletKind::Platform, "platform")
        .await
        .expect("platform wallet");
    assert_money_eq(platform.pending_balance, 0.0);
    assert_money_eq(platform.done_balance, 150.0);
    assert_money_eq(platform.total_balance, 150.0);
    let store_a = wallet_service::summary(WalletKind::Store, "store-a")
        .await
        .expect("store-a wallet");
    assert_money_eq(store_a.pending_balance, 0.0);
    assert_money_eq(store_a.available_balance, 100.0);

    // Повторный прогон — no-op (идемпотентность обхода)
    let stats = eligibility_sweep::run().await.expect("sweep rerun");
    assert_eq!(stats.promoted, 0);
    assert_eq!(stats.released_orders, 0);

    // --- граница окна удержания: минута до истечения — не допущена ---
    let boundary_order = order_service::create(intake("cust-1", &[("store-a", 0.0, &[(40.0, 5.0)])]))
        .await
        .expect("order intake");
    settlement::settle_payment(&payment(boundary_order, "cust-1", 40.0))
        .await
        .expect("settlement");
    let (_, boundary_store_orders, _) = order_service::get_detail(boundary_order)
        .await
        .expect("detail")
        .expect("order exists");
    store_order_service::apply_delivery_confirmation(&DeliveryConfirmationDto {
        store_order_id: boundary_store_orders[0].base.id.as_string(),
        delivered_at: Utc::now() - Duration::days(7) + Duration::seconds(60),
    })
    .await
    .expect("delivery confirmation");
    eligibility_sweep::run().await.expect("sweep");
    let boundary_items = item_repository::list_by_order(&boundary_order.to_string())
        .await
        .expect("items");
    assert!(!boundary_items[0].eligible_for_payout);

    // --- сверка фактического тарифа доставки: перерасход 2 на магазин ---
    let fee = shipping_fee_service::apply_reconciliation(&ShippingFeeReconciliationDto {
        store_order_id: store_orders
            .iter()
            .find(|so| so.store_ref == "store-a")
            .unwrap()
            .base
            .id
            .as_string(),
        actual_fee: 12.0,
    })
    .await
    .expect("fee reconciliation");
    assert_money_eq(fee.extra_for_store, 2.0);

    // --- счёт магазину A: 100 - 5 (комиссия) - 2 (доставка) = 93 ---
    let bill = bill_service::create_bill_for_store("store-a")
        .await
        .expect("bill");
    assert_money_eq(bill.bill.total_gross, 100.0);
    assert_money_eq(bill.bill.total_platform_fee, 5.0);
    assert_money_eq(bill.bill.total_shipping_order_fee, 2.0);
    assert_money_eq(bill.bill.total_net_payout, 93.0);
    assert_eq!(bill.item_refs.len(), 1);
    assert_eq!(bill.shipping_fee_refs.len(), 1);

    // Один открытый счёт на магазин: get_or_create возвращает его же
    let same_bill = bill_service::get_or_create_bill_for_store("store-a")
        .await
        .expect("get or create");
    assert_eq!(same_bill.bill.base.id, bill.bill.base.id);

    // --- оплата счёта: строки выплачены, сборы закрыты ---
    let bill_id = bill.bill.base.id.value();
    let paid = bill_service::mark_bill_paid(
        bill_id,
        &MarkBillPaidDto {
            reference: "PAY-2025-0001".to_string(),
            receipt_url: Some("https://bank.example/receipt/1".to_string()),
            note: None,
        },
    )
    .await
    .expect("mark paid");
    assert!(paid.paid_at.is_some());

    let paid_item_id = Uuid::parse_str(&bill.item_refs[0]).unwrap();
    let paid_item = item_repository::get_by_id(paid_item_id)
        .await
        .expect("item")
        .expect("item exists");
    assert!(paid_item.is_payout);
    assert_money_eq(paid_item.platform_fee_amount, 5.0);

    // Эксклюзивность выплаты: выплаченная строка исключена навсегда
    let rebill = bill_service::create_bill_for_store("store-a").await;
    assert!(matches!(rebill, Err(SettlementError::NothingToPayout(_))));

    // Повторная оплата того же счёта отклоняется
    let repaid = bill_service::mark_bill_paid(
        bill_id,
        &MarkBillPaidDto {
            reference: "PAY-2025-0002".to_string(),
            receipt_url: None,
            note: None,
        },
    )
    .await;
    assert!(matches!(
        repaid,
        Err(SettlementError::InvalidStateTransition(_))
    ));

    // --- исключение возврата: допущенная строка после возврата
    // не попадает в счёт, даже будучи eligible ---
    let store_b_item = items
        .iter()
        .find(|i| i.store_ref == "store-b")
        .expect("store-b item");
    let request = return_service::create(&ReturnRequestCreateDto {
        order_item_id: store_b_item.base.id.as_string(),
        comment: None,
    })
    .await
    .expect("return request");
    return_service::shop_receive_or_dispute(
        request.base.id.value(),
        backend::domain::a005_return_request::service::ShopAction::Receive,
    )
    .await
    .expect("shop receives return");

    eligibility_sweep::run().await.expect("sweep");
    let store_b_item = item_repository::get_by_id(store_b_item.base.id.value())
        .await
        .expect("item")
        .expect("item exists");
    assert!(store_b_item.is_returned);
    assert!(store_b_item.eligible_for_payout); // флаг монотонен

    let store_b_bill = bill_service::create_bill_for_store("store-b").await;
    assert!(matches!(
        store_b_bill,
        Err(SettlementError::NothingToPayout(_))
    ));

    // Возврат после высвобождения: покупатель получил кредит
    let customer = wallet_service::summary(WalletKind::Customer, "cust-1")
        .await
        .expect("customer wallet");
    assert_money_eq(customer.balance, 50.0);
}
