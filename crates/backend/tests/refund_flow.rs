mod common;

use backend::domain::a001_wallet::service as wallet_service;
use backend::domain::a002_order::{repository as order_repository, service as order_service, settlement};
use backend::domain::a003_store_order::{repository as store_order_repository, service as store_order_service};
use backend::domain::a005_return_request::{repository as return_repository, service as return_service};
use backend::usecases::u503_auto_refund_returns::executor as auto_refund_sweep;
use chrono::{Duration, Utc};
use common::{assert_money_eq, init_test_db, intake, payment};
use contracts::domain::a001_wallet::aggregate::WalletKind;
use contracts::domain::a002_order::aggregate::OrderStatus;
use contracts::domain::a003_store_order::aggregate::{
    CancelRequestState, DeliveryConfirmationDto, StoreOrderStatus,
};
use contracts::domain::a005_return_request::aggregate::{
    ReturnRequest, ReturnRequestCreateDto, ReturnStatus,
};
use contracts::domain::common::AggregateId;
use contracts::domain::errors::SettlementError;
use uuid::Uuid;

/// Реверсы: немедленная отмена PENDING-заказа, одобрение отмены одного
/// подзаказа, отклонение запроса и идемпотентные автовозвраты.
#[tokio::test]
async fn cancellation_and_auto_refund_reversals() {
    init_test_db().await;

    // --- отмена целого заказа, пока он PENDING ---
    let order_id = order_service::create(intake(
        "cust-1",
        &[("store-a", 0.0, &[(100.0, 5.0)]), ("store-b", 0.0, &[(50.0, 5.0)])],
    ))
    .await
    .expect("order intake");
    settlement::settle_payment(&payment(order_id, "cust-1", 150.0))
        .await
        .expect("settlement");

    let refunded = store_order_service::customer_cancel_if_pending(order_id)
        .await
        .expect("customer cancel");
    assert_money_eq(refunded, 150.0);

    let customer = wallet_service::summary(WalletKind::Customer, "cust-1")
        .await
        .expect("customer wallet");
    assert_money_eq(customer.balance, 150.0);
    let platform = wallet_service::summary(WalletKind::Platform, "platform")
        .await
        .expect("platform wallet");
    assert_money_eq(platform.pending_balance, 0.0);
    assert_money_eq(platform.total_balance, 0.0);
    assert_money_eq(platform.refunded_total, 150.0);
    let store_a = wallet_service::summary(WalletKind::Store, "store-a")
        .await
        .expect("store-a wallet");
    assert_money_eq(store_a.pending_balance, 0.0);

    let order = order_repository::get_by_id(order_id)
        .await
        .expect("order")
        .expect("order exists");
    assert_eq!(order.status, OrderStatus::Cancelled);
    for store_order in store_order_repository::list_by_order(&order_id.to_string())
        .await
        .expect("store orders")
    {
        assert_eq!(store_order.status, StoreOrderStatus::Cancelled);
    }

    // Повторная отмена отклоняется типизированной причиной
    let again = store_order_service::customer_cancel_if_pending(order_id).await;
    match again {
        Err(SettlementError::InvalidStateTransition(reason)) => {
            assert_eq!(reason, "Order status must be PENDING to cancel immediately");
        }
        other => panic!("expected InvalidStateTransition, got {:?}", other.map(|_| ())),
    }

    // Replay-сверка после реверса
    for wallet_id in [&customer.id, &platform.id, &store_a.id] {
        let report = wallet_service::verify_ledger(Uuid::parse_str(wallet_id).unwrap())
            .await
            .expect("replay");
        assert!(report.mismatches.is_empty());
    }

    // --- отмена одного подзаказа с одобрением магазина ---
    let order2 = order_service::create(intake(
        "cust-1",
        &[("store-a", 0.0, &[(60.0, 5.0)]), ("store-b", 0.0, &[(30.0, 5.0)])],
    ))
    .await
    .expect("order intake");
    settlement::settle_payment(&payment(order2, "cust-1", 90.0))
        .await
        .expect("settlement");
    let store_orders = store_order_repository::list_by_order(&order2.to_string())
        .await
        .expect("store orders");
    let sub_a = store_orders.iter().find(|so| so.store_ref == "store-a").unwrap();
    let sub_b = store_orders.iter().find(|so| so.store_ref == "store-b").unwrap();

    // Одобрить можно только запрошенную отмену
    let premature = store_order_service::shop_approve_cancel(sub_a.base.id.value()).await;
    assert!(matches!(
        premature,
        Err(SettlementError::InvalidStateTransition(_))
    ));

    store_order_service::request_cancel(sub_a.base.id.value())
        .await
        .expect("request cancel");
    let refunded = store_order_service::shop_approve_cancel(sub_a.base.id.value())
        .await
        .expect("approve cancel");
    assert_money_eq(refunded, 60.0);

    let customer = wallet_service::summary(WalletKind::Customer, "cust-1")
        .await
        .expect("customer wallet");
    assert_money_eq(customer.balance, 210.0);
    let platform = wallet_service::summary(WalletKind::Platform, "platform")
        .await
        .expect("platform wallet");
    assert_money_eq(platform.pending_balance, 30.0); // доля магазина B осталась

    // Родительский заказ жив, пока жив второй подзаказ
    let order = order_repository::get_by_id(order2)
        .await
        .expect("order")
        .expect("order exists");
    assert_eq!(order.status, OrderStatus::Pending);

    // Отклонение запроса отмены вторым магазином
    store_order_service::request_cancel(sub_b.base.id.value())
        .await
        .expect("request cancel");
    let rejected = store_order_service::shop_reject_cancel(sub_b.base.id.value())
        .await
        .expect("reject cancel");
    assert_eq!(rejected.cancel_state, CancelRequestState::Rejected);
    assert_eq!(rejected.status, StoreOrderStatus::AwaitingShipment);

    // --- автовозврат по спору без ответа магазина (3 дня) ---
    let order3 = order_service::create(intake("cust-2", &[("store-c", 0.0, &[(80.0, 5.0)])]))
        .await
        .expect("order intake");
    settlement::settle_payment(&payment(order3, "cust-2", 80.0))
        .await
        .expect("settlement");
    let (_, store_orders3, items3) = order_service::get_detail(order3)
        .await
        .expect("detail")
        .expect("order exists");
    store_order_service::apply_delivery_confirmation(&DeliveryConfirmationDto {
        store_order_id: store_orders3[0].base.id.as_string(),
        delivered_at: Utc::now() - Duration::days(1),
    })
    .await
    .expect("delivery confirmation");

    let request = return_service::create(&ReturnRequestCreateDto {
        order_item_id: items3[0].base.id.as_string(),
        comment: None,
    })
    .await
    .expect("return request");
    return_service::shop_receive_or_dispute(
        request.base.id.value(),
        backend::domain::a005_return_request::service::ShopAction::Dispute,
    )
    .await
    .expect("shop disputes");

    // Спор "висит" четвёртый день
    let mut disputed = return_repository::get_by_id(request.base.id.value())
        .await
        .expect("return")
        .expect("return exists");
    let version = disputed.base.metadata.version;
    disputed.dispute_opened_at = Some(Utc::now() - Duration::days(4));
    assert!(return_repository::update_state(&disputed, version)
        .await
        .expect("backdate dispute"));

    let stats = auto_refund_sweep::run().await.expect("auto refund sweep");
    assert_eq!(stats.refunded, 1);
    assert_eq!(stats.failed, 0);

    let closed = return_repository::get_by_id(request.base.id.value())
        .await
        .expect("return")
        .expect("return exists");
    assert_eq!(closed.status, ReturnStatus::AutoRefunded);
    assert!(closed.auto_refund_executed);

    let customer2 = wallet_service::summary(WalletKind::Customer, "cust-2")
        .await
        .expect("customer wallet");
    assert_money_eq(customer2.balance, 80.0);

    // Повторный прогон в тот же день: кредита больше нет
    let stats = auto_refund_sweep::run().await.expect("auto refund rerun");
    assert_eq!(stats.refunded, 0);
    let customer2 = wallet_service::summary(WalletKind::Customer, "cust-2")
        .await
        .expect("customer wallet");
    assert_money_eq(customer2.balance, 80.0);

    // --- автовозврат по открытой жалобе без реакции (2 дня) ---
    let order4 = order_service::create(intake("cust-2", &[("store-c", 0.0, &[(20.0, 5.0)])]))
        .await
        .expect("order intake");
    settlement::settle_payment(&payment(order4, "cust-2", 20.0))
        .await
        .expect("settlement");
    let (order4_agg, _, items4) = order_service::get_detail(order4)
        .await
        .expect("detail")
        .expect("order exists");

    let mut complaint = ReturnRequest::new_for_insert(
        format!("RET-{}", Uuid::new_v4()),
        items4[0].base.id.as_string(),
        order4_agg.customer_ref.clone(),
        items4[0].store_ref.clone(),
        items4[0].gross_line_total,
    );
    complaint.opened_at = Utc::now() - Duration::days(3);
    return_repository::insert(&complaint)
        .await
        .expect("insert complaint");

    let stats = auto_refund_sweep::run().await.expect("auto refund sweep");
    assert_eq!(stats.refunded, 1);
    let customer2 = wallet_service::summary(WalletKind::Customer, "cust-2")
        .await
        .expect("customer wallet");
    assert_money_eq(customer2.balance, 100.0);
}
