mod common;

use backend::domain::a001_wallet::service::{self as wallet_service, AdjustParams};
use backend::domain::a002_order::{service as order_service, settlement};
use backend::domain::a001_wallet;
use backend::projections::p900_wallet_ledger;
use common::{assert_money_eq, init_test_db, intake, payment};
use contracts::domain::a001_wallet::aggregate::{BalanceBucket, WalletKind, WalletStatus};
use contracts::domain::errors::SettlementError;
use contracts::projections::p900_wallet_ledger::dto::{LedgerEntryKind, LedgerListRequest};
use uuid::Uuid;

/// Сквозной сценарий расчёта: оплата 150 (магазин A 100, магазин B 50,
/// комиссия 5%), сверка распределения, идемпотентность webhook'а,
/// replay-сверка регистра, типизированные отказы кошелька.
#[tokio::test]
async fn settlement_of_confirmed_payment() {
    init_test_db().await;

    let order_id = order_service::create(intake(
        "cust-1",
        &[("store-a", 0.0, &[(100.0, 5.0)]), ("store-b", 0.0, &[(50.0, 5.0)])],
    ))
    .await
    .expect("order intake");

    // --- расчёт подтверждённой оплаты ---
    let outcome = settlement::settle_payment(&payment(order_id, "cust-1", 150.0))
        .await
        .expect("settlement");
    assert!(!outcome.duplicate);
    assert_money_eq(outcome.held_amount, 150.0);
    assert_eq!(outcome.allocations.len(), 2);
    let share_a = outcome
        .allocations
        .iter()
        .find(|s| s.store_ref == "store-a")
        .expect("store-a share");
    assert_money_eq(share_a.amount, 100.0);

    // Консервация: сумма долей магазинов равна удержанию платформы
    let allocated: f64 = outcome.allocations.iter().map(|s| s.amount).sum();
    assert_money_eq(allocated, outcome.held_amount);

    let platform = wallet_service::summary(WalletKind::Platform, "platform")
        .await
        .expect("platform wallet");
    assert_money_eq(platform.pending_balance, 150.0);
    assert_money_eq(platform.total_balance, 150.0);
    assert_money_eq(platform.received_total, 150.0);
    assert_money_eq(platform.done_balance, 0.0);

    let store_a = wallet_service::summary(WalletKind::Store, "store-a")
        .await
        .expect("store-a wallet");
    assert_money_eq(store_a.pending_balance, 100.0);
    assert_money_eq(store_a.total_revenue, 100.0);
    let store_b = wallet_service::summary(WalletKind::Store, "store-b")
        .await
        .expect("store-b wallet");
    assert_money_eq(store_b.pending_balance, 50.0);

    // Платёж покупателя записан информационно: баланс не тронут
    let customer = wallet_service::summary(WalletKind::Customer, "cust-1")
        .await
        .expect("customer wallet");
    assert_money_eq(customer.balance, 0.0);
    let customer_ledger = p900_wallet_ledger::service::list(
        &customer.id,
        &LedgerListRequest {
            kind: Some(LedgerEntryKind::Deposit.as_str().to_string()),
            limit: 10,
            offset: 0,
        },
    )
    .await
    .expect("customer ledger");
    assert_eq!(customer_ledger.total_count, 1);
    assert!(customer_ledger.items[0].bucket.is_none());

    // --- идемпотентность: повторный webhook ничего не проводит ---
    let replay = settlement::settle_payment(&payment(order_id, "cust-1", 150.0))
        .await
        .expect("duplicate settlement");
    assert!(replay.duplicate);
    let platform_after = wallet_service::summary(WalletKind::Platform, "platform")
        .await
        .expect("platform wallet");
    assert_money_eq(platform_after.pending_balance, 150.0);
    assert_money_eq(platform_after.received_total, 150.0);

    // Ровно одна проводка PENDING_HOLD по pending-корзине платформы
    let platform_holds = p900_wallet_ledger::service::list(
        &platform_after.id,
        &LedgerListRequest {
            kind: Some(LedgerEntryKind::PendingHold.as_str().to_string()),
            limit: 50,
            offset: 0,
        },
    )
    .await
    .expect("platform ledger");
    let pending_entries: Vec<_> = platform_holds
        .items
        .iter()
        .filter(|e| e.bucket.as_deref() == Some("pending_balance"))
        .collect();
    assert_eq!(pending_entries.len(), 1);

    // --- replay-сверка: регистр воспроизводит каждую корзину ---
    for wallet_id in [&platform_after.id, &store_a.id, &store_b.id, &customer.id] {
        let report = wallet_service::verify_ledger(Uuid::parse_str(wallet_id).unwrap())
            .await
            .expect("replay");
        assert!(
            report.mismatches.is_empty(),
            "ledger replay diverged for wallet {}: {:?}",
            wallet_id,
            report.mismatches
        );
    }

    // --- сверка распределения: расхождение фатально и атомарно ---
    let bad_order = order_service::create(intake("cust-1", &[("store-a", 0.0, &[(80.0, 5.0)])]))
        .await
        .expect("order intake");
    let result = settlement::settle_payment(&payment(bad_order, "cust-1", 100.0)).await;
    assert!(matches!(
        result,
        Err(SettlementError::ReconciliationMismatch { .. })
    ));
    let platform_unchanged = wallet_service::summary(WalletKind::Platform, "platform")
        .await
        .expect("platform wallet");
    assert_money_eq(platform_unchanged.pending_balance, 150.0);
    assert_money_eq(platform_unchanged.received_total, 150.0);

    // --- типизированные отказы кошелька ---
    let store_a_id = Uuid::parse_str(&store_a.id).unwrap();
    let overdraft = wallet_service::adjust(AdjustParams {
        wallet_id: store_a_id,
        bucket: BalanceBucket::DepositBalance,
        delta: -10.0,
        kind: LedgerEntryKind::Withdraw,
        order_ref: None,
        dedup_key: None,
        description: "deposit withdrawal attempt".to_string(),
    })
    .await;
    assert!(matches!(
        overdraft,
        Err(SettlementError::InsufficientFunds { .. })
    ));

    a001_wallet::repository::set_status(store_a_id, WalletStatus::Locked)
        .await
        .expect("lock wallet");
    let locked = wallet_service::adjust(AdjustParams {
        wallet_id: store_a_id,
        bucket: BalanceBucket::DepositBalance,
        delta: 10.0,
        kind: LedgerEntryKind::Deposit,
        order_ref: None,
        dedup_key: None,
        description: "deposit top-up".to_string(),
    })
    .await;
    assert!(matches!(locked, Err(SettlementError::WalletLocked(_))));
    a001_wallet::repository::set_status(store_a_id, WalletStatus::Active)
        .await
        .expect("unlock wallet");
}
