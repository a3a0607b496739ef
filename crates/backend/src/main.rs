use axum::http::{header, Method};
use axum::middleware;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backend::{handlers, shared, system};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Директория для логов
    let log_dir = std::path::Path::new("target").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file_path = log_dir.join("backend.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                // SQL-логи глушим, логи приложения оставляем
                "info,sqlx=warn,sea_orm=warn".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    let config = shared::config::load_config()?;
    shared::config::init_settlement_config(config.settlement.clone());

    let db_path = shared::config::get_database_path(&config)?;
    shared::data::db::initialize_database(Some(&db_path.to_string_lossy()))
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    // Регламентные обходы: допуск к выплате, автосчета, автовозвраты
    system::tasks::initialization::seed_default_tasks().await?;
    system::tasks::initialization::spawn_task_worker(log_dir.join("tasks"))?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // WALLETS & LEDGER
        // ========================================
        .route(
            "/api/wallet/summary/:kind/:owner_ref",
            get(handlers::a001_wallet::get_summary),
        )
        .route(
            "/api/wallet/:wallet_ref/ledger",
            get(handlers::a001_wallet::get_ledger),
        )
        .route(
            "/api/wallet/:wallet_ref/verify",
            get(handlers::a001_wallet::verify_ledger),
        )
        // ========================================
        // ORDERS (intake from checkout)
        // ========================================
        .route("/api/orders", post(handlers::a002_order::create))
        .route("/api/orders/:id", get(handlers::a002_order::get_by_id))
        // ========================================
        // SETTLEMENT
        // ========================================
        .route(
            "/api/settlement/payment-confirmation",
            post(handlers::settlement::payment_confirmation),
        )
        .route(
            "/api/settlement/release/:order_id",
            post(handlers::settlement::release),
        )
        .route(
            "/api/settlement/refund-order/:order_id",
            post(handlers::settlement::refund_order),
        )
        .route(
            "/api/settlement/refund-store-order/:store_order_id",
            post(handlers::settlement::refund_store_order),
        )
        // ========================================
        // DELIVERY & SHIPPING FEES (carrier signals)
        // ========================================
        .route(
            "/api/delivery/confirmation",
            post(handlers::a003_store_order::delivery_confirmation),
        )
        .route(
            "/api/shipping-fee/reconciliation",
            post(handlers::a007_shipping_fee::reconciliation),
        )
        // ========================================
        // CANCELLATION
        // ========================================
        .route(
            "/api/cancellation/order/:order_id",
            post(handlers::a003_store_order::customer_cancel),
        )
        .route(
            "/api/cancellation/store-order/:store_order_id/request",
            post(handlers::a003_store_order::request_cancel),
        )
        .route(
            "/api/cancellation/store-order/:store_order_id/approve",
            post(handlers::a003_store_order::approve_cancel),
        )
        .route(
            "/api/cancellation/store-order/:store_order_id/reject",
            post(handlers::a003_store_order::reject_cancel),
        )
        // ========================================
        // RETURNS
        // ========================================
        .route("/api/returns", post(handlers::a005_return_request::create))
        .route(
            "/api/returns/status-change",
            post(handlers::a005_return_request::status_change),
        )
        .route(
            "/api/returns/auto-refund",
            post(handlers::a005_return_request::auto_refund),
        )
        .route(
            "/api/returns/:id",
            get(handlers::a005_return_request::get_by_id),
        )
        .route(
            "/api/returns/:id/shop-action",
            post(handlers::a005_return_request::shop_action),
        )
        .route(
            "/api/returns/:id/resolve",
            post(handlers::a005_return_request::resolve),
        )
        // ========================================
        // PAYOUT BILLS
        // ========================================
        .route(
            "/api/payout-bills/create/:store_ref",
            post(handlers::a006_payout_bill::create_for_store),
        )
        .route(
            "/api/payout-bills/get-or-create/:store_ref",
            get(handlers::a006_payout_bill::get_or_create),
        )
        .route(
            "/api/payout-bills/store/:store_ref",
            get(handlers::a006_payout_bill::list_by_store),
        )
        .route(
            "/api/payout-bills/:id",
            get(handlers::a006_payout_bill::get_by_id),
        )
        .route(
            "/api/payout-bills/:id/mark-paid",
            post(handlers::a006_payout_bill::mark_paid),
        )
        // ========================================
        // SWEEPS (on-demand) & SYSTEM
        // ========================================
        .route(
            "/api/sweeps/eligibility",
            post(handlers::sweeps::run_eligibility),
        )
        .route(
            "/api/sweeps/auto-bills",
            post(handlers::sweeps::run_auto_bills),
        )
        .route("/api/sys/tasks", get(handlers::sys_tasks::list))
        .layer(middleware::from_fn(
            system::middleware::request_logger::request_logger,
        ))
        .layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], config.server.port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    config.server.port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", config.server.port, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
