use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Минимальный bootstrap схемы: все таблицы создаются здесь, миграций нет
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS a001_wallet (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL,
        comment TEXT,
        kind TEXT NOT NULL,
        owner_ref TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'ACTIVE',
        balance REAL NOT NULL DEFAULT 0,
        pending_balance REAL NOT NULL DEFAULT 0,
        available_balance REAL NOT NULL DEFAULT 0,
        deposit_balance REAL NOT NULL DEFAULT 0,
        total_revenue REAL NOT NULL DEFAULT 0,
        total_balance REAL NOT NULL DEFAULT 0,
        done_balance REAL NOT NULL DEFAULT 0,
        received_total REAL NOT NULL DEFAULT 0,
        refunded_total REAL NOT NULL DEFAULT 0,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        is_posted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0,
        UNIQUE (kind, owner_ref)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS p900_wallet_ledger (
        id TEXT PRIMARY KEY NOT NULL,
        wallet_ref TEXT NOT NULL,
        wallet_kind TEXT NOT NULL,
        bucket TEXT,
        amount REAL NOT NULL,
        kind TEXT NOT NULL,
        order_ref TEXT,
        dedup_key TEXT UNIQUE,
        balance_after REAL NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_p900_wallet_ref
        ON p900_wallet_ledger (wallet_ref);
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_p900_order_ref
        ON p900_wallet_ledger (order_ref);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a002_order (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL,
        comment TEXT,
        customer_ref TEXT NOT NULL,
        total_amount REAL NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'PENDING',
        settlement_state TEXT NOT NULL DEFAULT 'NONE',
        paid_at TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        is_posted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a003_store_order (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL,
        comment TEXT,
        order_ref TEXT NOT NULL,
        store_ref TEXT NOT NULL,
        subtotal REAL NOT NULL DEFAULT 0,
        shipping_fee_estimated REAL NOT NULL DEFAULT 0,
        delivered_at TEXT,
        status TEXT NOT NULL DEFAULT 'AWAITING_SHIPMENT',
        cancel_state TEXT NOT NULL DEFAULT 'NONE',
        settlement_refunded INTEGER NOT NULL DEFAULT 0,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        is_posted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_a003_order_ref
        ON a003_store_order (order_ref);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a004_order_item (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL,
        comment TEXT,
        store_order_ref TEXT NOT NULL,
        order_ref TEXT NOT NULL,
        store_ref TEXT NOT NULL,
        product_ref TEXT NOT NULL DEFAULT '',
        quantity INTEGER NOT NULL DEFAULT 1,
        gross_line_total REAL NOT NULL DEFAULT 0,
        platform_fee_percentage REAL NOT NULL DEFAULT 0,
        platform_fee_amount REAL NOT NULL DEFAULT 0,
        shipping_extra_for_store REAL NOT NULL DEFAULT 0,
        cost_of_goods REAL NOT NULL DEFAULT 0,
        delivered_at TEXT,
        eligible_for_payout INTEGER NOT NULL DEFAULT 0,
        is_payout INTEGER NOT NULL DEFAULT 0,
        is_returned INTEGER NOT NULL DEFAULT 0,
        payout_bill_ref TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        is_posted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_a004_order_ref
        ON a004_order_item (order_ref);
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_a004_store_ref
        ON a004_order_item (store_ref);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a005_return_request (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL,
        comment TEXT,
        order_item_ref TEXT NOT NULL,
        customer_ref TEXT NOT NULL,
        store_ref TEXT NOT NULL,
        amount REAL NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'PENDING',
        fault_type TEXT NOT NULL DEFAULT 'UNKNOWN',
        auto_refund_executed INTEGER NOT NULL DEFAULT 0,
        opened_at TEXT,
        dispute_opened_at TEXT,
        shop_responded_at TEXT,
        closed_at TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        is_posted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_a005_order_item_ref
        ON a005_return_request (order_item_ref);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a006_payout_bill (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL,
        comment TEXT,
        store_ref TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'PENDING',
        total_gross REAL NOT NULL DEFAULT 0,
        total_platform_fee REAL NOT NULL DEFAULT 0,
        total_shipping_order_fee REAL NOT NULL DEFAULT 0,
        total_return_shipping_fee REAL NOT NULL DEFAULT 0,
        total_net_payout REAL NOT NULL DEFAULT 0,
        payment_reference TEXT,
        receipt_url TEXT,
        note TEXT,
        paid_at TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        is_posted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a007_shipping_fee (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL,
        comment TEXT,
        store_order_ref TEXT NOT NULL,
        store_ref TEXT NOT NULL,
        estimated_fee REAL NOT NULL DEFAULT 0,
        actual_fee REAL NOT NULL DEFAULT 0,
        extra_for_store REAL NOT NULL DEFAULT 0,
        paid_by_shop INTEGER NOT NULL DEFAULT 0,
        payout_bill_ref TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        is_posted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a008_return_shipping_fee (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL,
        comment TEXT,
        return_request_ref TEXT NOT NULL,
        store_ref TEXT NOT NULL,
        amount REAL NOT NULL DEFAULT 0,
        paid_by_shop INTEGER NOT NULL DEFAULT 0,
        payout_bill_ref TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        is_posted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sys_tasks (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL DEFAULT '',
        description TEXT,
        task_type TEXT NOT NULL,
        schedule_cron TEXT,
        config_json TEXT,
        is_enabled INTEGER NOT NULL DEFAULT 1,
        last_run_at TEXT,
        next_run_at TEXT,
        last_run_status TEXT,
        last_run_log_file TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT
    );
    "#,
];

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/app.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;

    for ddl in SCHEMA {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            ddl.to_string(),
        ))
        .await?;
    }

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    tracing::info!("Database initialized at {}", db_url);
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}
