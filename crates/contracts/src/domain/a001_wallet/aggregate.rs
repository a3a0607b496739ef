use crate::domain::common::{
    AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, EventStore, Origin,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ID типа для кошелька
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletId(pub Uuid);

impl WalletId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for WalletId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(WalletId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Вид кошелька: покупатель, магазин или платформа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletKind {
    Customer,
    Store,
    Platform,
}

impl WalletKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::Customer => "CUSTOMER",
            WalletKind::Store => "STORE",
            WalletKind::Platform => "PLATFORM",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "CUSTOMER" => Ok(WalletKind::Customer),
            "STORE" => Ok(WalletKind::Store),
            "PLATFORM" => Ok(WalletKind::Platform),
            other => Err(format!("Unknown wallet kind: {}", other)),
        }
    }
}

impl std::fmt::Display for WalletKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Статус кошелька
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletStatus {
    Active,
    Locked,
}

impl WalletStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletStatus::Active => "ACTIVE",
            WalletStatus::Locked => "LOCKED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "ACTIVE" => Ok(WalletStatus::Active),
            "LOCKED" => Ok(WalletStatus::Locked),
            other => Err(format!("Unknown wallet status: {}", other)),
        }
    }
}

/// Именованная корзина баланса внутри кошелька.
///
/// Семантика зависит от вида кошелька: у покупателя только `Balance`,
/// у магазина удержанные/доступные/залоговые средства и валовая выручка,
/// у платформы — агрегатные корзины приёма и выплат.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BalanceBucket {
    /// Доступно к трате сейчас (покупатель)
    Balance,
    /// Удержано, ещё не доступно к выплате (магазин, платформа)
    PendingBalance,
    /// Прошло окно удержания, не выплачено (магазин)
    AvailableBalance,
    /// Залог (магазин, проверки COD)
    DepositBalance,
    /// Валовая выручка за всё время (магазин)
    TotalRevenue,
    /// Общий остаток платформы
    TotalBalance,
    /// Высвобождено после окна удержания (платформа)
    DoneBalance,
    /// Всего принято платёжных подтверждений (платформа)
    ReceivedTotal,
    /// Всего возвращено покупателям (платформа)
    RefundedTotal,
}

impl BalanceBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceBucket::Balance => "balance",
            BalanceBucket::PendingBalance => "pending_balance",
            BalanceBucket::AvailableBalance => "available_balance",
            BalanceBucket::DepositBalance => "deposit_balance",
            BalanceBucket::TotalRevenue => "total_revenue",
            BalanceBucket::TotalBalance => "total_balance",
            BalanceBucket::DoneBalance => "done_balance",
            BalanceBucket::ReceivedTotal => "received_total",
            BalanceBucket::RefundedTotal => "refunded_total",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "balance" => Ok(BalanceBucket::Balance),
            "pending_balance" => Ok(BalanceBucket::PendingBalance),
            "available_balance" => Ok(BalanceBucket::AvailableBalance),
            "deposit_balance" => Ok(BalanceBucket::DepositBalance),
            "total_revenue" => Ok(BalanceBucket::TotalRevenue),
            "total_balance" => Ok(BalanceBucket::TotalBalance),
            "done_balance" => Ok(BalanceBucket::DoneBalance),
            "received_total" => Ok(BalanceBucket::ReceivedTotal),
            "refunded_total" => Ok(BalanceBucket::RefundedTotal),
            other => Err(format!("Unknown balance bucket: {}", other)),
        }
    }
}

impl std::fmt::Display for BalanceBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Кошелёк (агрегат)
///
/// Одна запись на пару (вид, владелец). Все корзины хранятся в одной
/// строке; неиспользуемые для данного вида корзины остаются нулевыми.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(flatten)]
    pub base: BaseAggregate<WalletId>,

    /// Вид кошелька
    pub kind: WalletKind,

    /// Ссылка на владельца (customer id, store id или "platform")
    #[serde(rename = "ownerRef")]
    pub owner_ref: String,

    /// Статус (LOCKED отклоняет любые корректировки)
    pub status: WalletStatus,

    pub balance: f64,
    #[serde(rename = "pendingBalance")]
    pub pending_balance: f64,
    #[serde(rename = "availableBalance")]
    pub available_balance: f64,
    #[serde(rename = "depositBalance")]
    pub deposit_balance: f64,
    #[serde(rename = "totalRevenue")]
    pub total_revenue: f64,
    #[serde(rename = "totalBalance")]
    pub total_balance: f64,
    #[serde(rename = "doneBalance")]
    pub done_balance: f64,
    #[serde(rename = "receivedTotal")]
    pub received_total: f64,
    #[serde(rename = "refundedTotal")]
    pub refunded_total: f64,
}

impl Wallet {
    pub fn new_for_insert(kind: WalletKind, owner_ref: String) -> Self {
        let code = format!("WLT-{}-{}", kind.as_str(), &owner_ref);
        let description = format!("{} wallet for {}", kind.as_str(), owner_ref);
        let base = BaseAggregate::new(WalletId::new_v4(), code, description);
        Self {
            base,
            kind,
            owner_ref,
            status: WalletStatus::Active,
            balance: 0.0,
            pending_balance: 0.0,
            available_balance: 0.0,
            deposit_balance: 0.0,
            total_revenue: 0.0,
            total_balance: 0.0,
            done_balance: 0.0,
            received_total: 0.0,
            refunded_total: 0.0,
        }
    }

    /// Текущее значение корзины
    pub fn bucket_value(&self, bucket: BalanceBucket) -> f64 {
        match bucket {
            BalanceBucket::Balance => self.balance,
            BalanceBucket::PendingBalance => self.pending_balance,
            BalanceBucket::AvailableBalance => self.available_balance,
            BalanceBucket::DepositBalance => self.deposit_balance,
            BalanceBucket::TotalRevenue => self.total_revenue,
            BalanceBucket::TotalBalance => self.total_balance,
            BalanceBucket::DoneBalance => self.done_balance,
            BalanceBucket::ReceivedTotal => self.received_total,
            BalanceBucket::RefundedTotal => self.refunded_total,
        }
    }

    /// Записать новое значение корзины
    pub fn set_bucket_value(&mut self, bucket: BalanceBucket, value: f64) {
        match bucket {
            BalanceBucket::Balance => self.balance = value,
            BalanceBucket::PendingBalance => self.pending_balance = value,
            BalanceBucket::AvailableBalance => self.available_balance = value,
            BalanceBucket::DepositBalance => self.deposit_balance = value,
            BalanceBucket::TotalRevenue => self.total_revenue = value,
            BalanceBucket::TotalBalance => self.total_balance = value,
            BalanceBucket::DoneBalance => self.done_balance = value,
            BalanceBucket::ReceivedTotal => self.received_total = value,
            BalanceBucket::RefundedTotal => self.refunded_total = value,
        }
    }

    pub fn before_write(&mut self) {
        self.base.touch();
        self.base.metadata.increment_version();
    }
}

impl AggregateRoot for Wallet {
    type Id = WalletId;
    fn id(&self) -> Self::Id {
        self.base.id
    }
    fn code(&self) -> &str {
        &self.base.code
    }
    fn description(&self) -> &str {
        &self.base.description
    }
    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }
    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }
    fn events(&self) -> &EventStore {
        &self.base.events
    }
    fn events_mut(&mut self) -> &mut EventStore {
        &mut self.base.events
    }
    fn aggregate_index() -> &'static str {
        "a001"
    }
    fn collection_name() -> &'static str {
        "wallet"
    }
    fn element_name() -> &'static str {
        "Кошелёк"
    }
    fn list_name() -> &'static str {
        "Кошельки"
    }
    fn origin() -> Origin {
        Origin::Self_
    }
}

// =============================================================================
// DTO
// =============================================================================

/// Сводка по корзинам кошелька для API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSummaryDto {
    pub id: String,
    pub kind: String,
    #[serde(rename = "ownerRef")]
    pub owner_ref: String,
    pub status: String,
    pub balance: f64,
    #[serde(rename = "pendingBalance")]
    pub pending_balance: f64,
    #[serde(rename = "availableBalance")]
    pub available_balance: f64,
    #[serde(rename = "depositBalance")]
    pub deposit_balance: f64,
    #[serde(rename = "totalRevenue")]
    pub total_revenue: f64,
    #[serde(rename = "totalBalance")]
    pub total_balance: f64,
    #[serde(rename = "doneBalance")]
    pub done_balance: f64,
    #[serde(rename = "receivedTotal")]
    pub received_total: f64,
    #[serde(rename = "refundedTotal")]
    pub refunded_total: f64,
}

impl From<&Wallet> for WalletSummaryDto {
    fn from(w: &Wallet) -> Self {
        Self {
            id: w.base.id.as_string(),
            kind: w.kind.as_str().to_string(),
            owner_ref: w.owner_ref.clone(),
            status: w.status.as_str().to_string(),
            balance: w.balance,
            pending_balance: w.pending_balance,
            available_balance: w.available_balance,
            deposit_balance: w.deposit_balance,
            total_revenue: w.total_revenue,
            total_balance: w.total_balance,
            done_balance: w.done_balance,
            received_total: w.received_total,
            refunded_total: w.refunded_total,
        }
    }
}
