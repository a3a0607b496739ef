use serde::{Deserialize, Serialize};

/// Вид проводки в регистре кошелька
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerEntryKind {
    Hold,
    Release,
    Refund,
    Deposit,
    Withdraw,
    PendingHold,
    ReleasePending,
    Adjustment,
}

impl LedgerEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryKind::Hold => "HOLD",
            LedgerEntryKind::Release => "RELEASE",
            LedgerEntryKind::Refund => "REFUND",
            LedgerEntryKind::Deposit => "DEPOSIT",
            LedgerEntryKind::Withdraw => "WITHDRAW",
            LedgerEntryKind::PendingHold => "PENDING_HOLD",
            LedgerEntryKind::ReleasePending => "RELEASE_PENDING",
            LedgerEntryKind::Adjustment => "ADJUSTMENT",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "HOLD" => Ok(LedgerEntryKind::Hold),
            "RELEASE" => Ok(LedgerEntryKind::Release),
            "REFUND" => Ok(LedgerEntryKind::Refund),
            "DEPOSIT" => Ok(LedgerEntryKind::Deposit),
            "WITHDRAW" => Ok(LedgerEntryKind::Withdraw),
            "PENDING_HOLD" => Ok(LedgerEntryKind::PendingHold),
            "RELEASE_PENDING" => Ok(LedgerEntryKind::ReleasePending),
            "ADJUSTMENT" => Ok(LedgerEntryKind::Adjustment),
            other => Err(format!("Unknown ledger entry kind: {}", other)),
        }
    }
}

impl std::fmt::Display for LedgerEntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Запись регистра проводок кошелька (append-only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletLedgerEntryDto {
    pub id: String,
    #[serde(rename = "walletRef")]
    pub wallet_ref: String,
    #[serde(rename = "walletKind")]
    pub wallet_kind: String,
    /// Корзина баланса; None для информационных записей без влияния на баланс
    pub bucket: Option<String>,
    /// Подписанная дельта корзины
    pub amount: f64,
    pub kind: String,
    #[serde(rename = "orderRef")]
    pub order_ref: Option<String>,
    /// Значение корзины после применения проводки
    #[serde(rename = "balanceAfter")]
    pub balance_after: f64,
    pub description: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Запрос списка проводок с фильтром и пагинацией
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerListRequest {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    50
}

/// Ответ со списком проводок
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerListResponse {
    pub items: Vec<WalletLedgerEntryDto>,
    #[serde(rename = "totalCount")]
    pub total_count: u64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

/// Результат сверки: свёртка регистра против хранимых корзин
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerReplayReport {
    #[serde(rename = "walletRef")]
    pub wallet_ref: String,
    /// Корзины, где свёртка разошлась с хранимым значением
    pub mismatches: Vec<LedgerReplayMismatch>,
    #[serde(rename = "entriesReplayed")]
    pub entries_replayed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerReplayMismatch {
    pub bucket: String,
    pub replayed: f64,
    pub stored: f64,
}
