use crate::domain::common::{
    AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, EventStore, Origin,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayoutBillId(pub Uuid);

impl PayoutBillId {
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

impl AggregateId for PayoutBillId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(PayoutBillId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Статус счёта: PENDING → PAID ровно один раз
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutBillStatus {
    Pending,
    Paid,
}

impl PayoutBillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutBillStatus::Pending => "PENDING",
            PayoutBillStatus::Paid => "PAID",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "PENDING" => Ok(PayoutBillStatus::Pending),
            "PAID" => Ok(PayoutBillStatus::Paid),
            other => Err(format!("Unknown payout bill status: {}", other)),
        }
    }
}

/// Счёт на выплату магазину (агрегат)
///
/// Состав счёта фиксируется при создании: включённые строки и сборы несут
/// payout_bill_ref на себе, их набор после создания не меняется.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutBill {
    #[serde(flatten)]
    pub base: BaseAggregate<PayoutBillId>,

    #[serde(rename = "storeRef")]
    pub store_ref: String,

    pub status: PayoutBillStatus,

    /// Валовая сумма включённых строк
    #[serde(rename = "totalGross")]
    pub total_gross: f64,
    /// Суммарная комиссия платформы
    #[serde(rename = "totalPlatformFee")]
    pub total_platform_fee: f64,
    /// Перерасход доставки заказов, относимый на магазин
    #[serde(rename = "totalShippingOrderFee")]
    pub total_shipping_order_fee: f64,
    /// Сборы за обратную доставку возвратов
    #[serde(rename = "totalReturnShippingFee")]
    pub total_return_shipping_fee: f64,
    /// Итог к выплате: gross - комиссия - доставка - обратная доставка
    #[serde(rename = "totalNetPayout")]
    pub total_net_payout: f64,

    #[serde(rename = "paymentReference")]
    pub payment_reference: Option<String>,
    #[serde(rename = "receiptUrl")]
    pub receipt_url: Option<String>,
    pub note: Option<String>,
    #[serde(rename = "paidAt")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl PayoutBill {
    pub fn new_for_insert(code: String, store_ref: String) -> Self {
        let description = format!("Payout bill {}", code);
        let base = BaseAggregate::new(PayoutBillId::new_v4(), code, description);
        Self {
            base,
            store_ref,
            status: PayoutBillStatus::Pending,
            total_gross: 0.0,
            total_platform_fee: 0.0,
            total_shipping_order_fee: 0.0,
            total_return_shipping_fee: 0.0,
            total_net_payout: 0.0,
            payment_reference: None,
            receipt_url: None,
            note: None,
            paid_at: None,
        }
    }

    pub fn before_write(&mut self) {
        self.base.touch();
        self.base.metadata.increment_version();
    }
}

impl AggregateRoot for PayoutBill {
    type Id = PayoutBillId;
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
        "a006"
    }
    fn collection_name() -> &'static str {
        "payout_bill"
    }
    fn element_name() -> &'static str {
        "Счёт на выплату"
    }
    fn list_name() -> &'static str {
        "Счета на выплату"
    }
    fn origin() -> Origin {
        Origin::Self_
    }
}

// =============================================================================
// DTO
// =============================================================================

/// Отметка счёта оплаченным
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkBillPaidDto {
    pub reference: String,
    #[serde(rename = "receiptUrl")]
    pub receipt_url: Option<String>,
    pub note: Option<String>,
}

/// Счёт вместе с составом для API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutBillDetailDto {
    pub bill: PayoutBill,
    #[serde(rename = "itemRefs")]
    pub item_refs: Vec<String>,
    #[serde(rename = "shippingFeeRefs")]
    pub shipping_fee_refs: Vec<String>,
    #[serde(rename = "returnShippingFeeRefs")]
    pub return_shipping_fee_refs: Vec<String>,
}
