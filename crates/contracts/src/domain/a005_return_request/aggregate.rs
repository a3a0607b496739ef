use crate::domain::common::{
    AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, EventStore, Origin,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReturnRequestId(pub Uuid);

impl ReturnRequestId {
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

impl AggregateId for ReturnRequestId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ReturnRequestId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Статус заявки на возврат
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnStatus {
    Pending,
    Approved,
    Shipping,
    Dispute,
    Refunded,
    Rejected,
    AutoRefunded,
    Canceled,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Pending => "PENDING",
            ReturnStatus::Approved => "APPROVED",
            ReturnStatus::Shipping => "SHIPPING",
            ReturnStatus::Dispute => "DISPUTE",
            ReturnStatus::Refunded => "REFUNDED",
            ReturnStatus::Rejected => "REJECTED",
            ReturnStatus::AutoRefunded => "AUTO_REFUNDED",
            ReturnStatus::Canceled => "CANCELED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "PENDING" => Ok(ReturnStatus::Pending),
            "APPROVED" => Ok(ReturnStatus::Approved),
            "SHIPPING" => Ok(ReturnStatus::Shipping),
            "DISPUTE" => Ok(ReturnStatus::Dispute),
            "REFUNDED" => Ok(ReturnStatus::Refunded),
            "REJECTED" => Ok(ReturnStatus::Rejected),
            "AUTO_REFUNDED" => Ok(ReturnStatus::AutoRefunded),
            "CANCELED" => Ok(ReturnStatus::Canceled),
            other => Err(format!("Unknown return status: {}", other)),
        }
    }

    /// Терминальный статус: заявка закрыта, дальнейшие действия невозможны
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReturnStatus::Refunded
                | ReturnStatus::Rejected
                | ReturnStatus::AutoRefunded
                | ReturnStatus::Canceled
        )
    }

    /// Статус, при котором возврат денег покупателю состоялся
    pub fn is_refunded(&self) -> bool {
        matches!(self, ReturnStatus::Refunded | ReturnStatus::AutoRefunded)
    }

    /// Активная заявка блокирует допуск строки к выплате.
    /// Не блокируют только CANCELED и REJECTED (исход в пользу магазина).
    pub fn blocks_payout(&self) -> bool {
        !matches!(self, ReturnStatus::Canceled | ReturnStatus::Rejected)
    }
}

/// Чья вина в возврате: определяет, за чей счёт идёт реверс после релиза
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultType {
    Customer,
    Shop,
    Unknown,
}

impl FaultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultType::Customer => "CUSTOMER",
            FaultType::Shop => "SHOP",
            FaultType::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "CUSTOMER" => Ok(FaultType::Customer),
            "SHOP" => Ok(FaultType::Shop),
            "UNKNOWN" => Ok(FaultType::Unknown),
            other => Err(format!("Unknown fault type: {}", other)),
        }
    }
}

/// Заявка на возврат (агрегат)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequest {
    #[serde(flatten)]
    pub base: BaseAggregate<ReturnRequestId>,

    #[serde(rename = "orderItemRef")]
    pub order_item_ref: String,
    #[serde(rename = "customerRef")]
    pub customer_ref: String,
    #[serde(rename = "storeRef")]
    pub store_ref: String,

    /// Сумма к возврату (валовая сумма строки)
    pub amount: f64,

    pub status: ReturnStatus,

    #[serde(rename = "faultType")]
    pub fault_type: FaultType,

    /// Флаг идемпотентности автоворзврата: повторный прогон sweep'а
    /// не должен кредитовать покупателя второй раз
    #[serde(rename = "autoRefundExecuted")]
    pub auto_refund_executed: bool,

    #[serde(rename = "openedAt")]
    pub opened_at: DateTime<Utc>,
    #[serde(rename = "disputeOpenedAt")]
    pub dispute_opened_at: Option<DateTime<Utc>>,
    #[serde(rename = "shopRespondedAt")]
    pub shop_responded_at: Option<DateTime<Utc>>,
    #[serde(rename = "closedAt")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl ReturnRequest {
    pub fn new_for_insert(
        code: String,
        order_item_ref: String,
        customer_ref: String,
        store_ref: String,
        amount: f64,
    ) -> Self {
        let description = format!("Return {}", code);
        let base = BaseAggregate::new(ReturnRequestId::new_v4(), code, description);
        Self {
            base,
            order_item_ref,
            customer_ref,
            store_ref,
            amount,
            status: ReturnStatus::Pending,
            fault_type: FaultType::Unknown,
            auto_refund_executed: false,
            opened_at: Utc::now(),
            dispute_opened_at: None,
            shop_responded_at: None,
            closed_at: None,
        }
    }

    pub fn before_write(&mut self) {
        self.base.touch();
        self.base.metadata.increment_version();
    }
}

impl AggregateRoot for ReturnRequest {
    type Id = ReturnRequestId;
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
        "a005"
    }
    fn collection_name() -> &'static str {
        "return_request"
    }
    fn element_name() -> &'static str {
        "Заявка на возврат"
    }
    fn list_name() -> &'static str {
        "Заявки на возврат"
    }
    fn origin() -> Origin {
        Origin::Self_
    }
}

// =============================================================================
// DTO
// =============================================================================

/// Изменение статуса возврата от внешней стороны
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnStatusChangeDto {
    #[serde(rename = "orderItemId")]
    pub order_item_id: String,
    pub status: String,
    #[serde(rename = "faultType")]
    pub fault_type: Option<String>,
}

/// Создание заявки на возврат
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequestCreateDto {
    #[serde(rename = "orderItemId")]
    pub order_item_id: String,
    pub comment: Option<String>,
}
