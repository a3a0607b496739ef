use crate::domain::common::{
    AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, EventStore, Origin,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ID типа для заказа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
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

impl AggregateId for OrderId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(OrderId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Статус родительского заказа.
///
/// Оплата статус не двигает: факт оплаты хранится в paid_at и
/// settlement_state, а PENDING значит "магазины ещё не взяли заказ в
/// работу" — именно в этом окне разрешена немедленная отмена покупателем.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("Unknown order status: {}", other)),
        }
    }
}

/// Явное состояние расчёта по заказу.
///
/// NONE → HELD → RELEASED | REFUNDED. Порядок операций расчёта проверяется
/// по этому полю, а не по наличию строк в регистре проводок.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementState {
    None,
    Held,
    Released,
    Refunded,
}

impl SettlementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementState::None => "NONE",
            SettlementState::Held => "HELD",
            SettlementState::Released => "RELEASED",
            SettlementState::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "NONE" => Ok(SettlementState::None),
            "HELD" => Ok(SettlementState::Held),
            "RELEASED" => Ok(SettlementState::Released),
            "REFUNDED" => Ok(SettlementState::Refunded),
            other => Err(format!("Unknown settlement state: {}", other)),
        }
    }
}

/// Заказ покупателя (агрегат)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(flatten)]
    pub base: BaseAggregate<OrderId>,

    /// Ссылка на покупателя
    #[serde(rename = "customerRef")]
    pub customer_ref: String,

    /// Сумма заказа == сумма gross_line_total всех строк (без доставки)
    #[serde(rename = "totalAmount")]
    pub total_amount: f64,

    pub status: OrderStatus,

    /// Состояние расчёта (см. SettlementState)
    #[serde(rename = "settlementState")]
    pub settlement_state: SettlementState,

    #[serde(rename = "paidAt")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new_for_insert(code: String, customer_ref: String, total_amount: f64) -> Self {
        let description = format!("Order {}", code);
        let base = BaseAggregate::new(OrderId::new_v4(), code, description);
        Self {
            base,
            customer_ref,
            total_amount,
            status: OrderStatus::Pending,
            settlement_state: SettlementState::None,
            paid_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.trim().is_empty() {
            return Err("Код заказа не может быть пустым".into());
        }
        if self.customer_ref.trim().is_empty() {
            return Err("Покупатель обязателен".into());
        }
        if !self.total_amount.is_finite() || self.total_amount < 0.0 {
            return Err("Сумма заказа должна быть неотрицательной".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
        self.base.metadata.increment_version();
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;
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
        "a002"
    }
    fn collection_name() -> &'static str {
        "order"
    }
    fn element_name() -> &'static str {
        "Заказ"
    }
    fn list_name() -> &'static str {
        "Заказы"
    }
    fn origin() -> Origin {
        Origin::Self_
    }
}

// =============================================================================
// DTO
// =============================================================================

/// Входящее подтверждение оплаты от платёжного шлюза (webhook)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmationDto {
    #[serde(rename = "customerId")]
    pub customer_id: String,
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "amountConfirmed")]
    pub amount_confirmed: f64,
    #[serde(rename = "resultCode")]
    pub result_code: String,
}

/// Строка заказа при приёме заказа (intake)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemIntakeDto {
    #[serde(rename = "productRef")]
    pub product_ref: String,
    pub quantity: i32,
    #[serde(rename = "grossLineTotal")]
    pub gross_line_total: f64,
    #[serde(rename = "platformFeePercentage")]
    pub platform_fee_percentage: Option<f64>,
    #[serde(rename = "costOfGoods")]
    pub cost_of_goods: f64,
}

/// Подзаказ магазина при приёме заказа
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOrderIntakeDto {
    #[serde(rename = "storeRef")]
    pub store_ref: String,
    #[serde(rename = "shippingFeeEstimated")]
    pub shipping_fee_estimated: f64,
    pub items: Vec<OrderItemIntakeDto>,
}

/// Приём заказа целиком: родительский заказ + подзаказы + строки
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntakeDto {
    pub code: Option<String>,
    #[serde(rename = "customerRef")]
    pub customer_ref: String,
    #[serde(rename = "storeOrders")]
    pub store_orders: Vec<StoreOrderIntakeDto>,
    pub comment: Option<String>,
}
