use crate::domain::common::{
    AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, EventStore, Origin,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreOrderId(pub Uuid);

impl StoreOrderId {
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

impl AggregateId for StoreOrderId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(StoreOrderId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Статус подзаказа магазина
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreOrderStatus {
    AwaitingShipment,
    Shipping,
    Delivered,
    Completed,
    Cancelled,
}

impl StoreOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOrderStatus::AwaitingShipment => "AWAITING_SHIPMENT",
            StoreOrderStatus::Shipping => "SHIPPING",
            StoreOrderStatus::Delivered => "DELIVERED",
            StoreOrderStatus::Completed => "COMPLETED",
            StoreOrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "AWAITING_SHIPMENT" => Ok(StoreOrderStatus::AwaitingShipment),
            "SHIPPING" => Ok(StoreOrderStatus::Shipping),
            "DELIVERED" => Ok(StoreOrderStatus::Delivered),
            "COMPLETED" => Ok(StoreOrderStatus::Completed),
            "CANCELLED" => Ok(StoreOrderStatus::Cancelled),
            other => Err(format!("Unknown store order status: {}", other)),
        }
    }
}

/// Состояние запроса отмены подзаказа.
///
/// Войти в REQUESTED можно только из AWAITING_SHIPMENT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelRequestState {
    None,
    Requested,
    Approved,
    Rejected,
}

impl CancelRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelRequestState::None => "NONE",
            CancelRequestState::Requested => "REQUESTED",
            CancelRequestState::Approved => "APPROVED",
            CancelRequestState::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "NONE" => Ok(CancelRequestState::None),
            "REQUESTED" => Ok(CancelRequestState::Requested),
            "APPROVED" => Ok(CancelRequestState::Approved),
            "REJECTED" => Ok(CancelRequestState::Rejected),
            other => Err(format!("Unknown cancel request state: {}", other)),
        }
    }
}

/// Подзаказ магазина (агрегат): часть заказа, которую поставляет один магазин
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOrder {
    #[serde(flatten)]
    pub base: BaseAggregate<StoreOrderId>,

    #[serde(rename = "orderRef")]
    pub order_ref: String,

    #[serde(rename = "storeRef")]
    pub store_ref: String,

    /// Сумма строк этого магазина
    pub subtotal: f64,

    /// Оценка стоимости доставки на момент оформления
    #[serde(rename = "shippingFeeEstimated")]
    pub shipping_fee_estimated: f64,

    #[serde(rename = "deliveredAt")]
    pub delivered_at: Option<DateTime<Utc>>,

    pub status: StoreOrderStatus,

    #[serde(rename = "cancelState")]
    pub cancel_state: CancelRequestState,

    /// Распределение этого подзаказа уже реверсировано (refund_store_part)
    #[serde(rename = "settlementRefunded")]
    pub settlement_refunded: bool,
}

impl StoreOrder {
    pub fn new_for_insert(
        code: String,
        order_ref: String,
        store_ref: String,
        subtotal: f64,
        shipping_fee_estimated: f64,
    ) -> Self {
        let description = format!("Store order {}", code);
        let base = BaseAggregate::new(StoreOrderId::new_v4(), code, description);
        Self {
            base,
            order_ref,
            store_ref,
            subtotal,
            shipping_fee_estimated,
            delivered_at: None,
            status: StoreOrderStatus::AwaitingShipment,
            cancel_state: CancelRequestState::None,
            settlement_refunded: false,
        }
    }

    pub fn before_write(&mut self) {
        self.base.touch();
        self.base.metadata.increment_version();
    }
}

impl AggregateRoot for StoreOrder {
    type Id = StoreOrderId;
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
        "a003"
    }
    fn collection_name() -> &'static str {
        "store_order"
    }
    fn element_name() -> &'static str {
        "Подзаказ магазина"
    }
    fn list_name() -> &'static str {
        "Подзаказы магазинов"
    }
    fn origin() -> Origin {
        Origin::Self_
    }
}

// =============================================================================
// DTO
// =============================================================================

/// Подтверждение вручения от службы доставки (webhook)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfirmationDto {
    #[serde(rename = "storeOrderId")]
    pub store_order_id: String,
    #[serde(rename = "deliveredAt")]
    pub delivered_at: DateTime<Utc>,
}
