use crate::domain::common::{
    AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, EventStore, Origin,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderItemId(pub Uuid);

impl OrderItemId {
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

impl AggregateId for OrderItemId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(OrderItemId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Строка заказа (агрегат)
///
/// Флаги выплаты монотонны: eligible_for_payout, is_payout и is_returned
/// никогда не переходят из true обратно в false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(flatten)]
    pub base: BaseAggregate<OrderItemId>,

    #[serde(rename = "storeOrderRef")]
    pub store_order_ref: String,
    #[serde(rename = "orderRef")]
    pub order_ref: String,
    #[serde(rename = "storeRef")]
    pub store_ref: String,
    #[serde(rename = "productRef")]
    pub product_ref: String,

    pub quantity: i32,

    /// Валовая сумма строки
    #[serde(rename = "grossLineTotal")]
    pub gross_line_total: f64,

    /// Процент комиссии платформы для этой строки
    #[serde(rename = "platformFeePercentage")]
    pub platform_fee_percentage: f64,

    /// Сумма комиссии, зафиксированная при включении строки в счёт на выплату
    #[serde(rename = "platformFeeAmount")]
    pub platform_fee_amount: f64,

    /// Перерасход доставки, отнесённый на магазин (max(факт - оценка, 0))
    #[serde(rename = "shippingExtraForStore")]
    pub shipping_extra_for_store: f64,

    #[serde(rename = "costOfGoods")]
    pub cost_of_goods: f64,

    #[serde(rename = "deliveredAt")]
    pub delivered_at: Option<DateTime<Utc>>,

    #[serde(rename = "eligibleForPayout")]
    pub eligible_for_payout: bool,

    #[serde(rename = "isPayout")]
    pub is_payout: bool,

    #[serde(rename = "isReturned")]
    pub is_returned: bool,

    /// Счёт на выплату, в который включена строка
    #[serde(rename = "payoutBillRef")]
    pub payout_bill_ref: Option<String>,
}

impl OrderItem {
    #[allow(clippy::too_many_arguments)]
    pub fn new_for_insert(
        code: String,
        store_order_ref: String,
        order_ref: String,
        store_ref: String,
        product_ref: String,
        quantity: i32,
        gross_line_total: f64,
        platform_fee_percentage: f64,
        cost_of_goods: f64,
    ) -> Self {
        let description = format!("Order item {}", code);
        let base = BaseAggregate::new(OrderItemId::new_v4(), code, description);
        Self {
            base,
            store_order_ref,
            order_ref,
            store_ref,
            product_ref,
            quantity,
            gross_line_total,
            platform_fee_percentage,
            platform_fee_amount: 0.0,
            shipping_extra_for_store: 0.0,
            cost_of_goods,
            delivered_at: None,
            eligible_for_payout: false,
            is_payout: false,
            is_returned: false,
            payout_bill_ref: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.quantity <= 0 {
            return Err("Количество должно быть положительным".into());
        }
        if !self.gross_line_total.is_finite() || self.gross_line_total < 0.0 {
            return Err("Сумма строки должна быть неотрицательной".into());
        }
        if !(0.0..=100.0).contains(&self.platform_fee_percentage) {
            return Err("Процент комиссии должен быть в диапазоне 0..100".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
        self.base.metadata.increment_version();
    }
}

impl AggregateRoot for OrderItem {
    type Id = OrderItemId;
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
        "a004"
    }
    fn collection_name() -> &'static str {
        "order_item"
    }
    fn element_name() -> &'static str {
        "Строка заказа"
    }
    fn list_name() -> &'static str {
        "Строки заказов"
    }
    fn origin() -> Origin {
        Origin::Self_
    }
}
