use crate::domain::common::{
    AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, EventStore, Origin,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShippingFeeId(pub Uuid);

impl ShippingFeeId {
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

impl AggregateId for ShippingFeeId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ShippingFeeId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Перерасход доставки по подзаказу (агрегат).
///
/// Создаётся при сверке фактического тарифа службы доставки:
/// extra_for_store = max(actual - estimated, 0), относится на магазин
/// при формировании счёта на выплату.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingFee {
    #[serde(flatten)]
    pub base: BaseAggregate<ShippingFeeId>,

    #[serde(rename = "storeOrderRef")]
    pub store_order_ref: String,
    #[serde(rename = "storeRef")]
    pub store_ref: String,

    #[serde(rename = "estimatedFee")]
    pub estimated_fee: f64,
    #[serde(rename = "actualFee")]
    pub actual_fee: f64,
    #[serde(rename = "extraForStore")]
    pub extra_for_store: f64,

    #[serde(rename = "paidByShop")]
    pub paid_by_shop: bool,
    #[serde(rename = "payoutBillRef")]
    pub payout_bill_ref: Option<String>,
}

impl ShippingFee {
    pub fn new_for_insert(
        code: String,
        store_order_ref: String,
        store_ref: String,
        estimated_fee: f64,
        actual_fee: f64,
        extra_for_store: f64,
    ) -> Self {
        let description = format!("Shipping fee {}", code);
        let base = BaseAggregate::new(ShippingFeeId::new_v4(), code, description);
        Self {
            base,
            store_order_ref,
            store_ref,
            estimated_fee,
            actual_fee,
            extra_for_store,
            paid_by_shop: false,
            payout_bill_ref: None,
        }
    }

    pub fn before_write(&mut self) {
        self.base.touch();
        self.base.metadata.increment_version();
    }
}

impl AggregateRoot for ShippingFee {
    type Id = ShippingFeeId;
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
        "a007"
    }
    fn collection_name() -> &'static str {
        "shipping_fee"
    }
    fn element_name() -> &'static str {
        "Перерасход доставки"
    }
    fn list_name() -> &'static str {
        "Перерасходы доставки"
    }
    fn origin() -> Origin {
        Origin::Carrier
    }
}

/// Сверка фактического тарифа от службы доставки
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingFeeReconciliationDto {
    #[serde(rename = "storeOrderId")]
    pub store_order_id: String,
    #[serde(rename = "actualFee")]
    pub actual_fee: f64,
}
