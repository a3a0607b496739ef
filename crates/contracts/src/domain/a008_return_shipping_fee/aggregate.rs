use crate::domain::common::{
    AggregateId, AggregateRoot, BaseAggregate, EntityMetadata, EventStore, Origin,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReturnShippingFeeId(pub Uuid);

impl ReturnShippingFeeId {
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

impl AggregateId for ReturnShippingFeeId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }
    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ReturnShippingFeeId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

/// Сбор за обратную доставку возврата, относимый на магазин (агрегат)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnShippingFee {
    #[serde(flatten)]
    pub base: BaseAggregate<ReturnShippingFeeId>,

    #[serde(rename = "returnRequestRef")]
    pub return_request_ref: String,
    #[serde(rename = "storeRef")]
    pub store_ref: String,

    pub amount: f64,

    #[serde(rename = "paidByShop")]
    pub paid_by_shop: bool,
    #[serde(rename = "payoutBillRef")]
    pub payout_bill_ref: Option<String>,
}

impl ReturnShippingFee {
    pub fn new_for_insert(
        code: String,
        return_request_ref: String,
        store_ref: String,
        amount: f64,
    ) -> Self {
        let description = format!("Return shipping fee {}", code);
        let base = BaseAggregate::new(ReturnShippingFeeId::new_v4(), code, description);
        Self {
            base,
            return_request_ref,
            store_ref,
            amount,
            paid_by_shop: false,
            payout_bill_ref: None,
        }
    }

    pub fn before_write(&mut self) {
        self.base.touch();
        self.base.metadata.increment_version();
    }
}

impl AggregateRoot for ReturnShippingFee {
    type Id = ReturnShippingFeeId;
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
        "a008"
    }
    fn collection_name() -> &'static str {
        "return_shipping_fee"
    }
    fn element_name() -> &'static str {
        "Сбор за обратную доставку"
    }
    fn list_name() -> &'static str {
        "Сборы за обратную доставку"
    }
    fn origin() -> Origin {
        Origin::Self_
    }
}
