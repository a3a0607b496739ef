pub mod common;
pub mod errors;

pub mod a001_wallet;
pub mod a002_order;
pub mod a003_store_order;
pub mod a004_order_item;
pub mod a005_return_request;
pub mod a006_payout_bill;
pub mod a007_shipping_fee;
pub mod a008_return_shipping_fee;
