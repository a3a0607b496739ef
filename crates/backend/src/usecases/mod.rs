pub mod u501_payout_eligibility;
pub mod u502_auto_payout_bills;
pub mod u503_auto_refund_returns;
