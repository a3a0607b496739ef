use chrono::{DateTime, Duration, Utc};
use contracts::domain::a004_order_item::aggregate::OrderItem;
use contracts::domain::errors::SettlementError;
use uuid::Uuid;

use super::repository;

pub async fn get_by_id(id: Uuid) -> Result<OrderItem, SettlementError> {
    repository::get_by_id(id)
        .await
        .map_err(SettlementError::Internal)?
        .ok_or_else(|| SettlementError::NotFound(format!("order item {}", id)))
}

/// Окно удержания истекло: delivered_at + hold_days <= now.
/// Граница строгая: ровно на границе окно считается истёкшим.
pub fn is_past_hold_window(
    delivered_at: DateTime<Utc>,
    hold_days: i64,
    now: DateTime<Utc>,
) -> bool {
    delivered_at + Duration::days(hold_days) <= now
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_one_second_short_of_window_is_not_eligible() {
        let now = Utc::now();
        let delivered = now - Duration::days(7) + Duration::seconds(1);
        assert!(!is_past_hold_window(delivered, 7, now));
    }

    #[test]
    fn item_one_second_past_window_is_eligible() {
        let now = Utc::now();
        let delivered = now - Duration::days(7) - Duration::seconds(1);
        assert!(is_past_hold_window(delivered, 7, now));
    }

    #[test]
    fn boundary_exactly_at_window_is_eligible() {
        let now = Utc::now();
        let delivered = now - Duration::days(7);
        assert!(is_past_hold_window(delivered, 7, now));
    }
}
