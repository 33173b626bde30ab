//! The strongly-typed order intent.
//!
//! The checkout flow serializes the prospective order into the co-payment record as JSON. This
//! module is the only place that shape is interpreted. Parsing and validation happen before any
//! other component relies on the payload, so a malformed intent is caught at a single boundary.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use spg_common::Money;

use crate::{db_types::CustomerDetails, traits::SettlementError};

/// Orders are delivered three hours after payment completion unless the intent says otherwise.
const DEFAULT_DELIVERY_LEAD_HOURS: i64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntent {
    pub customer: CustomerDetails,
    pub items: Vec<IntentItem>,
    pub delivery_address: String,
    #[serde(default)]
    pub delivery_fee: Option<Money>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentItem {
    pub vendor_id: Option<i64>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderIntent {
    /// Parses the serialized intent stored on a co-payment record.
    pub fn from_json(raw: &str) -> Result<Self, SettlementError> {
        serde_json::from_str(raw).map_err(|e| SettlementError::DataIntegrity(format!("unparseable order intent: {e}")))
    }

    /// Checks that the intent can be turned into an order, returning the vendor that will fulfil
    /// it. The marketplace assigns one vendor per order, so every line item must carry the same
    /// resolvable vendor id.
    pub fn resolve_vendor(&self) -> Result<i64, SettlementError> {
        let first = self
            .items
            .first()
            .ok_or_else(|| SettlementError::DataIntegrity("order intent has no line items".to_string()))?;
        let vendor_id = first
            .vendor_id
            .ok_or_else(|| SettlementError::DataIntegrity("line item has no vendor id".to_string()))?;
        if self.items.iter().any(|i| i.vendor_id != Some(vendor_id)) {
            return Err(SettlementError::DataIntegrity("line items span multiple vendors".to_string()));
        }
        Ok(vendor_id)
    }

    /// The delivery estimate from the intent, or "now + 3 hours" when the checkout did not set one.
    pub fn delivery_estimate(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.estimated_delivery.unwrap_or(now + Duration::hours(DEFAULT_DELIVERY_LEAD_HOURS))
    }

    pub fn line_items_json(&self) -> String {
        serde_json::to_string(&self.items).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};
    use spg_common::Money;

    use super::{IntentItem, OrderIntent};
    use crate::{db_types::CustomerDetails, traits::SettlementError};

    fn intent_with_items(items: Vec<IntentItem>) -> OrderIntent {
        OrderIntent {
            customer: CustomerDetails {
                email: "alice@example.com".to_string(),
                name: "Alice".to_string(),
                phone: String::new(),
            },
            items,
            delivery_address: "12 Baker St".to_string(),
            delivery_fee: None,
            estimated_delivery: None,
        }
    }

    fn item(vendor_id: Option<i64>) -> IntentItem {
        IntentItem { vendor_id, name: "Chocolate truffle".to_string(), quantity: 1, unit_price: Money::from_minor(45_000) }
    }

    #[test]
    fn vendor_resolution_requires_at_least_one_item() {
        let intent = intent_with_items(vec![]);
        assert!(matches!(intent.resolve_vendor(), Err(SettlementError::DataIntegrity(_))));
    }

    #[test]
    fn vendor_resolution_requires_a_vendor_id() {
        let intent = intent_with_items(vec![item(None)]);
        assert!(matches!(intent.resolve_vendor(), Err(SettlementError::DataIntegrity(_))));
    }

    #[test]
    fn vendor_resolution_rejects_mixed_vendors() {
        let intent = intent_with_items(vec![item(Some(1)), item(Some(2))]);
        assert!(matches!(intent.resolve_vendor(), Err(SettlementError::DataIntegrity(_))));
    }

    #[test]
    fn vendor_resolution_happy_path() {
        let intent = intent_with_items(vec![item(Some(7)), item(Some(7))]);
        assert_eq!(intent.resolve_vendor().unwrap(), 7);
    }

    #[test]
    fn delivery_estimate_defaults_to_three_hours() {
        let now = Utc::now();
        let intent = intent_with_items(vec![item(Some(1))]);
        assert_eq!(intent.delivery_estimate(now), now + Duration::hours(3));
        let mut pinned = intent;
        let explicit = now + Duration::hours(26);
        pinned.estimated_delivery = Some(explicit);
        assert_eq!(pinned.delivery_estimate(now), explicit);
    }

    #[test]
    fn malformed_json_is_a_data_integrity_error() {
        assert!(matches!(OrderIntent::from_json("{not json"), Err(SettlementError::DataIntegrity(_))));
    }
}
