//! # Sale Creation Request
//!
//! The cart shape submitted to the sale transaction engine, plus its pure
//! shape validation. Existence and stock checks need the database and live
//! in the engine; everything checkable without I/O is checked here.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Request Types
// =============================================================================

/// One line of the submitted cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
    /// Caller-supplied unit price in cents. Snapshotted verbatim; later
    /// product edits never change it.
    pub unit_price_cents: i64,
}

/// The full sale-creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    /// Nullable - anonymous sales are permitted.
    pub customer_id: Option<String>,
    pub store_id: String,
    /// Lowercase payment token ("cash", "pix", "credit_card", ...).
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub total_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub tax_cents: i64,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_online_order: bool,
    pub items: Vec<CartLine>,
}

impl CreateSaleRequest {
    /// Validates the request shape.
    ///
    /// Order of checks is stable so the first violation reported is
    /// deterministic: store, items present, per-line quantity/price, then
    /// the money fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.store_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "storeId".to_string(),
            });
        }
        if self.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            });
        }
        if self.items.len() > MAX_CART_ITEMS {
            return Err(ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 1,
                max: MAX_CART_ITEMS as i64,
            });
        }
        for line in &self.items {
            if line.product_id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "items.productId".to_string(),
                });
            }
            if line.quantity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "items.quantity".to_string(),
                });
            }
            if line.quantity > MAX_ITEM_QUANTITY {
                return Err(ValidationError::OutOfRange {
                    field: "items.quantity".to_string(),
                    min: 1,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            if line.unit_price_cents < 0 {
                return Err(ValidationError::MustNotBeNegative {
                    field: "items.unitPrice".to_string(),
                });
            }
        }
        for (field, value) in [
            ("totalAmount", self.total_cents),
            ("discount", self.discount_cents),
            ("tax", self.tax_cents),
        ] {
            if value < 0 {
                return Err(ValidationError::MustNotBeNegative {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateSaleRequest {
        CreateSaleRequest {
            customer_id: None,
            store_id: "s1".to_string(),
            payment_method: "cash".to_string(),
            payment_reference: None,
            total_cents: 20_000,
            discount_cents: 0,
            tax_cents: 0,
            notes: None,
            is_online_order: false,
            items: vec![CartLine {
                product_id: "p1".to_string(),
                quantity: 2,
                unit_price_cents: 10_000,
            }],
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let mut req = request();
        req.items.clear();
        assert!(matches!(
            req.validate(),
            Err(ValidationError::Required { field }) if field == "items"
        ));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let mut req = request();
        req.items[0].quantity = 0;
        assert!(matches!(
            req.validate(),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_negative_money_rejected() {
        let mut req = request();
        req.discount_cents = -1;
        assert!(matches!(
            req.validate(),
            Err(ValidationError::MustNotBeNegative { field }) if field == "discount"
        ));
    }

    #[test]
    fn test_quantity_cap() {
        let mut req = request();
        req.items[0].quantity = MAX_ITEM_QUANTITY + 1;
        assert!(matches!(
            req.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
