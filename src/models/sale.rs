use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::cart::CartModel;

/// One line of the submission payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
pub struct SaleDetail {
    #[validate(length(min = 1, message = "Product id is required"))]
    pub id: String,

    #[validate(custom = "validate_name")]
    pub name: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,

    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Payload posted to the backend for a completed sale.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
pub struct SaleRecord {
    #[validate(length(min = 1, message = "A sale needs at least one line"))]
    pub details: Vec<SaleDetail>,

    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Debug, thiserror::Error)]
pub enum SaleError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("Product name is required"));
    }
    Ok(())
}

impl SaleRecord {
    /// Flatten the cart into the submission payload.
    pub fn from_cart(cart: &CartModel) -> Result<Self, SaleError> {
        let details = cart
            .entries()
            .iter()
            .map(|entry| SaleDetail {
                id: entry.product.id.clone(),
                name: entry.product.name.clone(),
                price: entry.product.unit_price,
                quantity: entry.product.quantity,
                discount: entry.discount_or_zero(),
                total: entry.total,
            })
            .collect();

        let record = Self {
            details,
            total: cart.grand_total(),
        };
        record.validate()?;
        for detail in &record.details {
            detail.validate()?;
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::{LineEntry, Product};
    use rust_decimal_macros::dec;

    fn product(id: &str, price: Decimal) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Item {}", id),
            price,
            quantity: 10,
        }
    }

    #[test]
    fn test_payload_shape() {
        let mut cart = CartModel::new();
        cart.upsert(LineEntry::from_product(0, &product("a", dec!(10)), 2, None));
        cart.upsert(LineEntry::from_product(
            1,
            &product("b", dec!(4.5)),
            2,
            Some(dec!(1)),
        ));

        let record = SaleRecord::from_cart(&cart).unwrap();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["total"], serde_json::json!(28.0));
        assert_eq!(json["details"][0]["discount"], serde_json::json!(0.0));
        assert_eq!(json["details"][1]["price"], serde_json::json!(4.5));
        assert_eq!(json["details"][1]["quantity"], serde_json::json!(2));
        assert_eq!(json["details"][1]["total"], serde_json::json!(8.0));
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let cart = CartModel::new();
        let result = SaleRecord::from_cart(&cart);
        assert!(matches!(result, Err(SaleError::ValidationError(_))));
    }

    #[test]
    fn test_zero_quantity_line_is_rejected() {
        let mut cart = CartModel::new();
        cart.upsert(LineEntry::from_product(0, &product("a", dec!(3)), 0, None));
        assert!(SaleRecord::from_cart(&cart).is_err());
    }
}
