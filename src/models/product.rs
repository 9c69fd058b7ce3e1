use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog row as served by the backend. `quantity` is the stock level.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

impl Product {
    pub fn is_in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Product snapshot carried by a cart line. `quantity` is the amount being sold.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LineProduct {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// One product row in the cart.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LineEntry {
    pub index: usize,
    pub product: LineProduct,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub discount: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl LineEntry {
    /// Builds a line for `quantity` units of a catalog product.
    ///
    /// The discount is an absolute amount taken off the line; the total never
    /// goes below zero.
    pub fn from_product(
        index: usize,
        product: &Product,
        quantity: u32,
        discount: Option<Decimal>,
    ) -> Self {
        let line_product = LineProduct {
            id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
        };
        let total = line_total(line_product.unit_price, quantity, discount);

        Self {
            index,
            product: line_product,
            discount,
            total,
        }
    }

    pub fn is_zero_quantity(&self) -> bool {
        self.product.quantity == 0
    }

    /// Discount as sent to the backend: missing means zero.
    pub fn discount_or_zero(&self) -> Decimal {
        self.discount.unwrap_or(Decimal::ZERO)
    }
}

pub fn line_total(unit_price: Decimal, quantity: u32, discount: Option<Decimal>) -> Decimal {
    let gross = unit_price * Decimal::from(quantity);
    let net = gross - discount.unwrap_or(Decimal::ZERO);
    if net.is_sign_negative() || net.is_zero() {
        Decimal::ZERO
    } else {
        net
    }
}
