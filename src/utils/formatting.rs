use chrono::{DateTime, Local};
use console::style;
use rust_decimal::{Decimal, RoundingStrategy};
use tabled::{
    settings::{Alignment, Style},
    Table, Tabled,
};

use crate::models::{CartModel, Product};

#[derive(Tabled)]
struct CatalogTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Stock")]
    stock: String,
}

#[derive(Tabled)]
struct CartTableRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Product")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Discount")]
    discount: String,
    #[tabled(rename = "Total")]
    total: String,
}

pub fn format_catalog_table(products: &[Product]) -> String {
    if products.is_empty() {
        return String::new();
    }

    let rows: Vec<CatalogTableRow> = products
        .iter()
        .map(|product| CatalogTableRow {
            id: product.id.clone(),
            name: truncate(&product.name, 30),
            price: format_money(product.price),
            stock: if product.is_in_stock() {
                product.quantity.to_string()
            } else {
                style("out").red().to_string()
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded()).with(Alignment::left());

    table.to_string()
}

pub fn format_cart_table(cart: &CartModel) -> String {
    if cart.is_empty() {
        return String::new();
    }

    let rows: Vec<CartTableRow> = cart
        .entries()
        .iter()
        .enumerate()
        .map(|(position, entry)| CartTableRow {
            position: position + 1,
            name: truncate(&entry.product.name, 30),
            price: format_money(entry.product.unit_price),
            quantity: if entry.is_zero_quantity() {
                style("0").red().to_string()
            } else {
                entry.product.quantity.to_string()
            },
            discount: entry
                .discount
                .map(format_money)
                .unwrap_or_else(|| "-".to_string()),
            total: format_money(entry.total),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded()).with(Alignment::left());

    table.to_string()
}

pub fn format_grand_total(cart: &CartModel) -> String {
    let total = style(format_money(cart.grand_total())).bold();
    if cart.is_invalid() {
        format!("{}: {} {}", style("Grand Total").bold(), total, style("(invalid lines)").red())
    } else {
        format!("{}: {}", style("Grand Total").bold(), total.green())
    }
}

/// Two decimal places, rounded half away from zero.
pub fn format_money(amount: Decimal) -> String {
    format!(
        "{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

pub fn format_date(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_money_pads_and_rounds() {
        assert_eq!(format_money(dec!(20)), "20.00");
        assert_eq!(format_money(dec!(3.455)), "3.46");
        assert_eq!(format_money(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_truncate_long_names() {
        let name = "A very long product name that keeps going";
        let short = truncate(name, 30);
        assert_eq!(short.chars().count(), 30);
        assert!(short.ends_with("..."));
    }

    #[test]
    fn test_empty_tables_render_nothing() {
        assert!(format_catalog_table(&[]).is_empty());
        assert!(format_cart_table(&CartModel::new()).is_empty());
    }
}
