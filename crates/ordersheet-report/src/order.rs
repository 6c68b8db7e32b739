//! The subset of the WooCommerce v3 order resource used by the report.
//!
//! Money fields arrive as decimal strings and are kept that way.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub id: u64,
    pub number: String,
    pub date_created: String,
    pub status: String,
    pub total: String,
    pub shipping_total: String,
    pub payment_method_title: String,
    pub line_items: Vec<LineItem>,
    pub shipping: ShippingAddress,
    pub billing: BillingAddress,
    pub shipping_lines: Vec<ShippingLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub total: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingAddress {
    pub city: String,
    pub state: String,
    pub postcode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingAddress {
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingLine {
    pub method_title: String,
}

impl Order {
    pub fn shipping_method(&self) -> &str {
        self.shipping_lines
            .first()
            .map(|line| line.method_title.as_str())
            .unwrap_or("")
    }
}
