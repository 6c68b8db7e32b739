//! Flattens orders into the fixed 22-column sheet.
//!
//! Each order contributes one row for its first line item carrying the
//! order-level fields, one row per further line item, and a closing shipping
//! row. Rows are numbered `1..=n` for the items and `n + 1` for shipping.

use std::fmt;

use tracing::warn;

use crate::order::{LineItem, Order};
use crate::{Error, Result};

/// Mexican VAT divisor applied to gross prices.
pub const VAT_FACTOR: f64 = 1.16;
pub const SHIPPING_SKU: &str = "E001";
pub const SHIPPING_DESCRIPTION: &str = "Envío";

pub const HEADERS: [&str; 22] = [
    "Número de Orden",
    "Hora Creación",
    "Estado del Pedido",
    "Orden",
    "Cantidad",
    "SKU",
    "Descripción",
    "Precio",
    "Envío",
    "Total",
    "Método de Pago",
    "Pedido",
    "Pre.sin IVA",
    "Clave Esquema Impuestos",
    "SKU",
    "Cantidad",
    "Álmacen",
    "Colonia",
    "Estado",
    "C.P.",
    "Teléfono",
    "Tipo Envío",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ReportCell {
    Text(String),
    Integer(i64),
    Number(f64),
    Blank,
}

impl ReportCell {
    fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// The constant `1` used for tax scheme, warehouse and shipping quantity.
    fn one() -> Self {
        Self::Integer(1)
    }
}

impl fmt::Display for ReportCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Blank => Ok(()),
        }
    }
}

pub type ReportRow = [ReportCell; 22];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSheet {
    rows: Vec<ReportRow>,
    skipped: Vec<u64>,
}

impl ReportSheet {
    pub fn headers(&self) -> &'static [&'static str; 22] {
        &HEADERS
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Ids of orders left out because they had no line items.
    pub fn skipped(&self) -> &[u64] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn build_sheet(orders: &[Order]) -> Result<ReportSheet> {
    let mut sheet = ReportSheet::default();
    for order in orders {
        if order.line_items.is_empty() {
            warn!(order_id = order.id, "Order has no line items, skipping");
            sheet.skipped.push(order.id);
            continue;
        }
        push_order(&mut sheet.rows, order)?;
    }
    Ok(sheet)
}

fn push_order(rows: &mut Vec<ReportRow>, order: &Order) -> Result<()> {
    let id = order_id(order)?;
    let mut items = order.line_items.iter();

    if let Some(first) = items.next() {
        rows.push([
            id.clone(),
            ReportCell::text(&order.date_created),
            ReportCell::text(&order.status),
            ReportCell::Integer(1),
            ReportCell::Integer(first.quantity),
            ReportCell::text(&first.sku),
            ReportCell::text(&first.name),
            ReportCell::text(&first.total),
            ReportCell::text(&order.shipping_total),
            ReportCell::text(&order.total),
            ReportCell::text(&order.payment_method_title),
            ReportCell::text(&order.number),
            ReportCell::Number(pre_tax_unit_price(order.id, first)?),
            ReportCell::one(),
            ReportCell::text(&first.sku),
            ReportCell::Integer(first.quantity),
            ReportCell::one(),
            ReportCell::text(&order.shipping.city),
            ReportCell::text(&order.shipping.state),
            ReportCell::text(&order.shipping.postcode),
            ReportCell::text(&order.billing.phone),
            ReportCell::text(order.shipping_method()),
        ]);
    }

    for (sequence, item) in (2..).zip(items) {
        rows.push([
            id.clone(),
            ReportCell::Blank,
            ReportCell::Blank,
            ReportCell::Integer(sequence),
            ReportCell::Integer(item.quantity),
            ReportCell::text(&item.sku),
            ReportCell::text(&item.name),
            ReportCell::text(&item.total),
            ReportCell::Blank,
            ReportCell::Blank,
            ReportCell::Blank,
            id.clone(),
            ReportCell::Number(pre_tax_unit_price(order.id, item)?),
            ReportCell::one(),
            ReportCell::text(&item.sku),
            ReportCell::Integer(item.quantity),
            ReportCell::one(),
            ReportCell::Blank,
            ReportCell::Blank,
            ReportCell::Blank,
            ReportCell::Blank,
            ReportCell::Blank,
        ]);
    }

    let shipping = parse_amount(order.id, "shipping_total", &order.shipping_total)?;
    rows.push([
        ReportCell::Blank,
        ReportCell::Blank,
        ReportCell::Blank,
        ReportCell::Integer(order.line_items.len() as i64 + 1),
        ReportCell::Blank,
        ReportCell::Blank,
        ReportCell::text(SHIPPING_DESCRIPTION),
        ReportCell::Blank,
        ReportCell::Blank,
        ReportCell::Blank,
        ReportCell::Blank,
        id,
        ReportCell::Number(shipping / VAT_FACTOR),
        ReportCell::one(),
        ReportCell::text(SHIPPING_SKU),
        ReportCell::one(),
        ReportCell::one(),
        ReportCell::Blank,
        ReportCell::Blank,
        ReportCell::Blank,
        ReportCell::Blank,
        ReportCell::Blank,
    ]);

    Ok(())
}

fn order_id(order: &Order) -> Result<ReportCell> {
    i64::try_from(order.id)
        .map(ReportCell::Integer)
        .map_err(|_| layout_error(order.id, "order id does not fit a signed integer"))
}

/// `(line total / quantity) / 1.16`
pub fn pre_tax_unit_price(order_id: u64, item: &LineItem) -> Result<f64> {
    if item.quantity == 0 {
        return Err(layout_error(
            order_id,
            format!("line item {} has zero quantity", item.sku),
        ));
    }
    let total = parse_amount(order_id, "line item total", &item.total)?;
    Ok(total / item.quantity as f64 / VAT_FACTOR)
}

fn parse_amount(order_id: u64, field: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| layout_error(order_id, format!("{field} {value:?} is not a number")))
}

fn layout_error(order_id: u64, details: impl Into<String>) -> Error {
    Error::Layout {
        order_id,
        details: details.into(),
    }
}
