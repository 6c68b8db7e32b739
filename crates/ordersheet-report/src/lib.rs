//! # ordersheet-report
//!
//! Pulls orders from a WooCommerce store, lays them out one row per line item
//! plus a shipping row, and writes the result as CSV.
//!
//! Store credentials live in a database config table read through
//! [`ordersheet_db::DataAccess`].

pub mod client;
pub mod layout;
pub mod order;
pub mod output;
pub mod pipeline;
pub mod settings;

pub use client::StoreClient;
pub use layout::{HEADERS, ReportCell, ReportSheet, build_sheet};
pub use order::Order;
pub use output::{write_csv, write_csv_file};
pub use pipeline::{ReportOptions, ReportSummary, export_orders};
pub use settings::StoreSettings;

use thiserror::Error;

/// Errors that can occur while producing the order report.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] ordersheet_db::Error),

    #[error("Store settings error: {details}")]
    Settings { details: String },

    #[error("HTTP error requesting {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Store API returned status {status} for orders page {page}")]
    Status { page: u32, status: u16 },

    #[error("Order {order_id}: {details}")]
    Layout { order_id: u64, details: String },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
