use std::path::PathBuf;

use ordersheet_db::DataAccess;
use tracing::info;

use crate::Result;
use crate::client::{DEFAULT_PAGES, DEFAULT_PER_PAGE, StoreClient};
use crate::layout::build_sheet;
use crate::output::write_csv_file;
use crate::settings::{DEFAULT_CONFIG_TABLE, StoreSettings};

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub output: PathBuf,
    pub pages: u32,
    pub per_page: u32,
    pub config_table: String,
}

impl ReportOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            pages: DEFAULT_PAGES,
            per_page: DEFAULT_PER_PAGE,
            config_table: DEFAULT_CONFIG_TABLE.to_string(),
        }
    }

    pub fn with_pages(mut self, pages: u32, per_page: u32) -> Self {
        self.pages = pages;
        self.per_page = per_page;
        self
    }

    pub fn with_config_table(mut self, table: impl Into<String>) -> Self {
        self.config_table = table.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportSummary {
    pub orders: usize,
    pub skipped: usize,
    pub rows: usize,
}

/// Settings from the database, orders from the store, sheet to CSV.
pub async fn export_orders(access: &DataAccess, options: &ReportOptions) -> Result<ReportSummary> {
    let settings = StoreSettings::load(access, &options.config_table).await?;
    let client = StoreClient::new(&settings)?;
    info!(endpoint = %client.base_url(), pages = options.pages, "Reading orders from store");

    let orders = client.fetch_orders(options.pages, options.per_page).await?;
    let sheet = build_sheet(&orders)?;
    write_csv_file(&sheet, &options.output)?;

    let summary = ReportSummary {
        orders: orders.len(),
        skipped: sheet.skipped().len(),
        rows: sheet.len(),
    };
    info!(?summary, "Order report complete");
    Ok(summary)
}
