use std::time::Duration;

use tracing::{debug, info};

use crate::order::Order;
use crate::settings::StoreSettings;
use crate::{Error, Result};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(50);
pub const DEFAULT_PAGES: u32 = 5;
pub const DEFAULT_PER_PAGE: u32 = 100;

const API_PATH: &str = "wp-json/wc/v3/";

/// WooCommerce v3 REST client using query-string authentication.
#[derive(Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
}

impl StoreClient {
    /// Endpoints without a scheme are served over https.
    pub fn new(settings: &StoreSettings) -> Result<Self> {
        let base_url = api_base(&settings.endpoint);
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| Error::Http {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            base_url,
            consumer_key: settings.consumer_key.clone(),
            consumer_secret: settings.consumer_secret.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Page URL without the credentials, which are added as query parameters on send.
    pub fn orders_url(&self, page: u32, per_page: u32) -> String {
        format!("{}orders?per_page={per_page}&page={page}", self.base_url)
    }

    pub async fn orders_page(&self, page: u32, per_page: u32) -> Result<Vec<Order>> {
        let url = self.orders_url(page, per_page);
        let http_error = |source| Error::Http {
            url: url.clone(),
            source,
        };

        let response = self
            .http
            .get(&url)
            .query(&[
                ("consumer_key", self.consumer_key.as_str()),
                ("consumer_secret", self.consumer_secret.as_str()),
            ])
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        info!(page, status = status.as_u16(), "Orders page response");
        if !status.is_success() {
            return Err(Error::Status {
                page,
                status: status.as_u16(),
            });
        }

        response.json::<Vec<Order>>().await.map_err(http_error)
    }

    /// Walks pages `1..=pages`, stopping at the first empty page.
    pub async fn fetch_orders(&self, pages: u32, per_page: u32) -> Result<Vec<Order>> {
        let mut orders = Vec::new();
        for page in 1..=pages {
            let batch = self.orders_page(page, per_page).await?;
            if batch.is_empty() {
                debug!(page, "Empty orders page, stopping");
                break;
            }
            info!(page, count = batch.len(), "Read orders");
            orders.extend(batch);
        }
        Ok(orders)
    }
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn api_base(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        format!("{endpoint}/{API_PATH}")
    } else {
        format!("https://{endpoint}/{API_PATH}")
    }
}
