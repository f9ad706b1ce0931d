use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::time::Duration;

use crate::{rate_limiter::RateLimiter, MarketplaceApiError, MercadoLibreConfig};

const MULTIGET_BATCH_SIZE: usize = 20;

//----------------------------------------    Wire data objects    ----------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub currency_id: String,
    #[serde(default)]
    pub available_quantity: i64,
    #[serde(default)]
    pub sold_quantity: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub seller_custom_field: Option<String>,
    #[serde(default)]
    pub variations: Vec<MlVariation>,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlVariation {
    pub id: i64,
    #[serde(default)]
    pub seller_custom_field: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlOrder {
    pub id: i64,
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<MlStatusDetail>,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub date_closed: Option<String>,
    #[serde(default)]
    pub order_items: Vec<MlOrderItem>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub currency_id: String,
    #[serde(default)]
    pub buyer: Option<MlBuyer>,
    #[serde(default)]
    pub payments: Vec<MlPayment>,
    #[serde(default)]
    pub shipping: Option<MlShipping>,
    #[serde(default)]
    pub pack_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlStatusDetail {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlOrderItem {
    pub item: MlItemRef,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub currency_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlItemRef {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub seller_custom_field: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlBuyer {
    pub id: i64,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlPayment {
    pub id: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_paid_amount: f64,
    #[serde(default)]
    pub marketplace_fee: f64,
    #[serde(default)]
    pub shipping_cost: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlShipping {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlPaging {
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlOrderSearchResponse {
    pub results: Vec<MlOrder>,
    #[serde(default)]
    pub paging: MlPaging,
}

/// Body for the item update endpoint. Only the supplied fields are changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MlItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<i64>,
}

//----------------------------------------    Order search params    --------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct OrderSearchParams {
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl OrderSearchParams {
    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

//----------------------------------------         Client          ----------------------------------------------------

#[derive(Clone)]
pub struct MercadoLibreApi {
    config: MercadoLibreConfig,
    client: Arc<Client>,
    limiter: Arc<RateLimiter>,
}

impl MercadoLibreApi {
    pub fn new(config: MercadoLibreConfig) -> Result<Self, MarketplaceApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.access_token.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| MarketplaceApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MarketplaceApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), limiter: Arc::new(RateLimiter::mercado_libre()) })
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, MarketplaceApiError> {
        self.limiter.acquire().await;
        let url = format!("{}{path}", self.config.base_url);
        trace!("Sending ML query: {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| MarketplaceApiError::ResponseError(e.to_string()))?;
        if response.status().is_success() {
            response.json::<T>().await.map_err(|e| MarketplaceApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MarketplaceApiError::ResponseError(e.to_string()))?;
            Err(MarketplaceApiError::QueryError { status, message })
        }
    }

    /// The seller account id, either from configuration or from `/users/me`.
    pub async fn user_id(&self) -> Result<String, MarketplaceApiError> {
        if let Some(id) = &self.config.user_id {
            return Ok(id.clone());
        }
        #[derive(Deserialize)]
        struct Me {
            id: i64,
        }
        let me = self.rest_query::<Me, ()>(Method::GET, "/users/me", &[], None).await?;
        Ok(me.id.to_string())
    }

    /// Ids of all of the seller's listed items.
    pub async fn get_items(&self) -> Result<Vec<String>, MarketplaceApiError> {
        #[derive(Deserialize)]
        struct ItemSearch {
            results: Vec<String>,
        }
        let user_id = self.user_id().await?;
        let path = format!("/users/{user_id}/items/search");
        let result = self.rest_query::<ItemSearch, ()>(Method::GET, &path, &[("limit", "100")], None).await?;
        debug!("Fetched {} item ids", result.results.len());
        Ok(result.results)
    }

    pub async fn get_item(&self, item_id: &str) -> Result<MlItem, MarketplaceApiError> {
        let path = format!("/items/{item_id}");
        self.rest_query::<MlItem, ()>(Method::GET, &path, &[], None).await
    }

    /// Fetch full item records via the multiget endpoint, which accepts at most 20 ids per call. Items that come back
    /// with a non-200 inner code are dropped.
    pub async fn get_items_batch(&self, item_ids: &[String]) -> Result<Vec<MlItem>, MarketplaceApiError> {
        #[derive(Deserialize)]
        struct MultigetResult {
            code: i64,
            body: MlItem,
        }
        let mut items = Vec::with_capacity(item_ids.len());
        for batch in item_ids.chunks(MULTIGET_BATCH_SIZE) {
            let ids = batch.join(",");
            let fetched =
                self.rest_query::<Vec<MultigetResult>, ()>(Method::GET, "/items", &[("ids", &ids)], None).await?;
            items.extend(fetched.into_iter().filter(|r| r.code == 200).map(|r| r.body));
        }
        info!("Fetched {} items in batches of {MULTIGET_BATCH_SIZE}", items.len());
        Ok(items)
    }

    pub async fn update_item(&self, item_id: &str, update: MlItemUpdate) -> Result<(), MarketplaceApiError> {
        let path = format!("/items/{item_id}");
        debug!("Updating item {item_id}");
        let _ = self.rest_query::<serde_json::Value, MlItemUpdate>(Method::PUT, &path, &[], Some(update)).await?;
        Ok(())
    }

    pub async fn search_orders(&self, params: &OrderSearchParams) -> Result<MlOrderSearchResponse, MarketplaceApiError> {
        let user_id = self.user_id().await?;
        let limit = params.limit.unwrap_or(50).to_string();
        let offset = params.offset.unwrap_or(0).to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("seller", user_id.as_str()),
            ("sort", "date_desc"),
            ("limit", limit.as_str()),
            ("offset", offset.as_str()),
        ];
        if let Some(status) = &params.status {
            query.push(("order.status", status.as_str()));
        }
        if let Some(from) = &params.date_from {
            query.push(("order.date_created.from", from.as_str()));
        }
        if let Some(to) = &params.date_to {
            query.push(("order.date_created.to", to.as_str()));
        }
        let result = self.rest_query::<MlOrderSearchResponse, ()>(Method::GET, "/orders/search", &query, None).await?;
        debug!("Order search returned {} of {} orders", result.results.len(), result.paging.total);
        Ok(result)
    }

    pub async fn get_order(&self, order_id: i64) -> Result<MlOrder, MarketplaceApiError> {
        let path = format!("/orders/{order_id}");
        self.rest_query::<MlOrder, ()>(Method::GET, &path, &[], None).await
    }
}
