use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::time::Duration;

use crate::{BackMarketConfig, MarketplaceApiError};

//----------------------------------------    Wire data objects    ----------------------------------------------------

/// One page of a Back Market result set. `next` carries the full URL of the following page, or null on the last one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BmPage<T> {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Monetary fields arrive as decimal strings (`"296.00"`); they are parsed leniently at mapping time, not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BmListing {
    #[serde(default)]
    pub id: String,
    pub listing_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub state: i64,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub publication_state: i64,
    #[serde(default)]
    pub backmarket_id: i64,
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BmOrder {
    pub order_id: i64,
    #[serde(default)]
    pub state: i64,
    #[serde(default)]
    pub date_creation: String,
    #[serde(default)]
    pub date_modification: String,
    #[serde(default)]
    pub date_shipping: Option<String>,
    #[serde(default)]
    pub date_payment: Option<String>,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub shipping_price: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub sales_taxes: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub orderlines: Vec<BmOrderline>,
    #[serde(default)]
    pub shipping_address: Option<BmAddress>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BmOrderline {
    pub id: i64,
    #[serde(default)]
    pub product_id: i64,
    #[serde(default)]
    pub listing_id: i64,
    /// The listing name, which doubles as the seller SKU.
    #[serde(default)]
    pub listing: String,
    /// The product display name.
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub shipping_price: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub state: i64,
    #[serde(default)]
    pub orderline_fee: String,
    #[serde(default)]
    pub sales_taxes: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub condition: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BmAddress {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BmTrackingUpdate {
    pub tracking_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipper: Option<String>,
}

/// State code for an order transitioned to "shipped" alongside a tracking update.
const BM_STATE_SHIPPED: i64 = 3;

//----------------------------------------         Client          ----------------------------------------------------

#[derive(Clone)]
pub struct BackMarketApi {
    config: BackMarketConfig,
    client: Arc<Client>,
}

impl BackMarketApi {
    pub fn new(config: BackMarketConfig) -> Result<Self, MarketplaceApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let basic = format!("Basic {}", config.access_token.reveal());
        let val = HeaderValue::from_str(&basic).map_err(|e| MarketplaceApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MarketplaceApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, MarketplaceApiError> {
        let url = format!("{}{path}", self.config.base_url);
        trace!("Sending BM query: {url}");
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

    pub async fn get_listings(&self, page: u32) -> Result<BmPage<BmListing>, MarketplaceApiError> {
        let page = page.to_string();
        self.rest_query::<BmPage<BmListing>, ()>(Method::GET, "/listings", &[("page", &page)], None).await
    }

    /// Walk every listings page. Pagination stops when `next` is null.
    pub async fn get_all_listings(&self) -> Result<Vec<BmListing>, MarketplaceApiError> {
        let mut listings = vec![];
        let mut page = 1;
        loop {
            let result = self.get_listings(page).await?;
            let has_next = result.next.is_some();
            listings.extend(result.results);
            if !has_next {
                break;
            }
            page += 1;
        }
        debug!("Fetched {} BM listings", listings.len());
        Ok(listings)
    }

    pub async fn get_listing(&self, listing_id: i64) -> Result<BmListing, MarketplaceApiError> {
        let path = format!("/listings/{listing_id}");
        self.rest_query::<BmListing, ()>(Method::GET, &path, &[], None).await
    }

    pub async fn update_listing(
        &self,
        listing_id: i64,
        price: Option<f64>,
        quantity: Option<i64>,
    ) -> Result<(), MarketplaceApiError> {
        #[derive(Serialize)]
        struct ListingUpdate {
            #[serde(skip_serializing_if = "Option::is_none")]
            price: Option<f64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            quantity: Option<i64>,
        }
        let path = format!("/listings/{listing_id}");
        debug!("Updating BM listing {listing_id}");
        let body = ListingUpdate { price, quantity };
        let _ = self.rest_query::<serde_json::Value, ListingUpdate>(Method::POST, &path, &[], Some(body)).await?;
        Ok(())
    }

    pub async fn get_orders(&self, state: Option<i64>, page: Option<u32>) -> Result<BmPage<BmOrder>, MarketplaceApiError> {
        let mut query: Vec<(&str, String)> = vec![];
        if let Some(state) = state {
            query.push(("state", state.to_string()));
        }
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        let query: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        self.rest_query::<BmPage<BmOrder>, ()>(Method::GET, "/orders", &query, None).await
    }

    pub async fn get_all_orders(&self) -> Result<Vec<BmOrder>, MarketplaceApiError> {
        let mut orders = vec![];
        let mut page = 1;
        loop {
            let result = self.get_orders(None, Some(page)).await?;
            let has_next = result.next.is_some();
            orders.extend(result.results);
            if !has_next {
                break;
            }
            page += 1;
        }
        debug!("Fetched {} BM orders", orders.len());
        Ok(orders)
    }

    pub async fn get_order(&self, order_id: i64) -> Result<BmOrder, MarketplaceApiError> {
        let path = format!("/orders/{order_id}");
        self.rest_query::<BmOrder, ()>(Method::GET, &path, &[], None).await
    }

    /// Record a tracking number and move the order to the shipped state.
    pub async fn update_order_tracking(
        &self,
        order_id: i64,
        tracking: BmTrackingUpdate,
    ) -> Result<(), MarketplaceApiError> {
        #[derive(Serialize)]
        struct TrackingBody {
            new_state: i64,
            #[serde(flatten)]
            tracking: BmTrackingUpdate,
        }
        let path = format!("/orders/{order_id}");
        info!("Marking BM order {order_id} as shipped");
        let body = TrackingBody { new_state: BM_STATE_SHIPPED, tracking };
        let _ = self.rest_query::<serde_json::Value, TrackingBody>(Method::POST, &path, &[], Some(body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_orders_page() {
        let payload = include_str!("./test_assets/bm_orders_page.json");
        let page: BmPage<BmOrder> = serde_json::from_str(payload).unwrap();
        assert_eq!(page.count, 2);
        assert!(page.next.is_none());
        let order = &page.results[0];
        assert_eq!(order.order_id, 4412345);
        assert_eq!(order.state, 3);
        assert_eq!(order.orderlines[0].listing, "IPHONE13-128GB-GOOD");
        assert_eq!(order.orderlines[0].orderline_fee, "29.60");
        assert_eq!(order.shipping_address.as_ref().unwrap().first_name, "Dana");
    }

    #[test]
    fn deserialize_listings_page() {
        let payload = include_str!("./test_assets/bm_listings_page.json");
        let page: BmPage<BmListing> = serde_json::from_str(payload).unwrap();
        assert_eq!(page.results.len(), 2);
        let listing = &page.results[0];
        assert_eq!(listing.listing_id, 991234);
        assert_eq!(listing.price, "340.00");
        assert_eq!(listing.min_price, Some(310.0));
        assert_eq!(listing.publication_state, 2);
    }

    #[test]
    fn minimal_order_payload_defaults() {
        let order: BmOrder = serde_json::from_str(r#"{"order_id": 99}"#).unwrap();
        assert_eq!(order.state, 0);
        assert!(order.orderlines.is_empty());
        assert_eq!(order.price, "");
    }
}
