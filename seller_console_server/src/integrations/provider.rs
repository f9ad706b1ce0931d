use log::*;
use marketplace_tools::{
    BackMarketApi,
    CredentialStore,
    MarketplaceApiError,
    MercadoLibreApi,
    OrderSearchParams,
};
use seller_console_engine::{
    mappers::{estimate_ml_fee_rate, map_bm_listing, map_bm_order, map_ml_listing, map_ml_order, net_payout_estimate},
    CostTable,
    Platform,
    UnifiedListing,
    UnifiedOrder,
};

use crate::data_objects::{DashboardKpis, OrderListParams};

/// Number of recent orders sampled when estimating the Mercado Libre fee rate for listing payouts.
const FEE_RATE_SAMPLE_SIZE: u32 = 50;
/// Recent-order window shown on the dashboard.
const DASHBOARD_ORDER_SAMPLE: u32 = 20;

/// Statuses that count as "active" on the dashboard, matched per platform.
const ML_ACTIVE_STATUSES: [&str; 3] = ["paid", "confirmed", "partially_paid"];
const BM_ACTIVE_STATUSES: [&str; 3] = ["New", "Pending", "Shipped"];

/// Fans requests out to whichever marketplaces are connected and merges the normalized results.
///
/// The two platforms are independent: they are fetched concurrently, and a failure on one never suppresses the
/// other's data. Failures are folded into a list of human-readable strings returned alongside the partial results. A
/// platform without credentials contributes nothing, silently.
#[derive(Clone, Default)]
pub struct UnifiedProvider {
    ml: Option<MercadoLibreApi>,
    bm: Option<BackMarketApi>,
}

impl UnifiedProvider {
    pub fn from_credentials(store: &dyn CredentialStore) -> Self {
        let ml = store.mercado_libre().and_then(|config| match MercadoLibreApi::new(config) {
            Ok(client) => Some(client),
            Err(e) => {
                error!("Could not initialize the Mercado Libre client: {e}");
                None
            },
        });
        let bm = store.back_market().and_then(|config| match BackMarketApi::new(config) {
            Ok(client) => Some(client),
            Err(e) => {
                error!("Could not initialize the Back Market client: {e}");
                None
            },
        });
        if ml.is_none() {
            info!("Mercado Libre is not connected.");
        }
        if bm.is_none() {
            info!("Back Market is not connected.");
        }
        Self { ml, bm }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn is_connected(&self, platform: Platform) -> bool {
        match platform {
            Platform::MercadoLibre => self.ml.is_some(),
            Platform::BackMarket => self.bm.is_some(),
        }
    }

    //----------------------------------------      Orders       ------------------------------------------------------

    pub async fn fetch_orders(&self, params: &OrderListParams, costs: &CostTable) -> (Vec<UnifiedOrder>, Vec<String>) {
        let search = OrderSearchParams {
            status: params.status.clone(),
            date_from: params.date_from.clone(),
            date_to: params.date_to.clone(),
            limit: params.limit,
            offset: params.offset,
        };
        let (ml_result, bm_result) = tokio::join!(self.ml_orders(&search, costs), self.bm_orders(costs));

        let mut orders = Vec::new();
        let mut errors = Vec::new();
        collect(ml_result, "mercadolibre", &mut orders, &mut errors);
        collect(bm_result, "backmarket", &mut orders, &mut errors);
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        (orders, errors)
    }

    async fn ml_orders(
        &self,
        search: &OrderSearchParams,
        costs: &CostTable,
    ) -> Result<Vec<UnifiedOrder>, MarketplaceApiError> {
        let client = match &self.ml {
            Some(client) => client,
            None => return Ok(vec![]),
        };
        let response = client.search_orders(search).await?;
        let lookup = costs.lookup();
        Ok(response.results.iter().map(|o| map_ml_order(o, &lookup)).collect())
    }

    async fn bm_orders(&self, costs: &CostTable) -> Result<Vec<UnifiedOrder>, MarketplaceApiError> {
        let client = match &self.bm {
            Some(client) => client,
            None => return Ok(vec![]),
        };
        let orders = client.get_all_orders().await?;
        let lookup = costs.lookup();
        Ok(orders.iter().map(|o| map_bm_order(o, &lookup)).collect())
    }

    //----------------------------------------     Listings      ------------------------------------------------------

    pub async fn fetch_listings(&self) -> (Vec<UnifiedListing>, Vec<String>) {
        let (ml_result, bm_result) = tokio::join!(self.ml_listings(), self.bm_listings());
        let mut listings = Vec::new();
        let mut errors = Vec::new();
        collect(ml_result, "mercadolibre", &mut listings, &mut errors);
        collect(bm_result, "backmarket", &mut listings, &mut errors);
        (listings, errors)
    }

    async fn ml_listings(&self) -> Result<Vec<UnifiedListing>, MarketplaceApiError> {
        let client = match &self.ml {
            Some(client) => client,
            None => return Ok(vec![]),
        };
        let ids = client.get_items().await?;
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let items = client.get_items_batch(&ids).await?;
        let mut listings: Vec<UnifiedListing> = items.iter().map(map_ml_listing).collect();

        // Estimate the net payout of each listing from the fee rate observed on recent orders. Best-effort: a
        // failed order fetch only means the estimate is skipped.
        match client.search_orders(&OrderSearchParams::default().with_limit(FEE_RATE_SAMPLE_SIZE)).await {
            Ok(response) => {
                let fee_rate = estimate_ml_fee_rate(&response.results);
                if fee_rate > 0.0 {
                    for listing in &mut listings {
                        listing.net_payout = Some(net_payout_estimate(listing.price, fee_rate));
                    }
                }
            },
            Err(e) => warn!("Could not sample orders for the fee-rate estimate: {e}"),
        }
        Ok(listings)
    }

    async fn bm_listings(&self) -> Result<Vec<UnifiedListing>, MarketplaceApiError> {
        let client = match &self.bm {
            Some(client) => client,
            None => return Ok(vec![]),
        };
        let listings = client.get_all_listings().await?;
        Ok(listings.iter().map(map_bm_listing).collect())
    }

    //----------------------------------------     Dashboard     ------------------------------------------------------

    pub async fn fetch_dashboard(&self, costs: &CostTable) -> (DashboardKpis, Vec<String>) {
        let mut kpis = DashboardKpis::default();
        let mut errors = Vec::new();
        let mut all_orders: Vec<UnifiedOrder> = Vec::new();

        if let Some(client) = &self.ml {
            let result: Result<(), MarketplaceApiError> = async {
                let item_ids = client.get_items().await?;
                kpis.total_listings += item_ids.len() as i64;

                let response =
                    client.search_orders(&OrderSearchParams::default().with_limit(DASHBOARD_ORDER_SAMPLE)).await?;
                let lookup = costs.lookup();
                let orders: Vec<UnifiedOrder> = response.results.iter().map(|o| map_ml_order(o, &lookup)).collect();
                kpis.active_orders += orders
                    .iter()
                    .filter(|o| {
                        let status = o.status.to_lowercase();
                        ML_ACTIVE_STATUSES.iter().any(|s| status.contains(s))
                    })
                    .count() as i64;
                kpis.revenue_by_platform.mercadolibre = orders.iter().map(|o| o.total_amount).sum();
                kpis.orders_by_platform.mercadolibre = response.paging.total;
                all_orders.extend(orders);
                Ok(())
            }
            .await;
            if let Err(e) = result {
                errors.push(format!("mercadolibre: {e}"));
            }
        }

        if let Some(client) = &self.bm {
            let result: Result<(), MarketplaceApiError> = async {
                let listings = client.get_listings(1).await?;
                kpis.total_listings += if listings.count > 0 { listings.count } else { listings.results.len() as i64 };

                let native = client.get_all_orders().await?;
                let lookup = costs.lookup();
                let orders: Vec<UnifiedOrder> = native.iter().map(|o| map_bm_order(o, &lookup)).collect();
                kpis.active_orders +=
                    orders.iter().filter(|o| BM_ACTIVE_STATUSES.contains(&o.status.as_str())).count() as i64;
                kpis.revenue_by_platform.backmarket = orders.iter().map(|o| o.total_amount).sum();
                kpis.orders_by_platform.backmarket = orders.len() as i64;
                all_orders.extend(orders);
                Ok(())
            }
            .await;
            if let Err(e) = result {
                errors.push(format!("backmarket: {e}"));
            }
        }

        kpis.total_revenue = kpis.revenue_by_platform.mercadolibre + kpis.revenue_by_platform.backmarket;
        kpis.total_profit = all_orders.iter().map(|o| o.margin).sum();
        all_orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        all_orders.truncate(10);
        kpis.recent_orders = all_orders;
        (kpis, errors)
    }
}

fn collect<T>(result: Result<Vec<T>, MarketplaceApiError>, platform: &str, out: &mut Vec<T>, errors: &mut Vec<String>) {
    match result {
        Ok(items) => out.extend(items),
        Err(e) => {
            warn!("{platform} fetch failed: {e}");
            errors.push(format!("{platform}: {e}"));
        },
    }
}
