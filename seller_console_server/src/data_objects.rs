use seller_console_engine::{
    payouts::PayoutSummary,
    UnifiedListing,
    UnifiedOrder,
};
use serde::{Deserialize, Serialize};
use usc_common::Money;

//----------------------------------------   Query parameters   -------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListParams {
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesReportParams {
    pub from: Option<String>,
    pub to: Option<String>,
    /// `csv` for a file download; anything else returns JSON.
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutQueryParams {
    /// Marketplace-held funds the ledger does not reflect yet; a manual estimate supplied by the seller.
    pub still_held: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutUploadParams {
    pub still_held: Option<String>,
    /// Set to false to reconcile an upload without storing its rows.
    pub persist: Option<bool>,
    /// Original filename, recorded with the imported rows.
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSkuCostRequest {
    pub mpn: Option<String>,
    /// Unit cost in dollars.
    pub cost: Option<f64>,
    pub size: Option<String>,
    pub connectivity: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteSkuCostParams {
    pub id: Option<i64>,
}

//----------------------------------------      Responses       -------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingsResponse {
    pub listings: Vec<UnifiedListing>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<UnifiedOrder>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutUploadResponse {
    pub success: bool,
    pub total_rows: usize,
    #[serde(flatten)]
    pub summary: PayoutSummary,
}

//----------------------------------------      Dashboard       -------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlatformMoney {
    pub mercadolibre: Money,
    pub backmarket: Money,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlatformCount {
    pub mercadolibre: i64,
    pub backmarket: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpis {
    pub total_listings: i64,
    pub active_orders: i64,
    pub total_revenue: Money,
    pub total_profit: Money,
    pub revenue_by_platform: PlatformMoney,
    pub orders_by_platform: PlatformCount,
    pub recent_orders: Vec<UnifiedOrder>,
}
