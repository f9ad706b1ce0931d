use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use usc_common::Money;

use crate::order_types::{Platform, UnifiedOrder};

/// Status fragments that mark an order as genuinely sold. Matching is substring-based on the lowercased status, since
/// Mercado Libre statuses are free-text detail descriptions ("released the money to your account…").
const SOLD_STATUSES: [&str; 9] = [
    "delivered",
    "mediation completed",
    "released the money",
    "on its way",
    "closed complaint",
    "processing",
    "shipped",
    "paid",
    "validated",
];

/// Status fragments for orders where the sale fell through and the product is still owned.
const UNSOLD_STATUSES: [&str; 4] = ["canceled", "cancelled", "return in progress", "refunded"];

fn is_sold(status: &str) -> bool {
    let lower = status.to_lowercase();
    SOLD_STATUSES.iter().any(|s| lower.contains(s))
}

fn is_unsold(status: &str) -> bool {
    let lower = status.to_lowercase();
    UNSOLD_STATUSES.iter().any(|s| lower.contains(s))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportRow {
    pub order_id: String,
    pub status: String,
    pub sku: String,
    pub item_description: String,
    pub quantity: i64,
    pub purchase_date: DateTime<Utc>,
    pub base_price: Money,
    pub fees: Money,
    pub shipping_fee: Money,
    pub cost: Money,
    pub total_net: Money,
    pub margin: Money,
    pub tracking_number: String,
    pub platform: Platform,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportSummary {
    pub total_amount: Money,
    pub product_cost: Money,
    pub refund_withdrawal: Money,
    pub profit: Money,
    pub order_count: usize,
    pub rows: Vec<SalesReportRow>,
}

/// Build the sales report over an optional inclusive `[from, to]` window.
///
/// Rows re-derive their margin from the report's own (broader, substring-matched) unsold vocabulary rather than
/// trusting the mapper's margin: the mapper zeroes the platform's exact cancelled states, this pass additionally
/// catches refunds and returns-in-progress surfaced later in the order's life.
pub fn generate_sales_report(
    orders: &[UnifiedOrder],
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> SalesReportSummary {
    let rows: Vec<SalesReportRow> = orders
        .iter()
        .filter(|o| from.map_or(true, |f| o.order_date >= f))
        .filter(|o| to.map_or(true, |t| o.order_date <= t))
        .map(|order| {
            let margin = if is_unsold(&order.status) { Money::ZERO } else { order.net_amount - order.cost };
            SalesReportRow {
                order_id: order.order_number.clone(),
                status: order.status.clone(),
                sku: order.items.first().map(|i| i.sku.clone()).unwrap_or_default(),
                item_description: order.items.first().map(|i| i.title.clone()).unwrap_or_default(),
                quantity: order.items.iter().map(|i| i.quantity).sum(),
                purchase_date: order.order_date,
                base_price: order.total_amount,
                fees: order.fees,
                shipping_fee: order.shipping_cost,
                cost: order.cost,
                total_net: order.net_amount,
                margin,
                tracking_number: order.tracking_number.clone().unwrap_or_default(),
                platform: order.platform,
            }
        })
        .collect();

    let total_amount: Money = rows.iter().map(|r| r.total_net).sum();
    // Cost is only recognized for orders that actually sold; cancelled stock is still on the shelf.
    let product_cost: Money = rows.iter().filter(|r| is_sold(&r.status)).map(|r| r.cost).sum();
    let refund_withdrawal: Money = rows.iter().filter(|r| is_unsold(&r.status)).map(|r| r.total_net.abs()).sum();
    let profit = total_amount - product_cost - refund_withdrawal;

    SalesReportSummary { total_amount, product_cost, refund_withdrawal, profit, order_count: rows.len(), rows }
}
