use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use usc_common::Money;

use crate::{
    order_types::{Platform, UnifiedOrder},
    payouts::PayoutEntry,
    sku::{extract_mpn, parse_color, parse_connectivity, parse_size, CostTable},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReportRow {
    pub product_name: String,
    pub item_id: String,
    pub sku: String,
    pub mpn: String,
    pub platform: Platform,
    pub size: String,
    pub connectivity: String,
    pub color: String,
    pub sold: i64,
    /// Unit cost snapshot from the cost table (zero when unknown).
    pub cost: Money,
    /// Average realized price per unit, in dollars.
    pub selling_rate: f64,
    pub received: Money,
    pub pending: Money,
    pub profit: Money,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReportSummary {
    pub products: Vec<ProductReportRow>,
    pub total_sold: i64,
    pub total_received: Money,
    pub total_pending: Money,
    pub total_profit: Money,
    pub payouts: Vec<PayoutEntry>,
}

/// Per-product lifetime aggregates with the received/pending revenue split.
///
/// `last_payout_date` is the cutover day from the payout ledger: an order placed strictly after it has revenue that
/// the marketplace has not paid out yet, so its net amount counts as pending rather than received. Without a cutover
/// everything counts as received.
///
/// Orders attribute entirely to their first line's listing. Multi-SKU orders are rare enough in this business that
/// per-line attribution has never been worth the churn in the product keys.
pub fn generate_product_report(
    orders: &[UnifiedOrder],
    last_payout_date: Option<&str>,
    costs: &CostTable,
) -> ProductReportSummary {
    let mut products: HashMap<String, ProductReportRow> = HashMap::new();

    for order in orders {
        let item = match order.items.first() {
            Some(item) => item,
            None => continue,
        };
        let item_id = item.listing_id.clone();
        let row = products.entry(item_id.clone()).or_insert_with(|| {
            let mpn = extract_mpn(&item.sku);
            let info = costs.info_for_mpn(&mpn);
            // The cost table is authoritative for variant data; titles are the fallback for rows it lacks.
            let size = info
                .and_then(|i| i.size.clone())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| parse_size(&item.title));
            let connectivity = info
                .and_then(|i| i.connectivity.clone())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| parse_connectivity(&item.title));
            let color = parse_color(&item.title);
            let cost = info.map(|i| i.cost).unwrap_or(Money::ZERO);

            let mut parts: Vec<&str> = Vec::new();
            if !size.is_empty() {
                parts.push(size.as_str());
            }
            if !connectivity.is_empty() {
                parts.push(connectivity.as_str());
            }
            if color != "Unknown" {
                parts.push(color.as_str());
            }
            let product_name = if parts.is_empty() { item_id.clone() } else { parts.join(" - ") };

            ProductReportRow {
                product_name,
                item_id: item_id.clone(),
                sku: item.sku.clone(),
                mpn,
                platform: order.platform,
                size,
                connectivity,
                color,
                sold: 0,
                cost,
                selling_rate: 0.0,
                received: Money::ZERO,
                pending: Money::ZERO,
                profit: Money::ZERO,
            }
        });

        row.sold += item.quantity;
        let pending = last_payout_date.map_or(false, |cutover| order.order_day().as_str() > cutover);
        if pending {
            row.pending += order.net_amount;
        } else {
            row.received += order.net_amount;
        }
    }

    let mut products: Vec<ProductReportRow> = products
        .into_values()
        .map(|mut p| {
            p.selling_rate = if p.sold > 0 { (p.received + p.pending).to_dollars() / p.sold as f64 } else { 0.0 };
            let total_cost = p.cost * p.sold;
            p.profit = p.received - total_cost;
            // Receivable optimism: a loss is not recognized while revenue is still pending confirmation.
            if p.profit < Money::ZERO && p.pending > Money::ZERO {
                p.profit = Money::ZERO;
            }
            p
        })
        .collect();
    products.sort_by(|a, b| b.received.cmp(&a.received));

    ProductReportSummary {
        total_sold: products.iter().map(|p| p.sold).sum(),
        total_received: products.iter().map(|p| p.received).sum(),
        total_pending: products.iter().map(|p| p.pending).sum(),
        total_profit: products.iter().map(|p| p.profit).sum(),
        products,
        payouts: vec![],
    }
}
