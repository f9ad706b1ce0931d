use std::fmt::Display;

use marketplace_tools::{BmListing, BmOrder};
use usc_common::{Money, DEFAULT_CURRENCY_CODE};

use crate::{
    order_types::{parse_marketplace_date, parse_marketplace_date_or_epoch, Platform, UnifiedListing, UnifiedOrder, UnifiedOrderItem},
    sku::{extract_mpn, parse_color, parse_connectivity, parse_size},
};

/// Publication state code for a live Back Market listing.
const BM_PUBLICATION_ACTIVE: i64 = 2;

//--------------------------------------     BmOrderState      --------------------------------------------------------
/// Back Market order lifecycle states. The API ships these as small integers; codes 4 and 5 are both cancellation
/// outcomes and collapse into one state here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmOrderState {
    New,
    Pending,
    Shipped,
    Cancelled,
    Refunded,
    UnderReview,
    Dispute,
    Completed,
    Unknown(i64),
}

impl BmOrderState {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => BmOrderState::New,
            2 => BmOrderState::Pending,
            3 => BmOrderState::Shipped,
            4 | 5 => BmOrderState::Cancelled,
            6 => BmOrderState::Refunded,
            7 => BmOrderState::UnderReview,
            8 => BmOrderState::Dispute,
            9 => BmOrderState::Completed,
            other => BmOrderState::Unknown(other),
        }
    }

    /// States in which the sale did not complete: no margin is recognized for these orders.
    pub fn is_cancelled_or_refunded(&self) -> bool {
        matches!(self, BmOrderState::Cancelled | BmOrderState::Refunded)
    }
}

impl Display for BmOrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BmOrderState::New => write!(f, "New"),
            BmOrderState::Pending => write!(f, "Pending"),
            BmOrderState::Shipped => write!(f, "Shipped"),
            BmOrderState::Cancelled => write!(f, "Cancelled"),
            BmOrderState::Refunded => write!(f, "Refunded"),
            BmOrderState::UnderReview => write!(f, "Under Review"),
            BmOrderState::Dispute => write!(f, "Dispute"),
            BmOrderState::Completed => write!(f, "Completed"),
            BmOrderState::Unknown(code) => write!(f, "State {code}"),
        }
    }
}

//--------------------------------------        Mapping        --------------------------------------------------------

pub fn map_bm_listing(listing: &BmListing) -> UnifiedListing {
    let mpn = extract_mpn(&listing.sku);
    let size = parse_size(&listing.title);
    let connectivity = parse_connectivity(&listing.title);
    let color = parse_color(&listing.title);
    let currency =
        if listing.currency.is_empty() { DEFAULT_CURRENCY_CODE.to_string() } else { listing.currency.clone() };
    UnifiedListing {
        id: Platform::BackMarket.qualified_id(&listing.listing_id.to_string()),
        platform: Platform::BackMarket,
        external_id: listing.listing_id.to_string(),
        title: listing.title.clone(),
        sku: listing.sku.clone(),
        mpn,
        price: Money::parse_lenient(&listing.price),
        currency,
        stock: listing.quantity,
        status: if listing.publication_state == BM_PUBLICATION_ACTIVE { "active".to_string() } else { "paused".to_string() },
        size: (!size.is_empty()).then_some(size),
        connectivity: (!connectivity.is_empty()).then_some(connectivity),
        color: (color != "Unknown").then_some(color),
        min_price: listing.min_price.map(Money::from_dollars),
        max_price: listing.max_price.map(Money::from_dollars),
        net_payout: None,
    }
}

pub fn map_bm_order<F>(order: &BmOrder, cost_of: F) -> UnifiedOrder
where F: Fn(&str) -> Money {
    let items: Vec<UnifiedOrderItem> = order
        .orderlines
        .iter()
        .map(|ol| UnifiedOrderItem {
            listing_id: ol.listing_id.to_string(),
            title: if ol.product.is_empty() { ol.listing.clone() } else { ol.product.clone() },
            sku: ol.listing.clone(),
            quantity: ol.quantity,
            unit_price: Money::parse_lenient(&ol.price),
        })
        .collect();

    // The order-level price field is not trusted for totals: it can lag orderline corrections. Totals are recomputed
    // from the lines.
    let total_amount: Money = items.iter().map(|i| i.unit_price * i.quantity).sum();
    let cost: Money = items.iter().map(|i| cost_of(&i.sku) * i.quantity).sum();
    let fees: Money = order.orderlines.iter().map(|ol| Money::parse_lenient(&ol.orderline_fee)).sum();
    let shipping_cost = Money::parse_lenient(&order.shipping_price);

    let state = BmOrderState::from_code(order.state);
    let margin = if state.is_cancelled_or_refunded() { Money::ZERO } else { total_amount - cost - fees };

    let buyer_name = order
        .shipping_address
        .as_ref()
        .map(|a| format!("{} {}", a.first_name, a.last_name).trim().to_string())
        .filter(|n| !n.is_empty());

    let currency = if order.currency.is_empty() { DEFAULT_CURRENCY_CODE.to_string() } else { order.currency.clone() };

    UnifiedOrder {
        id: Platform::BackMarket.qualified_id(&order.order_id.to_string()),
        platform: Platform::BackMarket,
        external_id: order.order_id.to_string(),
        // The native API has no human order-number field, so one is synthesized from the external id.
        order_number: format!("BM-{}", order.order_id),
        status: state.to_string(),
        buyer_name,
        items,
        total_amount,
        currency,
        fees,
        shipping_cost,
        net_amount: total_amount - fees,
        cost,
        margin,
        tracking_number: order.tracking_number.clone().filter(|t| !t.is_empty()),
        tracking_url: order.tracking_url.clone().filter(|u| !u.is_empty()),
        order_date: parse_marketplace_date_or_epoch(&order.date_creation),
        shipped_date: order.date_shipping.as_deref().and_then(parse_marketplace_date),
        delivered_date: None,
    }
}

#[cfg(test)]
mod test {
    use marketplace_tools::{BmAddress, BmOrderline};

    use super::*;
    use crate::sku::CostTable;

    fn shipped_order() -> BmOrder {
        BmOrder {
            order_id: 4412345,
            state: 3,
            date_creation: "2024-01-14T10:30:00+00:00".to_string(),
            date_shipping: Some("2024-01-15T08:45:00+00:00".to_string()),
            price: "296.00".to_string(),
            shipping_price: "0.00".to_string(),
            currency: "USD".to_string(),
            orderlines: vec![BmOrderline {
                id: 5512399,
                product_id: 882211,
                listing_id: 991234,
                listing: "IPHONE13-128GB-GOOD".to_string(),
                product: "iPhone 13 128GB Midnight - Unlocked".to_string(),
                quantity: 1,
                price: "296.00".to_string(),
                orderline_fee: "29.60".to_string(),
                ..Default::default()
            }],
            shipping_address: Some(BmAddress {
                first_name: "Dana".to_string(),
                last_name: "Whitfield".to_string(),
                ..Default::default()
            }),
            tracking_number: Some("1Z999AA10123456784".to_string()),
            tracking_url: Some("https://www.ups.com/track?tracknum=1Z999AA10123456784".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn state_codes_map_to_labels() {
        assert_eq!(BmOrderState::from_code(1).to_string(), "New");
        assert_eq!(BmOrderState::from_code(4).to_string(), "Cancelled");
        assert_eq!(BmOrderState::from_code(5).to_string(), "Cancelled");
        assert_eq!(BmOrderState::from_code(6).to_string(), "Refunded");
        assert_eq!(BmOrderState::from_code(9).to_string(), "Completed");
        assert_eq!(BmOrderState::from_code(42).to_string(), "State 42");
        assert!(BmOrderState::from_code(5).is_cancelled_or_refunded());
        assert!(BmOrderState::from_code(6).is_cancelled_or_refunded());
        assert!(!BmOrderState::from_code(3).is_cancelled_or_refunded());
    }

    #[test]
    fn maps_a_shipped_order_with_orderline_fees() {
        let table = CostTable::with_defaults();
        let order = map_bm_order(&shipped_order(), table.lookup());
        assert_eq!(order.id, "bm-4412345");
        assert_eq!(order.order_number, "BM-4412345");
        assert_eq!(order.status, "Shipped");
        assert_eq!(order.total_amount, Money::from_cents(29_600));
        // Fees come from the per-line fee field; they are never silently dropped when present.
        assert_eq!(order.fees, Money::from_cents(2_960));
        assert_eq!(order.net_amount, Money::from_cents(26_640));
        // IPHONE13-128GB-GOOD resolves through the phone-storage inference to the IPHONE13-128GB row.
        assert_eq!(order.cost, Money::from_cents(24_437));
        assert_eq!(order.margin, order.total_amount - order.cost - order.fees);
        assert_eq!(order.buyer_name.as_deref(), Some("Dana Whitfield"));
        assert!(order.shipped_date.is_some());
        assert_eq!(order.items[0].listing_id, "991234");
    }

    #[test]
    fn margin_equals_net_minus_cost() {
        let table = CostTable::with_defaults();
        let order = map_bm_order(&shipped_order(), table.lookup());
        // total - cost - fees and net - cost are the same number; the invariant net = total - fees holds.
        assert_eq!(order.margin, order.net_amount - order.cost);
    }

    #[test]
    fn refunded_orders_have_zero_margin() {
        let table = CostTable::with_defaults();
        let mut native = shipped_order();
        native.state = 6;
        let order = map_bm_order(&native, table.lookup());
        assert_eq!(order.status, "Refunded");
        assert_eq!(order.margin, Money::ZERO);
        assert_ne!(order.cost, Money::ZERO);
    }

    #[test]
    fn malformed_money_strings_become_zero() {
        let table = CostTable::with_defaults();
        let mut native = shipped_order();
        native.orderlines[0].price = "n/a".to_string();
        native.orderlines[0].orderline_fee = "-".to_string();
        native.shipping_price = "".to_string();
        let order = map_bm_order(&native, table.lookup());
        assert_eq!(order.total_amount, Money::ZERO);
        assert_eq!(order.fees, Money::ZERO);
        assert_eq!(order.shipping_cost, Money::ZERO);
    }

    #[test]
    fn listing_maps_publication_state_and_price_bounds() {
        let listing = BmListing {
            id: "7a1df227".to_string(),
            listing_id: 991234,
            title: "iPhone 13 128GB Midnight - Unlocked".to_string(),
            sku: "IPHONE13-128GB-GOOD".to_string(),
            price: "340.00".to_string(),
            currency: "".to_string(),
            quantity: 4,
            publication_state: 2,
            min_price: Some(310.0),
            max_price: Some(420.0),
            ..Default::default()
        };
        let unified = map_bm_listing(&listing);
        assert_eq!(unified.id, "bm-991234");
        assert_eq!(unified.status, "active");
        assert_eq!(unified.currency, "USD");
        assert_eq!(unified.price, Money::from_cents(34_000));
        assert_eq!(unified.min_price, Some(Money::from_cents(31_000)));
        assert_eq!(unified.max_price, Some(Money::from_cents(42_000)));
        assert_eq!(unified.mpn, "IPHONE13");
        assert_eq!(unified.color.as_deref(), Some("Midnight"));

        let mut paused = listing;
        paused.publication_state = 1;
        assert_eq!(map_bm_listing(&paused).status, "paused");
    }
}
