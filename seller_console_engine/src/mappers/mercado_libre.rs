use marketplace_tools::{MlItem, MlOrder};
use usc_common::Money;

use crate::{
    order_types::{parse_marketplace_date, parse_marketplace_date_or_epoch, Platform, UnifiedListing, UnifiedOrder, UnifiedOrderItem},
    sku::{extract_mpn, parse_color, parse_connectivity, parse_size},
};

/// Purchase-order numbering used by the seller's books for Mercado Libre orders.
pub const ML_ORDER_NUMBER_PREFIX: &str = "PO-211";

/// Order statuses for which the sale never completed and the product is still owned, so no margin is recognized.
const ML_UNSOLD_STATUSES: [&str; 2] = ["cancelled", "invalid"];

pub fn map_ml_listing(item: &MlItem) -> UnifiedListing {
    let sku = item
        .seller_custom_field
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| item.variations.first().and_then(|v| v.seller_custom_field.clone()))
        .unwrap_or_default();
    let mpn = extract_mpn(&sku);
    let size = parse_size(&item.title);
    let connectivity = parse_connectivity(&item.title);
    let color = parse_color(&item.title);
    UnifiedListing {
        id: Platform::MercadoLibre.qualified_id(&item.id),
        platform: Platform::MercadoLibre,
        external_id: item.id.clone(),
        title: item.title.clone(),
        sku,
        mpn,
        price: Money::from_dollars(item.price),
        currency: item.currency_id.clone(),
        stock: item.available_quantity,
        status: item.status.clone(),
        size: (!size.is_empty()).then_some(size),
        connectivity: (!connectivity.is_empty()).then_some(connectivity),
        color: (color != "Unknown").then_some(color),
        min_price: None,
        max_price: None,
        net_payout: None,
    }
}

pub fn map_ml_order<F>(order: &MlOrder, cost_of: F) -> UnifiedOrder
where F: Fn(&str) -> Money {
    let items: Vec<UnifiedOrderItem> = order
        .order_items
        .iter()
        .map(|oi| UnifiedOrderItem {
            listing_id: oi.item.id.clone(),
            title: oi.item.title.clone(),
            sku: oi.item.seller_custom_field.clone().unwrap_or_default(),
            quantity: oi.quantity,
            unit_price: Money::from_dollars(oi.unit_price),
        })
        .collect();

    let fees: Money = order.payments.iter().map(|p| Money::from_dollars(p.marketplace_fee)).sum();
    let shipping_cost: Money = order.payments.iter().map(|p| Money::from_dollars(p.shipping_cost)).sum();
    let total_amount = Money::from_dollars(order.total_amount);
    let net_amount = total_amount - fees;
    let cost: Money = items.iter().map(|i| cost_of(&i.sku) * i.quantity).sum();
    let margin =
        if ML_UNSOLD_STATUSES.contains(&order.status.as_str()) { Money::ZERO } else { net_amount - cost };

    // The human-facing status is the free-text detail description when the API supplies one.
    let status = order
        .status_detail
        .as_ref()
        .and_then(|d| d.description.clone())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| order.status.clone());

    let buyer_name = order
        .buyer
        .as_ref()
        .map(|b| {
            let full = format!("{} {}", b.first_name, b.last_name).trim().to_string();
            if full.is_empty() {
                b.nickname.clone()
            } else {
                full
            }
        })
        .filter(|n| !n.is_empty());

    let tracking_number =
        order.shipping.as_ref().and_then(|s| s.tracking_number.clone()).filter(|t| !t.is_empty());
    let delivered_date = if order.status == "delivered" {
        order.date_closed.as_deref().and_then(parse_marketplace_date)
    } else {
        None
    };

    UnifiedOrder {
        id: Platform::MercadoLibre.qualified_id(&order.id.to_string()),
        platform: Platform::MercadoLibre,
        external_id: order.id.to_string(),
        order_number: format!("{ML_ORDER_NUMBER_PREFIX}-{}", order.id),
        status,
        buyer_name,
        items,
        total_amount,
        currency: order.currency_id.clone(),
        fees,
        shipping_cost,
        net_amount,
        cost,
        margin,
        tracking_number,
        tracking_url: None,
        order_date: parse_marketplace_date_or_epoch(&order.date_created),
        shipped_date: None,
        delivered_date,
    }
}

/// Average marketplace-fee rate over a batch of recent orders, used to estimate a listing's net payout before any
/// order exists for it.
///
/// Orders that report an explicit `marketplace_fee` contribute it directly. Orders whose payments carry no fee but
/// whose paid total differs from the order total contribute the absolute difference instead — some payment records
/// only reflect the fee as a payout delta.
pub fn estimate_ml_fee_rate(orders: &[MlOrder]) -> f64 {
    let mut total_fees = 0.0;
    let mut total_amount = 0.0;
    for order in orders {
        if order.total_amount <= 0.0 || order.payments.is_empty() {
            continue;
        }
        let order_fees: f64 = order.payments.iter().map(|p| p.marketplace_fee).sum();
        let paid: f64 = order.payments.iter().map(|p| p.total_paid_amount).sum();
        if order_fees > 0.0 {
            total_fees += order_fees;
            total_amount += order.total_amount;
        } else if paid > 0.0 && (paid - order.total_amount).abs() > f64::EPSILON {
            total_fees += (paid - order.total_amount).abs();
            total_amount += order.total_amount;
        }
    }
    if total_amount > 0.0 {
        total_fees / total_amount
    } else {
        0.0
    }
}

pub fn net_payout_estimate(price: Money, fee_rate: f64) -> Money {
    Money::from_dollars(price.to_dollars() * (1.0 - fee_rate))
}

#[cfg(test)]
mod test {
    use marketplace_tools::{MlBuyer, MlItemRef, MlOrderItem, MlPayment, MlShipping, MlStatusDetail, MlVariation};

    use super::*;
    use crate::sku::CostTable;

    fn paid_order() -> MlOrder {
        MlOrder {
            id: 2000004897345678,
            status: "paid".to_string(),
            status_detail: None,
            date_created: "2024-01-12T14:22:05.000-04:00".to_string(),
            date_closed: Some("2024-01-12T14:25:11.000-04:00".to_string()),
            order_items: vec![MlOrderItem {
                item: MlItemRef {
                    id: "MLM149912345".to_string(),
                    title: "Apple Watch SE 2 46mm GPS + Cellular Jet Black".to_string(),
                    seller_custom_field: Some("4WY33LW/A-ASIS".to_string()),
                },
                quantity: 1,
                unit_price: 5899.0,
                currency_id: "MXN".to_string(),
            }],
            total_amount: 5899.0,
            currency_id: "MXN".to_string(),
            buyer: Some(MlBuyer {
                id: 181233445,
                nickname: "COMPRADOR8812".to_string(),
                first_name: "Maria".to_string(),
                last_name: "Lopez".to_string(),
            }),
            payments: vec![MlPayment {
                id: 73991122334,
                status: "approved".to_string(),
                total_paid_amount: 5899.0,
                marketplace_fee: 35.51,
                shipping_cost: 12.00,
            }],
            shipping: Some(MlShipping {
                id: Some(43211234567),
                status: "delivered".to_string(),
                tracking_number: Some("XR404123456MX".to_string()),
            }),
            pack_id: None,
        }
    }

    #[test]
    fn maps_a_paid_order() {
        let table = CostTable::with_defaults();
        let order = map_ml_order(&paid_order(), table.lookup());
        assert_eq!(order.id, "ml-2000004897345678");
        assert_eq!(order.order_number, "PO-211-2000004897345678");
        assert_eq!(order.platform, Platform::MercadoLibre);
        assert_eq!(order.total_amount, Money::from_cents(589_900));
        assert_eq!(order.fees, Money::from_cents(3_551));
        assert_eq!(order.shipping_cost, Money::from_cents(1_200));
        assert_eq!(order.net_amount, Money::from_cents(586_349));
        // 4WY33LW/A-ASIS resolves to the 46mm Cell row at $234.00.
        assert_eq!(order.cost, Money::from_cents(23_400));
        assert_eq!(order.margin, order.net_amount - order.cost);
        assert_eq!(order.buyer_name.as_deref(), Some("Maria Lopez"));
        assert_eq!(order.tracking_number.as_deref(), Some("XR404123456MX"));
        assert!(order.delivered_date.is_none());
    }

    #[test]
    fn margin_recomputation_is_idempotent() {
        let table = CostTable::with_defaults();
        let order = map_ml_order(&paid_order(), table.lookup());
        let manual = if order.status == "cancelled" || order.status == "invalid" {
            Money::ZERO
        } else {
            order.net_amount - order.cost
        };
        assert_eq!(order.margin, manual);
    }

    #[test]
    fn cancelled_orders_have_zero_margin_regardless_of_amounts() {
        let table = CostTable::with_defaults();
        let mut native = paid_order();
        native.status = "cancelled".to_string();
        native.status_detail = Some(MlStatusDetail { description: Some("Buyer cancelled before payment".to_string()) });
        let order = map_ml_order(&native, table.lookup());
        assert_eq!(order.margin, Money::ZERO);
        assert_eq!(order.status, "Buyer cancelled before payment");
        // net amount and cost are still reported; only the margin is zeroed.
        assert_ne!(order.net_amount, Money::ZERO);
        assert_ne!(order.cost, Money::ZERO);
    }

    #[test]
    fn buyer_name_falls_back_to_nickname() {
        let table = CostTable::with_defaults();
        let mut native = paid_order();
        native.buyer = Some(MlBuyer {
            id: 1,
            nickname: "ZAPATOVERDE".to_string(),
            first_name: "".to_string(),
            last_name: "".to_string(),
        });
        let order = map_ml_order(&native, table.lookup());
        assert_eq!(order.buyer_name.as_deref(), Some("ZAPATOVERDE"));
    }

    #[test]
    fn blank_tracking_number_maps_to_none() {
        let table = CostTable::with_defaults();
        let mut native = paid_order();
        native.shipping = Some(MlShipping { id: None, status: "pending".to_string(), tracking_number: Some(String::new()) });
        let order = map_ml_order(&native, table.lookup());
        assert!(order.tracking_number.is_none());
    }

    #[test]
    fn delivered_orders_pick_up_the_close_date() {
        let table = CostTable::with_defaults();
        let mut native = paid_order();
        native.status = "delivered".to_string();
        let order = map_ml_order(&native, table.lookup());
        assert!(order.delivered_date.is_some());
    }

    #[test]
    fn listing_sku_falls_back_to_the_first_variation() {
        let item = MlItem {
            id: "MLM149912345".to_string(),
            title: "Apple Watch SE 2 42mm GPS Rose Gold".to_string(),
            price: 4799.0,
            currency_id: "MXN".to_string(),
            available_quantity: 7,
            seller_custom_field: None,
            variations: vec![MlVariation { id: 1, seller_custom_field: Some("4WWF3LW/A-ASIS".to_string()) }],
            ..Default::default()
        };
        let listing = map_ml_listing(&item);
        assert_eq!(listing.id, "ml-MLM149912345");
        assert_eq!(listing.sku, "4WWF3LW/A-ASIS");
        assert_eq!(listing.mpn, "4WWF3LW/A");
        assert_eq!(listing.size.as_deref(), Some("42mm"));
        assert_eq!(listing.connectivity.as_deref(), Some("GPS"));
        assert_eq!(listing.color.as_deref(), Some("Rose Gold"));
    }

    #[test]
    fn fee_rate_prefers_explicit_fees_and_falls_back_to_paid_deltas() {
        let mut with_fee = paid_order();
        with_fee.total_amount = 100.0;
        with_fee.payments = vec![MlPayment { id: 1, status: "approved".to_string(), total_paid_amount: 100.0, marketplace_fee: 10.0, shipping_cost: 0.0 }];
        let mut delta_only = paid_order();
        delta_only.total_amount = 200.0;
        delta_only.payments = vec![MlPayment { id: 2, status: "approved".to_string(), total_paid_amount: 170.0, marketplace_fee: 0.0, shipping_cost: 0.0 }];
        let rate = estimate_ml_fee_rate(&[with_fee, delta_only]);
        // (10 + 30) / (100 + 200)
        assert!((rate - 40.0 / 300.0).abs() < 1e-9);
        assert_eq!(net_payout_estimate(Money::from_cents(30_000), rate), Money::from_cents(26_000));
    }

    #[test]
    fn fee_rate_is_zero_without_usable_orders() {
        assert_eq!(estimate_ml_fee_rate(&[]), 0.0);
        let mut no_payments = paid_order();
        no_payments.payments = vec![];
        assert_eq!(estimate_ml_fee_rate(&[no_payments]), 0.0);
    }
}
