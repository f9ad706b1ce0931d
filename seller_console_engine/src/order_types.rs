use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use usc_common::Money;

//--------------------------------------       Platform        --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    MercadoLibre,
    BackMarket,
}

impl Platform {
    /// Short id prefix. Listing and order ids are namespaced per platform (`ml-…`, `bm-…`) so that merged collections
    /// never collide without needing a coordinating authority.
    pub fn prefix(&self) -> &'static str {
        match self {
            Platform::MercadoLibre => "ml",
            Platform::BackMarket => "bm",
        }
    }

    pub fn qualified_id(&self, external_id: &str) -> String {
        format!("{}-{external_id}", self.prefix())
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::MercadoLibre => write!(f, "mercadolibre"),
            Platform::BackMarket => write!(f, "backmarket"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid platform: {0}")]
pub struct InvalidPlatform(String);

impl FromStr for Platform {
    type Err = InvalidPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mercadolibre" | "ml" => Ok(Platform::MercadoLibre),
            "backmarket" | "bm" => Ok(Platform::BackMarket),
            other => Err(InvalidPlatform(other.to_string())),
        }
    }
}

//--------------------------------------    UnifiedListing     --------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedListing {
    pub id: String,
    pub platform: Platform,
    pub external_id: String,
    pub title: String,
    pub sku: String,
    /// Always derived from `sku` via [`crate::sku::extract_mpn`]; mappers populate it, nothing else writes it.
    pub mpn: String,
    pub price: Money,
    pub currency: String,
    pub stock: i64,
    pub status: String,
    pub size: Option<String>,
    pub connectivity: Option<String>,
    pub color: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    /// Estimated proceeds after marketplace fees, where a fee signal is available.
    pub net_payout: Option<Money>,
}

//--------------------------------------     UnifiedOrder      --------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedOrder {
    pub id: String,
    pub platform: Platform,
    pub external_id: String,
    pub order_number: String,
    pub status: String,
    pub buyer_name: Option<String>,
    pub items: Vec<UnifiedOrderItem>,
    pub total_amount: Money,
    pub currency: String,
    pub fees: Money,
    pub shipping_cost: Money,
    /// Invariant: `net_amount = total_amount - fees`.
    pub net_amount: Money,
    /// Snapshot of the product cost at mapping time. Later cost-table edits do not rewrite history.
    pub cost: Money,
    /// Invariant: zero when the order sits in the platform's cancelled/refunded state set, else `net_amount - cost`.
    pub margin: Money,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub order_date: DateTime<Utc>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
}

impl UnifiedOrder {
    /// Calendar day of the order, as compared against the payout cutover date.
    pub fn order_day(&self) -> String {
        self.order_date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedOrderItem {
    pub listing_id: String,
    pub title: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price: Money,
}

//--------------------------------------     Date parsing      --------------------------------------------------------
/// Parse the timestamp formats the two marketplaces actually emit: RFC 3339 (with or without offset), a bare
/// datetime, or a bare date. Returns `None` for anything else; callers substitute the epoch so that a malformed
/// upstream date never aborts a mapping pass.
pub fn parse_marketplace_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc());
    }
    None
}

pub fn parse_marketplace_date_or_epoch(value: &str) -> DateTime<Utc> {
    parse_marketplace_date(value).unwrap_or_else(|| {
        log::warn!("Could not parse marketplace date: {value:?}. Falling back to the epoch.");
        DateTime::UNIX_EPOCH
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn platform_prefixes_are_disjoint() {
        let ml = Platform::MercadoLibre.qualified_id("12345");
        let bm = Platform::BackMarket.qualified_id("12345");
        assert_eq!(ml, "ml-12345");
        assert_eq!(bm, "bm-12345");
        assert_ne!(ml, bm);
    }

    #[test]
    fn platform_round_trips_through_strings() {
        assert_eq!("mercadolibre".parse::<Platform>().unwrap(), Platform::MercadoLibre);
        assert_eq!("BM".parse::<Platform>().unwrap(), Platform::BackMarket);
        assert!("amazon".parse::<Platform>().is_err());
        assert_eq!(Platform::MercadoLibre.to_string(), "mercadolibre");
    }

    #[test]
    fn marketplace_dates_parse_in_all_observed_shapes() {
        assert!(parse_marketplace_date("2024-01-12T14:22:05.000-04:00").is_some());
        assert!(parse_marketplace_date("2024-01-14T10:30:00+00:00").is_some());
        assert!(parse_marketplace_date("2024-01-14T10:30:00").is_some());
        assert!(parse_marketplace_date("2024-01-14").is_some());
        assert!(parse_marketplace_date("").is_none());
        assert!(parse_marketplace_date("not a date").is_none());
        assert_eq!(parse_marketplace_date_or_epoch("garbage"), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn order_day_is_the_utc_calendar_date() {
        let date = parse_marketplace_date("2024-01-12T23:30:00-04:00").unwrap();
        let order = UnifiedOrder {
            id: "ml-1".into(),
            platform: Platform::MercadoLibre,
            external_id: "1".into(),
            order_number: "PO-211-1".into(),
            status: "paid".into(),
            buyer_name: None,
            items: vec![],
            total_amount: Money::ZERO,
            currency: "MXN".into(),
            fees: Money::ZERO,
            shipping_cost: Money::ZERO,
            net_amount: Money::ZERO,
            cost: Money::ZERO,
            margin: Money::ZERO,
            tracking_number: None,
            tracking_url: None,
            order_date: date,
            shipped_date: None,
            delivered_date: None,
        };
        assert_eq!(order.order_day(), "2024-01-13");
    }
}
