//! SKU → cost resolution.
//!
//! Sellers encode SKUs inconsistently: bare MPNs, MPN plus condition suffixes (`4WY33LW/A-ASIS-PLUS`), and legacy
//! free-text variants (`GPS-42MM-SILVER`, `IPHONE13 UNLOCKED`). [`CostTable::cost_for`] runs a fixed ladder of
//! fallback strategies so that none of these need upstream cleanup. Strategies are tried in order, the first match
//! wins, and no strategy partially applies.
mod title;

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use usc_common::Money;

pub use title::{parse_color, parse_connectivity, parse_size};

/// Storage sizes probed, in order, when a phone-style SKU names a model but no capacity.
const STORAGE_PROBE_SIZES: [&str; 3] = ["256", "128", "64"];

/// Extract the MPN (e.g. `4WY33LW/A`) from a full SKU (e.g. `4WY33LW/A-ASIS-PLUS`): split on `-`, take the first
/// non-empty segment.
pub fn extract_mpn(sku: &str) -> String {
    sku.split('-').next().unwrap_or_default().to_string()
}

//--------------------------------------        SkuCost        --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuCost {
    pub id: i64,
    pub mpn: String,
    pub cost: Money,
    pub size: Option<String>,
    pub connectivity: Option<String>,
    pub description: Option<String>,
}

/// The default cost rows the console ships with, used until the seller maintains their own table.
pub fn default_sku_costs() -> Vec<SkuCost> {
    fn row(id: i64, mpn: &str, cents: i64, size: Option<&str>, conn: Option<&str>, desc: &str) -> SkuCost {
        SkuCost {
            id,
            mpn: mpn.to_string(),
            cost: Money::from_cents(cents),
            size: size.map(String::from),
            connectivity: conn.map(String::from),
            description: Some(desc.to_string()),
        }
    }
    vec![
        // Apple Watch SE2
        row(1, "4WWA3LW/A", 22_100, Some("42mm"), Some("GPS"), "42mm GPS Aluminum Silver"),
        row(2, "4WWF3LW/A", 22_100, Some("42mm"), Some("GPS"), "42mm GPS Aluminum Rose Gold"),
        row(3, "4WWJ3LW/A", 22_100, Some("42mm"), Some("GPS"), "42mm GPS Aluminum Jet Black"),
        row(4, "4WXA3LW/A", 22_300, Some("42mm"), Some("Cell"), "42mm Cell Aluminum Rose Gold"),
        row(5, "4WY03LW/A", 23_400, Some("46mm"), Some("Cell"), "46mm Cell Aluminum Silver"),
        row(6, "4WY33LW/A", 23_400, Some("46mm"), Some("Cell"), "46mm Cell Aluminum Jet Black"),
        // iPhones
        row(7, "IPHONE11-64GB", 15_687, Some("64GB"), None, "iPhone 11 64GB"),
        row(8, "IPHONE11-128GB", 16_382, Some("128GB"), None, "iPhone 11 128GB"),
        row(9, "IPHONE12-64GB", 17_076, Some("64GB"), None, "iPhone 12 64GB"),
        row(10, "IPHONE12-128GB", 24_437, Some("128GB"), None, "iPhone 12 128GB"),
        row(11, "IPHONE13-128GB", 24_437, Some("128GB"), None, "iPhone 13 128GB"),
        row(12, "IPHONE13-256GB", 25_410, Some("256GB"), None, "iPhone 13 256GB"),
    ]
}

//--------------------------------------       CostTable       --------------------------------------------------------
/// An immutable snapshot of the cost table, built once per request and shared by every mapping call in it.
#[derive(Debug, Clone, Default)]
pub struct CostTable {
    rows: Vec<SkuCost>,
    by_mpn: HashMap<String, usize>,
}

impl CostTable {
    pub fn new(rows: Vec<SkuCost>) -> Self {
        let by_mpn = rows.iter().enumerate().map(|(i, r)| (r.mpn.clone(), i)).collect();
        Self { rows, by_mpn }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_sku_costs())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[SkuCost] {
        &self.rows
    }

    pub fn info_for_mpn(&self, mpn: &str) -> Option<&SkuCost> {
        self.by_mpn.get(mpn).map(|&i| &self.rows[i])
    }

    /// Resolve the unit cost for a raw seller SKU. Total: an unknown SKU yields zero, which callers must read as
    /// "no cost data", not as a free product.
    pub fn cost_for(&self, sku: &str) -> Money {
        if sku.is_empty() {
            return Money::ZERO;
        }
        // 1. The whole SKU may itself be an MPN.
        if let Some(row) = self.info_for_mpn(sku) {
            return row.cost;
        }
        // 2. First hyphen-delimited segment.
        let mpn = extract_mpn(sku);
        if !mpn.is_empty() {
            if let Some(row) = self.info_for_mpn(&mpn) {
                return row.cost;
            }
        }
        let upper = sku.to_uppercase();
        // 3. Wearable variant: radio-type prefix plus a case size.
        if let Some(cost) = self.wearable_variant_cost(&upper) {
            return cost;
        }
        // 4. Phone model plus storage capacity.
        if let Some(cost) = self.phone_storage_cost(&upper) {
            return cost;
        }
        Money::ZERO
    }

    /// Borrowing closure form of [`CostTable::cost_for`], for injection into the platform mappers.
    pub fn lookup(&self) -> impl Fn(&str) -> Money + '_ {
        |sku| self.cost_for(sku)
    }

    fn wearable_variant_cost(&self, upper_sku: &str) -> Option<Money> {
        let connectivity = if upper_sku.starts_with("GPS") {
            "GPS"
        } else if upper_sku.starts_with("CELL") {
            "Cell"
        } else {
            return None;
        };
        let size = format!("{}mm", two_digit_token(upper_sku)?);
        // Both parts matched; find a row agreeing on both. Never a partial match on size alone.
        self.rows
            .iter()
            .find(|r| r.size.as_deref() == Some(size.as_str()) && r.connectivity.as_deref() == Some(connectivity))
            .map(|r| r.cost)
    }

    fn phone_storage_cost(&self, upper_sku: &str) -> Option<Money> {
        let model = Regex::new(r"IPHONE\s*(\d{2})")
            .expect("valid regex")
            .captures(upper_sku)
            .and_then(|c| c.get(1).map(|m| m.as_str().to_string()))?;
        let explicit_storage = Regex::new(r"(\d+)\s*GB")
            .expect("valid regex")
            .captures(upper_sku)
            .and_then(|c| c.get(1).map(|m| m.as_str().to_string()));
        let candidates: Vec<String> = match explicit_storage {
            Some(gb) => vec![gb],
            None => STORAGE_PROBE_SIZES.iter().map(|s| s.to_string()).collect(),
        };
        candidates
            .into_iter()
            .find_map(|gb| self.info_for_mpn(&format!("IPHONE{model}-{gb}GB")))
            .map(|r| r.cost)
    }
}

/// First standalone two-digit number in the string (`42` in `GPS-42MM-SILVER`, but not the `123` in `ABC123MM`).
fn two_digit_token(value: &str) -> Option<&str> {
    Regex::new(r"\d+").expect("valid regex").find_iter(value).find(|m| m.as_str().len() == 2).map(|m| m.as_str())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mpn_extraction() {
        assert_eq!(extract_mpn("4WY33LW/A-ASIS-PLUS"), "4WY33LW/A");
        assert_eq!(extract_mpn("4WWF3LW/A"), "4WWF3LW/A");
        assert_eq!(extract_mpn(""), "");
    }

    #[test]
    fn exact_mpn_wins_before_segmentation() {
        let table = CostTable::with_defaults();
        // "IPHONE13-128GB" is a full MPN that also contains a hyphen; strategy 1 must catch it before the
        // first-segment split would reduce it to "IPHONE13".
        assert_eq!(table.cost_for("IPHONE13-128GB"), Money::from_cents(24_437));
    }

    #[test]
    fn condition_suffixes_resolve_via_first_segment() {
        let table = CostTable::with_defaults();
        assert_eq!(table.cost_for("4WY33LW/A-ASIS-PLUS"), Money::from_cents(23_400));
        assert_eq!(table.cost_for("4WWA3LW/A-OB"), Money::from_cents(22_100));
    }

    #[test]
    fn wearable_variant_inference_requires_both_parts() {
        let table = CostTable::with_defaults();
        assert_eq!(table.cost_for("GPS-42MM-SILVER"), Money::from_cents(22_100));
        assert_eq!(table.cost_for("cell-46mm"), Money::from_cents(23_400));
        // A radio prefix without a case size must not partially match anything.
        assert_eq!(table.cost_for("GPS-SILVER"), Money::ZERO);
        // A size without a known radio prefix falls through too.
        assert_eq!(table.cost_for("XL-42MM"), Money::ZERO);
    }

    #[test]
    fn phone_inference_uses_explicit_storage_when_present() {
        let table = CostTable::with_defaults();
        assert_eq!(table.cost_for("IPHONE13 256GB UNLOCKED"), Money::from_cents(25_410));
        assert_eq!(table.cost_for("IPHONE12-64GB-FAIR"), Money::from_cents(17_076));
    }

    #[test]
    fn phone_inference_probes_descending_storage_sizes() {
        let table = CostTable::with_defaults();
        // No capacity in the SKU: probe 256 first (present for the 13), so the largest known variant wins.
        assert_eq!(table.cost_for("IPHONE13 UNLOCKED"), Money::from_cents(25_410));
        // The 11 has no 256GB row, so the probe falls through to 128GB.
        assert_eq!(table.cost_for("IPHONE11"), Money::from_cents(16_382));
    }

    #[test]
    fn unknown_skus_yield_the_zero_sentinel() {
        let table = CostTable::with_defaults();
        assert_eq!(table.cost_for(""), Money::ZERO);
        assert_eq!(table.cost_for("TOTALLY-UNKNOWN"), Money::ZERO);
        for sku in ["", "4WY33LW/A-ASIS", "GPS-42MM", "IPHONE13", "junk"] {
            assert!(table.cost_for(sku) >= Money::ZERO);
        }
    }

    #[test]
    fn two_digit_tokens() {
        assert_eq!(two_digit_token("GPS-42MM-SILVER"), Some("42"));
        assert_eq!(two_digit_token("CELL44"), Some("44"));
        assert_eq!(two_digit_token("ABC123MM"), None);
        assert_eq!(two_digit_token("no digits"), None);
    }
}
