//! Unified Seller Console engine
//!
//! This library contains the console's core logic: it normalizes the two marketplaces' wire formats into one unified
//! listing/order schema, resolves product costs from seller SKUs, reconciles payout ledger exports, and aggregates
//! unified orders into sales and product reports.
//!
//! The library is divided into three main sections:
//! 1. Pure computation ([`mod@sku`], [`mod@mappers`], [`mod@payouts`], [`mod@reports`]). These functions are total:
//!    for any structurally valid input they return a value, pushing anomalies into sentinels (`Money::ZERO`,
//!    `"Unknown"`) rather than errors. They hold no state and are safe to call concurrently.
//! 2. The unified schema ([`mod@order_types`]). Value objects produced fresh on every mapping pass and never mutated
//!    afterwards.
//! 3. Storage ([`mod@db`]). A small sqlite layer for the SKU cost table and imported payout records. Marketplace
//!    credentials are deliberately *not* stored here; they are resolved through
//!    [`marketplace_tools::CredentialStore`].
pub mod db;
pub mod mappers;
pub mod order_types;
pub mod payouts;
pub mod reports;
pub mod sku;

pub use db::{NewSkuCost, PayoutRecord, SqliteDatabase, StorageError};
pub use order_types::{Platform, UnifiedListing, UnifiedOrder, UnifiedOrderItem};
pub use sku::{extract_mpn, CostTable, SkuCost};
