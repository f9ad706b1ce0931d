//! Storage for the console's own data: the SKU cost table and imported payout records.
//!
//! Marketplace listings and orders are never stored here — they are fetched and normalized per request. Payout
//! records are append-only: a correction means clearing and re-importing the ledger, never editing rows in place.
mod sqlite;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use usc_common::Money;

use crate::payouts::PayoutCsvRow;

pub use sqlite::SqliteDatabase;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Could not initialize database: {0}")]
    Initialization(String),
}

//--------------------------------------      NewSkuCost       --------------------------------------------------------
/// Input shape for creating or replacing a cost row. Upserts are keyed on `mpn`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSkuCost {
    pub mpn: String,
    pub cost: Money,
    pub size: Option<String>,
    pub connectivity: Option<String>,
    pub description: Option<String>,
}

//--------------------------------------     PayoutRecord      --------------------------------------------------------
/// A persisted ledger row. Same shape as [`PayoutCsvRow`] plus import provenance.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRecord {
    pub id: i64,
    pub date: String,
    pub description: String,
    pub item_id: String,
    pub pack_id: String,
    pub gross_amount: Money,
    pub mp_fee_amount: Money,
    pub shipping_fee_amount: Money,
    pub net_credit_amount: Money,
    pub net_debit_amount: Money,
    pub source_file: Option<String>,
    pub imported_at: DateTime<Utc>,
}

impl From<&PayoutRecord> for PayoutCsvRow {
    fn from(record: &PayoutRecord) -> Self {
        PayoutCsvRow {
            date: record.date.clone(),
            description: record.description.clone(),
            item_id: record.item_id.clone(),
            pack_id: record.pack_id.clone(),
            gross_amount: record.gross_amount,
            mp_fee_amount: record.mp_fee_amount,
            shipping_fee_amount: record.shipping_fee_amount,
            net_credit_amount: record.net_credit_amount,
            net_debit_amount: record.net_debit_amount,
        }
    }
}
