use std::str::FromStr;

use chrono::Utc;
use log::{debug, info};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use super::{NewSkuCost, PayoutRecord, StorageError};
use crate::{payouts::PayoutCsvRow, sku::{default_sku_costs, SkuCost}};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS sku_costs (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        mpn           TEXT NOT NULL UNIQUE,
        cost          INTEGER NOT NULL,
        size          TEXT,
        connectivity  TEXT,
        description   TEXT,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payout_records (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        date                TEXT NOT NULL,
        description         TEXT NOT NULL,
        item_id             TEXT NOT NULL DEFAULT '',
        pack_id             TEXT NOT NULL DEFAULT '',
        gross_amount        INTEGER NOT NULL DEFAULT 0,
        mp_fee_amount       INTEGER NOT NULL DEFAULT 0,
        shipping_fee_amount INTEGER NOT NULL DEFAULT 0,
        net_credit_amount   INTEGER NOT NULL DEFAULT 0,
        net_debit_amount    INTEGER NOT NULL DEFAULT 0,
        source_file         TEXT,
        imported_at         TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_payout_records_description ON payout_records (description)",
];

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if missing) the database at `url` and apply the schema.
    pub async fn new(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StorageError::Initialization(format!("Invalid database url ({url}): {e}")))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
        let db = Self { url: url.to_string(), pool };
        db.create_tables().await?;
        info!("Connected to sqlite database at {url}");
        Ok(db)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_tables(&self) -> Result<(), StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    //----------------------------------------   SKU costs   ----------------------------------------------------------

    pub async fn fetch_sku_costs(&self) -> Result<Vec<SkuCost>, StorageError> {
        let rows = sqlx::query_as::<_, SkuCost>(
            "SELECT id, mpn, cost, size, connectivity, description FROM sku_costs ORDER BY mpn",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert the row, or replace the cost data for an existing `mpn`.
    pub async fn upsert_sku_cost(&self, cost: &NewSkuCost) -> Result<(), StorageError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO sku_costs (mpn, cost, size, connectivity, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (mpn) DO UPDATE
            SET cost = excluded.cost,
                size = excluded.size,
                connectivity = excluded.connectivity,
                description = excluded.description,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&cost.mpn)
        .bind(cost.cost)
        .bind(&cost.size)
        .bind(&cost.connectivity)
        .bind(&cost.description)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        debug!("Upserted cost row for {}", cost.mpn);
        Ok(())
    }

    /// Returns true when a row was actually deleted.
    pub async fn delete_sku_cost(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM sku_costs WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Seed the default cost rows, leaving any seller-maintained row for the same mpn untouched. Returns the number
    /// of rows inserted.
    pub async fn seed_default_costs(&self) -> Result<u64, StorageError> {
        let now = Utc::now().to_rfc3339();
        let mut inserted = 0;
        for row in default_sku_costs() {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO sku_costs (mpn, cost, size, connectivity, description, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $6)
                "#,
            )
            .bind(&row.mpn)
            .bind(row.cost)
            .bind(&row.size)
            .bind(&row.connectivity)
            .bind(&row.description)
            .bind(&now)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        info!("Seeded {inserted} default cost rows");
        Ok(inserted)
    }

    //----------------------------------------  Payout records  -------------------------------------------------------

    /// Append parsed ledger rows. Records are never updated in place; corrections go through
    /// [`SqliteDatabase::clear_payout_records`] and a fresh import.
    pub async fn insert_payout_records(
        &self,
        rows: &[PayoutCsvRow],
        source_file: Option<&str>,
    ) -> Result<u64, StorageError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO payout_records (
                    date, description, item_id, pack_id,
                    gross_amount, mp_fee_amount, shipping_fee_amount, net_credit_amount, net_debit_amount,
                    source_file, imported_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(&row.date)
            .bind(&row.description)
            .bind(&row.item_id)
            .bind(&row.pack_id)
            .bind(row.gross_amount)
            .bind(row.mp_fee_amount)
            .bind(row.shipping_fee_amount)
            .bind(row.net_credit_amount)
            .bind(row.net_debit_amount)
            .bind(source_file)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        debug!("Imported {} payout records", rows.len());
        Ok(rows.len() as u64)
    }

    pub async fn fetch_payout_records(&self) -> Result<Vec<PayoutRecord>, StorageError> {
        let rows = sqlx::query_as::<_, PayoutRecord>(
            r#"
            SELECT id, date, description, item_id, pack_id,
                   gross_amount, mp_fee_amount, shipping_fee_amount, net_credit_amount, net_debit_amount,
                   source_file, imported_at
            FROM payout_records
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn clear_payout_records(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM payout_records").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Day of the most recent stored payout row, i.e. the cutover date for the product report.
    pub async fn last_payout_date(&self) -> Result<Option<String>, StorageError> {
        let day: Option<String> = sqlx::query_scalar(
            "SELECT MAX(substr(date, 1, 10)) FROM payout_records WHERE description = 'payout'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(day)
    }
}
