//! Payout ledger reconciliation.
//!
//! Mercado Libre's account-balance export is a semicolon-delimited CSV mixing payments, payouts to the bank, refunds
//! and dispute holds, interleaved with running-balance artifacts. This module parses the export, classifies each row,
//! aggregates the financial metrics and answers the one question the seller cares about: how much money is still in
//! transit.
//!
//! Every summary is recomputed from the full row set on each call. There is no incremental state to drift from the
//! ledger.
use serde::{Deserialize, Serialize};
use usc_common::Money;

/// Columns of the ledger export. Extra columns are tolerated and ignored; missing trailing fields read as empty.
pub const LEDGER_COLUMNS: [&str; 9] = [
    "DATE",
    "DESCRIPTION",
    "ITEM_ID",
    "PACK_ID",
    "GROSS_AMOUNT",
    "MP_FEE_AMOUNT",
    "SHIPPING_FEE_AMOUNT",
    "NET_CREDIT_AMOUNT",
    "NET_DEBIT_AMOUNT",
];

//--------------------------------------     PayoutCsvRow      --------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutCsvRow {
    pub date: String,
    pub description: String,
    pub item_id: String,
    pub pack_id: String,
    pub gross_amount: Money,
    pub mp_fee_amount: Money,
    pub shipping_fee_amount: Money,
    pub net_credit_amount: Money,
    pub net_debit_amount: Money,
}

impl PayoutCsvRow {
    /// Calendar day of the row: the first ten characters (`YYYY-MM-DD`) of the exported timestamp.
    pub fn day(&self) -> String {
        self.date.chars().take(10).collect()
    }
}

//--------------------------------------    TransactionKind    --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Payment,
    Payout,
    Refund,
    ReserveForDispute,
    Mediation,
    /// Running-balance artifacts of the export format. These are presentation rows, not financial events, and are
    /// dropped before any aggregation regardless of their numeric fields.
    Excluded,
    Other,
}

impl TransactionKind {
    pub fn classify(row: &PayoutCsvRow) -> Self {
        if row.date.is_empty()
            || row.description.contains("initial_available_balance")
            || row.description.contains("total")
        {
            return TransactionKind::Excluded;
        }
        match row.description.as_str() {
            "payment" => TransactionKind::Payment,
            "payout" => TransactionKind::Payout,
            "refund" => TransactionKind::Refund,
            "reserve_for_dispute" => TransactionKind::ReserveForDispute,
            "mediation" => TransactionKind::Mediation,
            _ => TransactionKind::Other,
        }
    }

    fn is_dispute(&self) -> bool {
        matches!(self, TransactionKind::ReserveForDispute | TransactionKind::Mediation)
    }
}

//--------------------------------------       Parsing         --------------------------------------------------------
/// Parse a ledger export. Total: quoted fields are unwrapped, short rows are padded with empties, unparsable numeric
/// cells become zero, and rows the reader cannot make sense of at all are skipped. Returns an empty vector for text
/// with no data rows.
pub fn parse_payout_ledger(text: &str) -> Vec<PayoutCsvRow> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.trim().as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|h| h.trim_matches('"').trim().to_string()).collect(),
        Err(e) => {
            log::warn!("Ledger export has no readable header row: {e}");
            return vec![];
        },
    };
    let col = |name: &str| headers.iter().position(|h| h == name);
    let columns: Vec<Option<usize>> = LEDGER_COLUMNS.iter().map(|c| col(c)).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping unreadable ledger row: {e}");
                continue;
            },
        };
        let field = |idx: usize| -> String {
            columns[idx]
                .and_then(|i| record.get(i))
                .map(|v| v.trim_matches('"').trim().to_string())
                .unwrap_or_default()
        };
        rows.push(PayoutCsvRow {
            date: field(0),
            description: field(1),
            item_id: field(2),
            pack_id: field(3),
            gross_amount: Money::parse_lenient(&field(4)),
            mp_fee_amount: Money::parse_lenient(&field(5)),
            shipping_fee_amount: Money::parse_lenient(&field(6)),
            net_credit_amount: Money::parse_lenient(&field(7)),
            net_debit_amount: Money::parse_lenient(&field(8)),
        });
    }
    rows
}

//--------------------------------------      Aggregation      --------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutMetrics {
    pub gross_sales: Money,
    pub mp_fees: Money,
    pub shipping_fees: Money,
    pub net_payments: Money,
    pub num_payments: usize,
    pub refunds: Money,
    pub dispute_held: Money,
    pub dispute_released: Money,
    pub dispute_net: Money,
    pub total_credits: Money,
    pub total_debits: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutEntry {
    /// `YYYY-MM-DD` day of the payout.
    pub date: String,
    pub amount: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutSummary {
    pub payouts: Vec<PayoutEntry>,
    pub total_paid_out: Money,
    pub metrics: PayoutMetrics,
    pub still_held: Money,
    pub pending_payout: Money,
}

/// Reconcile a ledger against an externally supplied `still_held` estimate — funds the marketplace is holding that
/// the export does not yet reflect. The pending payout is clamped at zero: a fully (or over-) reconciled ledger never
/// reports negative money-in-transit.
pub fn reconcile(rows: &[PayoutCsvRow], still_held: Money) -> PayoutSummary {
    let mut metrics = PayoutMetrics::default();
    let mut payouts = Vec::new();

    for row in rows {
        let kind = TransactionKind::classify(row);
        if kind == TransactionKind::Excluded {
            continue;
        }
        metrics.total_credits += row.net_credit_amount;
        metrics.total_debits += row.net_debit_amount;
        match kind {
            TransactionKind::Payment => {
                metrics.gross_sales += row.gross_amount;
                metrics.mp_fees += row.mp_fee_amount;
                metrics.shipping_fees += row.shipping_fee_amount;
                metrics.net_payments += row.net_credit_amount;
                metrics.num_payments += 1;
            },
            TransactionKind::Refund => {
                metrics.refunds += row.net_credit_amount;
            },
            TransactionKind::Payout => {
                payouts.push(PayoutEntry { date: row.day(), amount: row.net_debit_amount });
            },
            kind if kind.is_dispute() => {
                metrics.dispute_held += row.net_debit_amount;
                metrics.dispute_released += row.net_credit_amount;
            },
            _ => {},
        }
    }
    metrics.dispute_net = metrics.dispute_released - metrics.dispute_held;

    let total_paid_out: Money = payouts.iter().map(|p| p.amount).sum();
    let pending_payout =
        (metrics.net_payments - total_paid_out - still_held + metrics.refunds).max(Money::ZERO);

    PayoutSummary { payouts, total_paid_out, metrics, still_held, pending_payout }
}

/// The cutover date: the day of the most recent confirmed payout. Orders placed strictly after it count as pending
/// revenue in the product report; orders on or before it count as received.
pub fn last_payout_date(rows: &[PayoutCsvRow]) -> Option<String> {
    rows.iter()
        .filter(|r| TransactionKind::classify(r) == TransactionKind::Payout)
        .map(|r| r.day())
        .max()
}
