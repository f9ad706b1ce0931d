use std::fmt::Write;

use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};
use seller_console_engine::{payouts::PayoutSummary, SkuCost};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

pub fn format_payout_summary(summary: &PayoutSummary, row_count: usize) -> String {
    let mut f = String::new();
    let m = &summary.metrics;
    let _ = writeln!(f, "===============================================================================");
    let _ = writeln!(f, "Payout reconciliation over {row_count} ledger rows ({} payments)", m.num_payments);
    let _ = writeln!(f, "===============================================================================");

    let mut table = Table::new();
    markdown_style(&mut table);
    table.set_titles(row!["Metric", "Amount"]);
    table.add_row(row!["Gross sales", r -> m.gross_sales]);
    table.add_row(row!["Marketplace fees", r -> m.mp_fees]);
    table.add_row(row!["Shipping fees", r -> m.shipping_fees]);
    table.add_row(row!["Net payments", r -> m.net_payments]);
    table.add_row(row!["Refunds", r -> m.refunds]);
    table.add_row(row!["Dispute held", r -> m.dispute_held]);
    table.add_row(row!["Dispute released", r -> m.dispute_released]);
    table.add_row(row!["Dispute net", r -> m.dispute_net]);
    table.add_row(row!["Total credits", r -> m.total_credits]);
    table.add_row(row!["Total debits", r -> m.total_debits]);
    let _ = writeln!(f, "{table}");

    if summary.payouts.is_empty() {
        let _ = writeln!(f, "No payouts recorded in this export.");
    } else {
        let mut table = Table::new();
        markdown_style(&mut table);
        table.set_titles(row!["Payout date", "Amount"]);
        for payout in &summary.payouts {
            table.add_row(row![payout.date, r -> payout.amount]);
        }
        let _ = writeln!(f, "{table}");
    }

    let _ = writeln!(f, "Total paid out:  {}", summary.total_paid_out);
    let _ = writeln!(f, "Still held:      {}", summary.still_held);
    let _ = writeln!(f, "Pending payout:  {}", summary.pending_payout);
    f
}

pub fn format_cost_table(costs: &[SkuCost]) -> String {
    let mut table = Table::new();
    markdown_style(&mut table);
    table.set_titles(row!["ID", "MPN", "Cost", "Size", "Connectivity", "Description"]);
    for cost in costs {
        table.add_row(row![
            cost.id,
            cost.mpn,
            r -> cost.cost,
            cost.size.as_deref().unwrap_or("-"),
            cost.connectivity.as_deref().unwrap_or("-"),
            cost.description.as_deref().unwrap_or("")
        ]);
    }
    table.to_string()
}
