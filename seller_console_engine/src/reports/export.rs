use log::warn;

use super::sales::SalesReportSummary;

/// Render a sales report as an RFC-4180 CSV document: comma-delimited, fields containing commas, quotes or newlines
/// wrapped in `"…"` with embedded quotes doubled. Monetary columns are plain decimals.
pub fn sales_report_csv(report: &SalesReportSummary) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let header = [
        "orderId",
        "status",
        "sku",
        "itemDescription",
        "quantity",
        "purchaseDate",
        "basePrice",
        "fees",
        "shippingFee",
        "cost",
        "totalNet",
        "margin",
        "trackingNumber",
        "platform",
    ];
    let mut write = || -> Result<(), csv::Error> {
        writer.write_record(header)?;
        for row in &report.rows {
            writer.write_record([
                row.order_id.clone(),
                row.status.clone(),
                row.sku.clone(),
                row.item_description.clone(),
                row.quantity.to_string(),
                row.purchase_date.to_rfc3339(),
                row.base_price.as_decimal(),
                row.fees.as_decimal(),
                row.shipping_fee.as_decimal(),
                row.cost.as_decimal(),
                row.total_net.as_decimal(),
                row.margin.as_decimal(),
                row.tracking_number.clone(),
                row.platform.to_string(),
            ])?;
        }
        Ok(())
    };
    if let Err(e) = write() {
        warn!("Could not serialize the sales report to CSV: {e}");
    }
    let bytes = writer.into_inner().unwrap_or_default();
    String::from_utf8(bytes).unwrap_or_default()
}

#[cfg(test)]
mod test {
    use chrono::DateTime;
    use usc_common::Money;

    use super::*;
    use crate::{
        order_types::Platform,
        reports::sales::{generate_sales_report, SalesReportRow},
    };

    #[test]
    fn fields_with_commas_and_quotes_are_escaped() {
        let row = SalesReportRow {
            order_id: "PO-211-1".to_string(),
            status: "delivered".to_string(),
            sku: "4WWA3LW/A".to_string(),
            item_description: "Watch 42mm, \"renewed\"".to_string(),
            quantity: 1,
            purchase_date: DateTime::UNIX_EPOCH,
            base_price: Money::from_cents(30_000),
            fees: Money::from_cents(3_000),
            shipping_fee: Money::ZERO,
            cost: Money::from_cents(22_100),
            total_net: Money::from_cents(27_000),
            margin: Money::from_cents(4_900),
            tracking_number: String::new(),
            platform: Platform::MercadoLibre,
        };
        let mut report = generate_sales_report(&[], None, None);
        report.rows.push(row);
        let csv = sales_report_csv(&report);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap().split(',').next(), Some("orderId"));
        let data = lines.next().unwrap();
        assert!(data.contains("\"Watch 42mm, \"\"renewed\"\"\""));
        assert!(data.contains("300.00"));
        assert!(data.contains("mercadolibre"));
    }

    #[test]
    fn empty_report_is_header_only() {
        let report = generate_sales_report(&[], None, None);
        let csv = sales_report_csv(&report);
        assert_eq!(csv.lines().count(), 1);
    }
}
