//! Report aggregators over the unified order stream.
mod export;
mod product;
mod sales;

pub use export::sales_report_csv;
pub use product::{generate_product_report, ProductReportRow, ProductReportSummary};
pub use sales::{generate_sales_report, SalesReportRow, SalesReportSummary};
