//! Request handler definitions
//!
//! Each handler resolves a fresh cost-table snapshot, delegates to the engine, and serializes the result. Anything
//! longer than a few lines of glue belongs in the engine or the provider, not here.
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use log::*;
use seller_console_engine::{
    db::NewSkuCost,
    order_types::parse_marketplace_date,
    payouts::{parse_payout_ledger, reconcile, PayoutCsvRow},
    reports::{generate_product_report, generate_sales_report, sales_report_csv},
    CostTable,
    SqliteDatabase,
};
use usc_common::Money;

use crate::{
    data_objects::{
        DeleteSkuCostParams,
        JsonResponse,
        ListingsResponse,
        NewSkuCostRequest,
        OrderListParams,
        OrdersResponse,
        PayoutQueryParams,
        PayoutUploadParams,
        PayoutUploadResponse,
        SalesReportParams,
    },
    errors::ServerError,
    integrations::UnifiedProvider,
};

/// Snapshot the cost table once per request. Until the seller maintains their own rows, the built-in defaults apply.
async fn cost_table(db: &SqliteDatabase) -> Result<CostTable, ServerError> {
    let rows = db.fetch_sku_costs().await?;
    Ok(if rows.is_empty() { CostTable::with_defaults() } else { CostTable::new(rows) })
}

// ----------------------------------------------   Health  -----------------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Unified data  ------------------------------------------------------
#[get("/api/listings")]
pub async fn unified_listings(
    provider: web::Data<UnifiedProvider>,
) -> Result<HttpResponse, ServerError> {
    let (listings, errors) = provider.fetch_listings().await;
    debug!("Serving {} unified listings ({} platform errors)", listings.len(), errors.len());
    Ok(HttpResponse::Ok().json(ListingsResponse { listings, errors }))
}

#[get("/api/orders")]
pub async fn unified_orders(
    params: web::Query<OrderListParams>,
    db: web::Data<SqliteDatabase>,
    provider: web::Data<UnifiedProvider>,
) -> Result<HttpResponse, ServerError> {
    let costs = cost_table(&db).await?;
    let (orders, errors) = provider.fetch_orders(&params, &costs).await;
    debug!("Serving {} unified orders ({} platform errors)", orders.len(), errors.len());
    Ok(HttpResponse::Ok().json(OrdersResponse { orders, errors }))
}

#[get("/api/dashboard")]
pub async fn dashboard(
    db: web::Data<SqliteDatabase>,
    provider: web::Data<UnifiedProvider>,
) -> Result<HttpResponse, ServerError> {
    let costs = cost_table(&db).await?;
    let (kpis, errors) = provider.fetch_dashboard(&costs).await;
    for error in &errors {
        warn!("Dashboard fetch error: {error}");
    }
    Ok(HttpResponse::Ok().json(kpis))
}

//----------------------------------------------   Reports  -----------------------------------------------------------
#[get("/api/reports/sales")]
pub async fn sales_report(
    params: web::Query<SalesReportParams>,
    db: web::Data<SqliteDatabase>,
    provider: web::Data<UnifiedProvider>,
) -> Result<HttpResponse, ServerError> {
    let costs = cost_table(&db).await?;
    let fetch_params = OrderListParams {
        date_from: params.from.clone(),
        date_to: params.to.clone(),
        ..Default::default()
    };
    let (orders, errors) = provider.fetch_orders(&fetch_params, &costs).await;
    for error in &errors {
        warn!("Sales report fetch error: {error}");
    }
    let from = params.from.as_deref().and_then(parse_marketplace_date);
    let to = params.to.as_deref().and_then(parse_marketplace_date);
    let report = generate_sales_report(&orders, from, to);

    if params.format.as_deref() == Some("csv") {
        let csv = sales_report_csv(&report);
        return Ok(HttpResponse::Ok()
            .insert_header(("Content-Type", "text/csv; charset=utf-8"))
            .insert_header(("Content-Disposition", "attachment; filename=\"sales-report.csv\""))
            .body(csv));
    }
    Ok(HttpResponse::Ok().json(report))
}

#[get("/api/reports/products")]
pub async fn product_report(
    db: web::Data<SqliteDatabase>,
    provider: web::Data<UnifiedProvider>,
) -> Result<HttpResponse, ServerError> {
    let costs = cost_table(&db).await?;
    let (orders, errors) = provider.fetch_orders(&OrderListParams::default(), &costs).await;
    for error in &errors {
        warn!("Product report fetch error: {error}");
    }
    let cutover = db.last_payout_date().await?;
    let mut report = generate_product_report(&orders, cutover.as_deref(), &costs);

    // Surface the confirmed payouts alongside the split, so the report shows what the cutover is based on.
    let records = db.fetch_payout_records().await?;
    let rows: Vec<PayoutCsvRow> = records.iter().map(PayoutCsvRow::from).collect();
    report.payouts = reconcile(&rows, Money::ZERO).payouts;

    Ok(HttpResponse::Ok().json(report))
}

//----------------------------------------------   Payouts  -----------------------------------------------------------
#[get("/api/reports/payouts")]
pub async fn payout_summary(
    params: web::Query<PayoutQueryParams>,
    db: web::Data<SqliteDatabase>,
) -> Result<HttpResponse, ServerError> {
    let still_held = Money::parse_lenient(params.still_held.as_deref().unwrap_or_default());
    let records = db.fetch_payout_records().await?;
    let rows: Vec<PayoutCsvRow> = records.iter().map(PayoutCsvRow::from).collect();
    Ok(HttpResponse::Ok().json(reconcile(&rows, still_held)))
}

#[post("/api/reports/payouts")]
pub async fn upload_payout_ledger(
    params: web::Query<PayoutUploadParams>,
    body: web::Bytes,
    db: web::Data<SqliteDatabase>,
) -> Result<HttpResponse, ServerError> {
    let text = String::from_utf8_lossy(&body);
    let rows = parse_payout_ledger(&text);
    if rows.is_empty() {
        return Err(ServerError::InvalidRequestBody("No valid rows found in CSV".to_string()));
    }
    let still_held = Money::parse_lenient(params.still_held.as_deref().unwrap_or_default());
    if params.persist.unwrap_or(true) {
        db.insert_payout_records(&rows, params.source.as_deref()).await?;
    }
    info!("Processed a payout ledger upload with {} rows", rows.len());
    let summary = reconcile(&rows, still_held);
    Ok(HttpResponse::Ok().json(PayoutUploadResponse { success: true, total_rows: rows.len(), summary }))
}

#[delete("/api/reports/payouts")]
pub async fn clear_payout_ledger(db: web::Data<SqliteDatabase>) -> Result<HttpResponse, ServerError> {
    let removed = db.clear_payout_records().await?;
    info!("Cleared {removed} stored payout records");
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Removed {removed} payout records"))))
}

//----------------------------------------------   Settings  ----------------------------------------------------------
#[get("/api/settings/sku-costs")]
pub async fn list_sku_costs(db: web::Data<SqliteDatabase>) -> Result<HttpResponse, ServerError> {
    let costs = db.fetch_sku_costs().await?;
    Ok(HttpResponse::Ok().json(costs))
}

#[post("/api/settings/sku-costs")]
pub async fn upsert_sku_cost(
    body: web::Json<NewSkuCostRequest>,
    db: web::Data<SqliteDatabase>,
) -> Result<HttpResponse, ServerError> {
    let mpn = body.mpn.clone().filter(|m| !m.trim().is_empty()).ok_or(ServerError::MissingField("mpn".to_string()))?;
    let cost = body.cost.ok_or(ServerError::MissingField("cost".to_string()))?;
    let row = NewSkuCost {
        mpn,
        cost: Money::from_dollars(cost),
        size: body.size.clone(),
        connectivity: body.connectivity.clone(),
        description: body.description.clone(),
    };
    db.upsert_sku_cost(&row).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Saved cost for {}", row.mpn))))
}

#[delete("/api/settings/sku-costs")]
pub async fn delete_sku_cost(
    params: web::Query<DeleteSkuCostParams>,
    db: web::Data<SqliteDatabase>,
) -> Result<HttpResponse, ServerError> {
    let id = params.id.ok_or(ServerError::MissingField("id".to_string()))?;
    if db.delete_sku_cost(id).await? {
        Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Deleted cost row {id}"))))
    } else {
        Err(ServerError::NoRecordFound(format!("No cost row with id {id}")))
    }
}

#[put("/api/settings/sku-costs")]
pub async fn seed_sku_costs(db: web::Data<SqliteDatabase>) -> Result<HttpResponse, ServerError> {
    let seeded = db.seed_default_costs().await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Seeded {seeded} cost rows"))))
}

#[cfg(test)]
mod test {
    use actix_web::{test, App};

    use super::*;

    async fn test_app() -> (
        web::Data<SqliteDatabase>,
        web::Data<UnifiedProvider>,
    ) {
        let db = SqliteDatabase::new("sqlite::memory:", 1).await.expect("in-memory database");
        (web::Data::new(db), web::Data::new(UnifiedProvider::disconnected()))
    }

    macro_rules! build_app {
        ($db:expr, $provider:expr) => {
            test::init_service(
                App::new()
                    .app_data($db.clone())
                    .app_data($provider.clone())
                    .service(health)
                    .service(unified_orders)
                    .service(unified_listings)
                    .service(sales_report)
                    .service(payout_summary)
                    .service(upload_payout_ledger)
                    .service(clear_payout_ledger)
                    .service(upsert_sku_cost)
                    .service(list_sku_costs),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_check() {
        let (db, provider) = test_app().await;
        let app = build_app!(db, provider);
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn disconnected_platforms_yield_empty_results_without_errors() {
        let (db, provider) = test_app().await;
        assert!(!provider.is_connected(seller_console_engine::Platform::MercadoLibre));
        assert!(!provider.is_connected(seller_console_engine::Platform::BackMarket));
        let app = build_app!(db, provider);
        let req = test::TestRequest::get().uri("/api/orders").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["orders"].as_array().unwrap().len(), 0);
        assert_eq!(body["errors"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn payout_upload_round_trip() {
        let (db, provider) = test_app().await;
        let app = build_app!(db, provider);
        let csv = concat!(
            "DATE;DESCRIPTION;ITEM_ID;PACK_ID;GROSS_AMOUNT;MP_FEE_AMOUNT;SHIPPING_FEE_AMOUNT;NET_CREDIT_AMOUNT;NET_DEBIT_AMOUNT\n",
            "2024-01-10T09:00:00;payment;;;100.00;10.00;0.00;90.00;0.00\n",
            "2024-01-15T12:00:00;payout;;;0.00;0.00;0.00;0.00;90.00\n",
        );
        let req = test::TestRequest::post().uri("/api/reports/payouts").set_payload(csv).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["totalRows"], 2);
        assert_eq!(body["metrics"]["grossSales"], 10_000);
        assert_eq!(body["pendingPayout"], 0);

        // Stored rows feed the GET summary.
        let req = test::TestRequest::get().uri("/api/reports/payouts?stillHeld=20").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["metrics"]["netPayments"], 9_000);
        assert_eq!(body["totalPaidOut"], 9_000);
        assert_eq!(body["stillHeld"], 2_000);
        assert_eq!(body["pendingPayout"], 0);

        let req = test::TestRequest::delete().uri("/api/reports/payouts").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let req = test::TestRequest::get().uri("/api/reports/payouts").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["metrics"]["numPayments"], 0);
    }

    #[actix_web::test]
    async fn empty_ledger_upload_is_a_client_error() {
        let (db, provider) = test_app().await;
        let app = build_app!(db, provider);
        let req = test::TestRequest::post().uri("/api/reports/payouts").set_payload("").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn sku_cost_creation_requires_mpn_and_cost() {
        let (db, provider) = test_app().await;
        let app = build_app!(db, provider);
        let req = test::TestRequest::post()
            .uri("/api/settings/sku-costs")
            .set_json(serde_json::json!({ "cost": 221.0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);

        let req = test::TestRequest::post()
            .uri("/api/settings/sku-costs")
            .set_json(serde_json::json!({ "mpn": "4WWA3LW/A", "cost": 221.0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::get().uri("/api/settings/sku-costs").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["mpn"], "4WWA3LW/A");
        assert_eq!(body[0]["cost"], 22_100);
    }

    #[actix_web::test]
    async fn sales_report_csv_download() {
        let (db, provider) = test_app().await;
        let app = build_app!(db, provider);
        let req = test::TestRequest::get().uri("/api/reports/sales?format=csv").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("text/csv"));
        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().starts_with("orderId,"));
    }
}
