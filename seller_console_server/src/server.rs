use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use marketplace_tools::EnvCredentialStore;
use seller_console_engine::SqliteDatabase;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::UnifiedProvider,
    routes::{
        clear_payout_ledger,
        dashboard,
        delete_sku_cost,
        health,
        list_sku_costs,
        payout_summary,
        product_report,
        sales_report,
        seed_sku_costs,
        unified_listings,
        unified_orders,
        upload_payout_ledger,
        upsert_sku_cost,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.seed_default_costs {
        let seeded = db.seed_default_costs().await?;
        log::info!("Seeded {seeded} default cost rows at startup");
    }
    let provider = UnifiedProvider::from_credentials(&EnvCredentialStore);
    let srv = create_server_instance(config, db, provider)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    provider: UnifiedProvider,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("usc::access_log"))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(provider.clone()))
            .service(health)
            .service(unified_listings)
            .service(unified_orders)
            .service(dashboard)
            .service(sales_report)
            .service(product_report)
            .service(payout_summary)
            .service(upload_payout_ledger)
            .service(clear_payout_ledger)
            .service(list_sku_costs)
            .service(upsert_sku_cost)
            .service(delete_sku_cost)
            .service(seed_sku_costs)
    })
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
