use actix::prelude::*;
use actix_web::{web::Data, App, HttpServer};
use anyhow::Context as AnyhowContext;
use log_error::LogError;
use std::env;
use std::sync::Arc;
use storefront::{
    config::{self, Config},
    coupon::SqliteCouponRepository,
    invoice::SqliteInvoiceRepository,
    merchant::SqliteMerchantRepository,
    open_storage,
};
use storefront_types::coupon::repository::CouponRepository;
use storefront_types::coupon::service::CouponService;
use storefront_types::invoice::service::InvoiceService;
use storefront_types::invoice::InvoiceRepository;
use storefront_types::merchant::service::MerchantService;
use storefront_types::merchant::MerchantRepository;

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
        env::set_var("RUST_LOG", "INFO");
    }
    pretty_env_logger::formatted_timed_builder()
        .parse_default_env()
        .init();

    config::load_env_file()?;
    let config = Config::from_env()?;
    if let Some(dir) = std::path::Path::new(&config.database_path).parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Unable to create storage directory {dir:?}"))?;
    }

    // Each repository owns its connection; WAL lets them share the file
    let conn = open_storage(&config.database_path, config.busy_timeout).await?;
    let merchant_repository: Arc<dyn MerchantRepository> =
        Arc::new(SqliteMerchantRepository::init(conn.clone()).await?);
    let conn_coupons = open_storage(&config.database_path, config.busy_timeout).await?;
    let coupon_repository: Arc<dyn CouponRepository> =
        Arc::new(SqliteCouponRepository::init(conn_coupons.clone()).await?);
    let invoice_repository: Arc<dyn InvoiceRepository> =
        Arc::new(SqliteInvoiceRepository::init(conn.clone()).await?);

    let merchant_service = MerchantService::new(merchant_repository.clone()).start();
    let invoice_service =
        InvoiceService::new(invoice_repository.clone(), merchant_repository.clone()).start();
    let coupon_service = CouponService::new(
        coupon_repository,
        merchant_repository,
        invoice_repository,
    )
    .start();

    log::info!(
        "Listening on {}:{}, storage at {}",
        config.self_addr,
        config.port,
        config.database_path
    );
    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(Data::new(coupon_service.clone()))
            .app_data(Data::new(merchant_service.clone()))
            .app_data(Data::new(invoice_service.clone()))
            .configure(storefront::routes)
    })
    .bind((config.self_addr.as_str(), config.port))
    .with_context(|| {
        format!(
            "Failed to bind server to {}:{}. Is the port already in use?",
            config.self_addr, config.port
        )
    })?
    .run()
    .await?;

    for conn in [conn, conn_coupons] {
        conn.close().await.log_error("Unable to close storage");
    }
    Ok(())
}
