#![deny(clippy::unwrap_used)]

use actix_web::web::{self, JsonConfig, PathConfig, QueryConfig, ServiceConfig};
use control::ControllerError;
use std::time::Duration;
use tokio_rusqlite::Connection;

pub mod config;
pub mod control;
pub mod coupon;
pub mod invoice;
pub mod merchant;

#[derive(Debug)]
pub struct SqlWrapper<T>(pub T);

impl<T> SqlWrapper<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Opens a database file with the pragmas every repository relies on
pub async fn open_storage<P: AsRef<std::path::Path>>(
    path: P,
    busy_timeout: Duration,
) -> Result<Connection, anyhow::Error> {
    let conn = Connection::open(path).await?;
    prepare_connection(&conn, busy_timeout).await?;
    Ok(conn)
}

pub async fn prepare_connection(
    conn: &Connection,
    busy_timeout: Duration,
) -> Result<(), tokio_rusqlite::Error> {
    conn.call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        Ok(())
    })
    .await
}

/// Registers every API route along with extractor error handlers
pub fn routes(cfg: &mut ServiceConfig) {
    cfg.app_data(JsonConfig::default().error_handler(|err, _| {
        ControllerError::InvalidInput {
            field: "body".to_string(),
            msg: err.to_string(),
        }
        .into()
    }))
    .app_data(QueryConfig::default().error_handler(|err, _| {
        ControllerError::InvalidInput {
            field: "query".to_string(),
            msg: err.to_string(),
        }
        .into()
    }))
    .app_data(
        PathConfig::default()
            .error_handler(|err, _| ControllerError::NotFound(err.to_string()).into()),
    )
    .service(
        web::scope("/api/v1")
            .service(coupon::controllers::index)
            .service(coupon::controllers::create)
            .service(coupon::controllers::show)
            .service(coupon::controllers::toggle)
            .service(invoice::controllers::index)
            .service(merchant::controllers::show),
    );
}
