use crate::SqlWrapper;
use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Row};
use std::collections::HashMap;
use storefront_types::coupon::Coupon;
use storefront_types::invoice::{Invoice, InvoiceRepository, InvoiceStatus, NewInvoice};
use storefront_types::merchant::Merchant;
use tokio_rusqlite::Connection;
use typesafe_repository::IdentityOf;

pub mod controllers;

const INVOICE_COLUMNS: &str = "id, merchant_id, customer_id, coupon_id, status";

impl TryFrom<&Row<'_>> for SqlWrapper<Invoice> {
    type Error = rusqlite::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let status: String = row.get(4)?;
        let status = InvoiceStatus::try_from(status.as_str())
            .map_err(|err| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, err.into()))?;
        Ok(SqlWrapper(Invoice {
            id: row.get(0)?,
            merchant_id: row.get(1)?,
            customer_id: row.get(2)?,
            coupon_id: row.get(3)?,
            status,
        }))
    }
}

pub struct SqliteInvoiceRepository {
    conn: Connection,
}

impl SqliteInvoiceRepository {
    pub async fn init(conn: Connection) -> Result<Self, tokio_rusqlite::Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS invoice (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    merchant_id INTEGER NOT NULL REFERENCES merchant (id),
                    customer_id INTEGER,
                    coupon_id INTEGER REFERENCES coupon (id),
                    status TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS invoice_coupon ON invoice (coupon_id);
                CREATE INDEX IF NOT EXISTS invoice_merchant_status ON invoice (merchant_id, status);",
            )?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl InvoiceRepository for SqliteInvoiceRepository {
    async fn add(&self, invoice: NewInvoice) -> anyhow::Result<Invoice> {
        Ok(self
            .conn
            .call(move |conn| {
                let invoice = conn.query_row(
                    &format!(
                        "INSERT INTO invoice (merchant_id, customer_id, coupon_id, status)
                         VALUES (?1, ?2, ?3, ?4)
                         RETURNING {INVOICE_COLUMNS}"
                    ),
                    params![
                        invoice.merchant_id,
                        invoice.customer_id,
                        invoice.coupon_id,
                        invoice.status.to_string(),
                    ],
                    |r| SqlWrapper::<Invoice>::try_from(r),
                )?;
                Ok(invoice.into_inner())
            })
            .await?)
    }

    async fn list_by_merchant(
        &self,
        merchant: IdentityOf<Merchant>,
        status: Option<InvoiceStatus>,
    ) -> anyhow::Result<Vec<Invoice>> {
        let status = status.map(|s| s.to_string());
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {INVOICE_COLUMNS} FROM invoice
                     WHERE merchant_id = ?1 AND (?2 IS NULL OR status = ?2)
                     ORDER BY id"
                ))?;
                let items = stmt
                    .query_map(params![merchant, status], |r| {
                        SqlWrapper::<Invoice>::try_from(r).map(SqlWrapper::into_inner)
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?)
    }

    async fn count_by_coupon(&self, coupon: IdentityOf<Coupon>) -> anyhow::Result<u64> {
        Ok(self
            .conn
            .call(move |conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM invoice WHERE coupon_id = ?1",
                    [coupon],
                    |r| r.get(0),
                )?)
            })
            .await?)
    }

    async fn coupon_usage(
        &self,
        merchant: IdentityOf<Merchant>,
    ) -> anyhow::Result<HashMap<IdentityOf<Coupon>, u64>> {
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT i.coupon_id, COUNT(*) FROM invoice i
                     JOIN coupon c ON c.id = i.coupon_id
                     WHERE c.merchant_id = ?1
                     GROUP BY i.coupon_id",
                )?;
                let usage = stmt
                    .query_map([merchant], |r| Ok((r.get(0)?, r.get(1)?)))?
                    .collect::<Result<HashMap<_, _>, _>>()?;
                Ok(usage)
            })
            .await?)
    }
}
