use crate::SqlWrapper;
use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row};
use storefront_types::merchant::{Merchant, MerchantRepository, MerchantSummary};
use tokio_rusqlite::Connection;
use typesafe_repository::async_ops::Get;
use typesafe_repository::{IdentityOf, Repository};

pub mod controllers;

impl TryFrom<&Row<'_>> for SqlWrapper<Merchant> {
    type Error = rusqlite::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(SqlWrapper(Merchant {
            id: row.get(0)?,
            name: row.get(1)?,
        }))
    }
}

pub struct SqliteMerchantRepository {
    conn: Connection,
}

impl SqliteMerchantRepository {
    pub async fn init(conn: Connection) -> Result<Self, tokio_rusqlite::Error> {
        conn.call(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS merchant (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL
                )",
                [],
            )?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }
}

impl Repository<Merchant> for SqliteMerchantRepository {
    type Error = anyhow::Error;
}

#[async_trait]
impl Get<Merchant> for SqliteMerchantRepository {
    async fn get_one(&self, id: &IdentityOf<Merchant>) -> Result<Option<Merchant>, Self::Error> {
        let id = *id;
        Ok(self
            .conn
            .call(move |conn| {
                let merchant = conn
                    .query_row("SELECT id, name FROM merchant WHERE id = ?1", [id], |r| {
                        SqlWrapper::<Merchant>::try_from(r)
                    })
                    .optional()?;
                Ok(merchant.map(SqlWrapper::into_inner))
            })
            .await?)
    }
}

#[async_trait]
impl MerchantRepository for SqliteMerchantRepository {
    async fn add(&self, name: String) -> Result<Merchant, Self::Error> {
        Ok(self
            .conn
            .call(move |conn| {
                conn.execute("INSERT INTO merchant (name) VALUES (?1)", [&name])?;
                Ok(Merchant {
                    id: conn.last_insert_rowid(),
                    name,
                })
            })
            .await?)
    }

    async fn summary(
        &self,
        id: IdentityOf<Merchant>,
    ) -> Result<Option<MerchantSummary>, Self::Error> {
        Ok(self
            .conn
            .call(move |conn| {
                let summary = conn
                    .query_row(
                        "SELECT m.name,
                            (SELECT COUNT(*) FROM coupon c WHERE c.merchant_id = m.id),
                            (SELECT COUNT(*) FROM invoice i
                                JOIN coupon c ON c.id = i.coupon_id
                                WHERE i.merchant_id = m.id AND c.active = 1)
                         FROM merchant m WHERE m.id = ?1",
                        [id],
                        |r| {
                            Ok(MerchantSummary {
                                id,
                                name: r.get(0)?,
                                coupons_count: r.get(1)?,
                                invoice_coupon_count: r.get(2)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(summary)
            })
            .await?)
    }
}
