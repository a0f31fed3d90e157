use crate::SqlWrapper;
use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use rust_decimal::Decimal;
use std::str::FromStr;
use storefront_types::coupon::repository::CouponRepository;
use storefront_types::coupon::rules::{self, Existing, Transition, ValidationErrors, CODE_TAKEN};
use storefront_types::coupon::{ByMerchant, Coupon, CouponDraft, CouponError};
use storefront_types::merchant::Merchant;
use tokio_rusqlite::Connection;
use typesafe_repository::async_ops::{Get, Select};
use typesafe_repository::{IdentityOf, Repository};

pub mod controllers;

const COUPON_COLUMNS: &str =
    "id, full_name, code, percent_off, dollar_off, active, merchant_id, usage_count";

fn decimal_column(row: &Row, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    row.get::<_, Option<String>>(idx)?
        .map(|s| Decimal::from_str(&s))
        .transpose()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into()))
}

impl TryFrom<&Row<'_>> for SqlWrapper<Coupon> {
    type Error = rusqlite::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(SqlWrapper(Coupon {
            id: row.get(0)?,
            full_name: row.get(1)?,
            code: row.get(2)?,
            percent_off: decimal_column(row, 3)?,
            dollar_off: decimal_column(row, 4)?,
            active: row.get(5)?,
            merchant_id: row.get(6)?,
            usage_count: row.get(7)?,
        }))
    }
}

fn count_active_in(
    conn: &rusqlite::Connection,
    merchant: IdentityOf<Merchant>,
    excluding: Option<IdentityOf<Coupon>>,
) -> rusqlite::Result<usize> {
    conn.query_row(
        "SELECT COUNT(*) FROM coupon WHERE merchant_id = ?1 AND active = 1 AND id IS NOT ?2",
        params![merchant, excluding],
        |r| r.get(0),
    )
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub struct SqliteCouponRepository {
    conn: Connection,
}

impl SqliteCouponRepository {
    pub async fn init(conn: Connection) -> Result<Self, tokio_rusqlite::Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS coupon (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    full_name TEXT NOT NULL,
                    code TEXT NOT NULL UNIQUE,
                    percent_off TEXT,
                    dollar_off TEXT,
                    active INTEGER NOT NULL,
                    merchant_id INTEGER NOT NULL REFERENCES merchant (id),
                    usage_count INTEGER NOT NULL DEFAULT 0,
                    CHECK ((percent_off IS NULL) <> (dollar_off IS NULL))
                );
                CREATE INDEX IF NOT EXISTS coupon_merchant_active ON coupon (merchant_id, active);",
            )?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }
}

impl Repository<Coupon> for SqliteCouponRepository {
    type Error = anyhow::Error;
}

#[async_trait]
impl Get<Coupon> for SqliteCouponRepository {
    async fn get_one(&self, id: &IdentityOf<Coupon>) -> Result<Option<Coupon>, Self::Error> {
        let id = *id;
        Ok(self
            .conn
            .call(move |conn| {
                let coupon = conn
                    .query_row(
                        &format!("SELECT {COUPON_COLUMNS} FROM coupon WHERE id = ?1"),
                        [id],
                        |r| SqlWrapper::<Coupon>::try_from(r),
                    )
                    .optional()?;
                Ok(coupon.map(SqlWrapper::into_inner))
            })
            .await?)
    }
}

#[async_trait]
impl Select<Coupon, ByMerchant> for SqliteCouponRepository {
    async fn select(&self, ByMerchant(merchant): &ByMerchant) -> Result<Vec<Coupon>, Self::Error> {
        let merchant = *merchant;
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COUPON_COLUMNS} FROM coupon WHERE merchant_id = ?1 ORDER BY id"
                ))?;
                let items = stmt
                    .query_map([merchant], |r| {
                        SqlWrapper::<Coupon>::try_from(r).map(SqlWrapper::into_inner)
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?)
    }
}

#[async_trait]
impl CouponRepository for SqliteCouponRepository {
    async fn create(&self, draft: CouponDraft) -> Result<Coupon, CouponError> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                if let Some(merchant) = draft.merchant_id {
                    let exists: bool = tx.query_row(
                        "SELECT EXISTS (SELECT 1 FROM merchant WHERE id = ?1)",
                        [merchant],
                        |r| r.get(0),
                    )?;
                    if !exists {
                        return Ok(Err(CouponError::MerchantNotFound));
                    }
                }
                let code_taken: bool = match draft.code.as_deref() {
                    Some(code) => tx.query_row(
                        "SELECT EXISTS (SELECT 1 FROM coupon WHERE code = ?1)",
                        [code],
                        |r| r.get(0),
                    )?,
                    None => false,
                };
                let active_coupons = match draft.merchant_id {
                    Some(merchant) => count_active_in(&tx, merchant, None)?,
                    None => 0,
                };
                let existing = Existing {
                    code_taken,
                    active_coupons,
                };
                if let Err(errors) = rules::validate(&draft, &existing) {
                    return Ok(Err(errors.into()));
                }
                let inserted = tx.execute(
                    "INSERT INTO coupon (full_name, code, percent_off, dollar_off, active, merchant_id, usage_count)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        draft.full_name,
                        draft.code,
                        draft.percent_off.map(|d| d.to_string()),
                        draft.dollar_off.map(|d| d.to_string()),
                        draft.active,
                        draft.merchant_id,
                        draft.usage_count,
                    ],
                );
                match inserted {
                    Err(err) if is_unique_violation(&err) => {
                        return Ok(Err(ValidationErrors::single(CODE_TAKEN).into()))
                    }
                    res => res?,
                };
                let id = tx.last_insert_rowid();
                tx.commit()?;
                Ok(draft.into_coupon(id).ok_or_else(|| {
                    CouponError::Unexpected(anyhow::anyhow!("Coupon {id} saved incomplete"))
                }))
            })
            .await
            .map_err(anyhow::Error::from)?
    }

    async fn toggle_active(
        &self,
        merchant: IdentityOf<Merchant>,
        id: IdentityOf<Coupon>,
    ) -> Result<(Coupon, Transition), CouponError> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let coupon = tx
                    .query_row(
                        &format!(
                            "SELECT {COUPON_COLUMNS} FROM coupon WHERE id = ?1 AND merchant_id = ?2"
                        ),
                        [id, merchant],
                        |r| SqlWrapper::<Coupon>::try_from(r),
                    )
                    .optional()?;
                let Some(SqlWrapper(mut coupon)) = coupon else {
                    return Ok(Err(CouponError::CouponNotFound));
                };
                let other_active = count_active_in(&tx, merchant, Some(id))?;
                let transition = match rules::toggle_active(&mut coupon, other_active) {
                    Ok(transition) => transition,
                    Err(errors) => return Ok(Err(errors.into())),
                };
                tx.execute(
                    "UPDATE coupon SET active = ?1 WHERE id = ?2",
                    params![coupon.active, id],
                )?;
                tx.commit()?;
                Ok(Ok((coupon, transition)))
            })
            .await
            .map_err(anyhow::Error::from)?
    }

    async fn count_active(
        &self,
        merchant: IdentityOf<Merchant>,
        excluding: Option<IdentityOf<Coupon>>,
    ) -> Result<usize, Self::Error> {
        Ok(self
            .conn
            .call(move |conn| Ok(count_active_in(conn, merchant, excluding)?))
            .await?)
    }
}
