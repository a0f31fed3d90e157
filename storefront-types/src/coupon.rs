use crate::coupon::rules::ValidationErrors;
use crate::merchant::Merchant;
use derive_more::{Display, Error};
use rust_decimal::Decimal;
use serde::Deserialize;
use typesafe_repository::macros::Id;
use typesafe_repository::{GetIdentity, Identity, IdentityOf, RefIdentity};
use typesafe_repository::{SelectBy, Selector};

pub mod filter;
pub mod repository;
pub mod rules;
pub mod service;

#[derive(Id, Clone, Debug, PartialEq, Eq)]
#[Id(get_id, ref_id)]
pub struct Coupon {
    #[id]
    pub id: i64,
    pub full_name: String,
    pub code: String,
    pub percent_off: Option<Decimal>,
    pub dollar_off: Option<Decimal>,
    pub active: bool,
    pub merchant_id: IdentityOf<Merchant>,
    /// Stored with every row but never incremented; reads report the
    /// invoice-derived count from [`CouponView`] instead
    pub usage_count: u32,
}

/// Attributes of a coupon that is not persisted yet.
///
/// Every field is optional so that missing input surfaces as a validation
/// message instead of a deserialization failure.
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CouponDraft {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub percent_off: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub dollar_off: Option<Decimal>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(skip)]
    pub merchant_id: Option<IdentityOf<Merchant>>,
    #[serde(skip)]
    pub usage_count: Option<u32>,
}

impl CouponDraft {
    /// Builds the persisted record once the draft passed validation
    pub fn into_coupon(self, id: IdentityOf<Coupon>) -> Option<Coupon> {
        Some(Coupon {
            id,
            full_name: self.full_name?,
            code: self.code?,
            percent_off: self.percent_off,
            dollar_off: self.dollar_off,
            active: self.active?,
            merchant_id: self.merchant_id?,
            usage_count: self.usage_count?,
        })
    }
}

/// Coupon as presented to clients, with usage counted from invoices
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CouponView {
    pub coupon: Coupon,
    pub usage_count: u64,
}

pub struct ByMerchant(pub IdentityOf<Merchant>);

impl Selector for ByMerchant {}
impl SelectBy<ByMerchant> for Coupon {}

#[derive(Debug, Display, Error)]
pub enum CouponError {
    #[display("{_0}")]
    Invalid(ValidationErrors),
    #[display("Merchant not found")]
    MerchantNotFound,
    #[display("Coupon not found")]
    CouponNotFound,
    #[error(ignore)]
    #[display("{_0}")]
    Unexpected(anyhow::Error),
}

impl From<ValidationErrors> for CouponError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Invalid(errors)
    }
}

impl From<anyhow::Error> for CouponError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unexpected(err)
    }
}
