use crate::coupon::Coupon;
use crate::merchant::Merchant;
use async_trait::async_trait;
use derive_more::Display;
use std::collections::HashMap;
use typesafe_repository::IdentityOf;

pub mod service;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    #[display("packaged")]
    Packaged,
    #[display("shipped")]
    Shipped,
    #[display("returned")]
    Returned,
}

impl TryFrom<&str> for InvoiceStatus {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "packaged" => Ok(Self::Packaged),
            "shipped" => Ok(Self::Shipped),
            "returned" => Ok(Self::Returned),
            x => Err(anyhow::anyhow!("Unknown invoice status: {x}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub id: i64,
    pub merchant_id: IdentityOf<Merchant>,
    pub customer_id: Option<i64>,
    pub coupon_id: Option<IdentityOf<Coupon>>,
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub merchant_id: IdentityOf<Merchant>,
    pub customer_id: Option<i64>,
    pub coupon_id: Option<IdentityOf<Coupon>>,
    pub status: InvoiceStatus,
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn add(&self, invoice: NewInvoice) -> anyhow::Result<Invoice>;
    /// Invoices of `merchant` in creation order, optionally with one status only
    async fn list_by_merchant(
        &self,
        merchant: IdentityOf<Merchant>,
        status: Option<InvoiceStatus>,
    ) -> anyhow::Result<Vec<Invoice>>;
    async fn count_by_coupon(&self, coupon: IdentityOf<Coupon>) -> anyhow::Result<u64>;
    /// Usage of every coupon of `merchant` that appears on at least one invoice
    async fn coupon_usage(
        &self,
        merchant: IdentityOf<Merchant>,
    ) -> anyhow::Result<HashMap<IdentityOf<Coupon>, u64>>;
}
