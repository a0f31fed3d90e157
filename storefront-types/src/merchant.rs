use async_trait::async_trait;
use serde::Serialize;
use typesafe_repository::async_ops::Get;
use typesafe_repository::macros::Id;
use typesafe_repository::{GetIdentity, Identity, IdentityOf, RefIdentity, Repository};

pub mod service;

#[derive(Id, Clone, Debug, PartialEq, Eq)]
#[Id(get_id, ref_id)]
pub struct Merchant {
    #[id]
    pub id: i64,
    pub name: String,
}

/// Coupon related figures shown alongside a merchant
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MerchantSummary {
    #[serde(skip)]
    pub id: IdentityOf<Merchant>,
    pub name: String,
    pub coupons_count: u64,
    pub invoice_coupon_count: u64,
}

#[async_trait]
pub trait MerchantRepository:
    Repository<Merchant, Error = anyhow::Error> + Get<Merchant> + Send + Sync
{
    async fn add(&self, name: String) -> Result<Merchant, Self::Error>;
    async fn summary(
        &self,
        id: IdentityOf<Merchant>,
    ) -> Result<Option<MerchantSummary>, Self::Error>;
}
