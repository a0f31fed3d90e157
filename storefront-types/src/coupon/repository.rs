use crate::coupon::rules::Transition;
use crate::coupon::{ByMerchant, Coupon, CouponDraft, CouponError};
use crate::merchant::Merchant;
use async_trait::async_trait;
use typesafe_repository::async_ops::{Get, Select};
use typesafe_repository::{IdentityOf, Repository};

/// Storage for coupons.
///
/// `create` and `toggle_active` must run the rules from
/// [`crate::coupon::rules`] and the write they guard as one atomic unit, so
/// that concurrent requests for the same merchant can never push it past the
/// active coupon limit.
#[async_trait]
pub trait CouponRepository:
    Repository<Coupon, Error = anyhow::Error>
    + Get<Coupon>
    + Select<Coupon, ByMerchant>
    + Send
    + Sync
{
    async fn create(&self, draft: CouponDraft) -> Result<Coupon, CouponError>;

    async fn toggle_active(
        &self,
        merchant: IdentityOf<Merchant>,
        id: IdentityOf<Coupon>,
    ) -> Result<(Coupon, Transition), CouponError>;

    async fn count_active(
        &self,
        merchant: IdentityOf<Merchant>,
        excluding: Option<IdentityOf<Coupon>>,
    ) -> Result<usize, Self::Error>;
}
