use crate::coupon::filter::{filter_by_active, ActiveFilter};
use crate::coupon::repository::CouponRepository;
use crate::coupon::{ByMerchant, Coupon, CouponDraft, CouponError, CouponView};
use crate::invoice::InvoiceRepository;
use crate::merchant::{Merchant, MerchantRepository};
use actix::prelude::*;
use std::sync::Arc;
use typesafe_repository::IdentityOf;

pub struct CouponService {
    coupons: Arc<dyn CouponRepository>,
    merchants: Arc<dyn MerchantRepository>,
    invoices: Arc<dyn InvoiceRepository>,
}

impl CouponService {
    pub fn new(
        coupons: Arc<dyn CouponRepository>,
        merchants: Arc<dyn MerchantRepository>,
        invoices: Arc<dyn InvoiceRepository>,
    ) -> Self {
        Self {
            coupons,
            merchants,
            invoices,
        }
    }
}

impl Actor for CouponService {
    type Context = Context<Self>;
}

#[derive(Message)]
#[rtype(result = "Result<Vec<CouponView>, CouponError>")]
pub struct List(pub IdentityOf<Merchant>, pub Option<ActiveFilter>);

#[derive(Message)]
#[rtype(result = "Result<CouponView, CouponError>")]
pub struct Get(pub IdentityOf<Merchant>, pub IdentityOf<Coupon>);

#[derive(Message)]
#[rtype(result = "Result<CouponView, CouponError>")]
pub struct Create(pub IdentityOf<Merchant>, pub CouponDraft);

#[derive(Message)]
#[rtype(result = "Result<CouponView, CouponError>")]
pub struct Toggle(pub IdentityOf<Merchant>, pub IdentityOf<Coupon>);

#[derive(Message)]
#[rtype(result = "Result<usize, CouponError>")]
pub struct CountActive(pub IdentityOf<Merchant>, pub Option<IdentityOf<Coupon>>);

async fn ensure_merchant(
    merchants: &dyn MerchantRepository,
    id: IdentityOf<Merchant>,
) -> Result<(), CouponError> {
    match merchants.get_one(&id).await? {
        Some(_) => Ok(()),
        None => Err(CouponError::MerchantNotFound),
    }
}

async fn view(invoices: &dyn InvoiceRepository, coupon: Coupon) -> Result<CouponView, CouponError> {
    let usage_count = invoices.count_by_coupon(coupon.id).await?;
    Ok(CouponView {
        coupon,
        usage_count,
    })
}

impl Handler<List> for CouponService {
    type Result = ResponseActFuture<Self, Result<Vec<CouponView>, CouponError>>;

    fn handle(&mut self, List(merchant, filter): List, _: &mut Self::Context) -> Self::Result {
        let coupons = self.coupons.clone();
        let merchants = self.merchants.clone();
        let invoices = self.invoices.clone();
        Box::pin(
            async move {
                ensure_merchant(merchants.as_ref(), merchant).await?;
                let list = coupons.select(&ByMerchant(merchant)).await?;
                let usage = invoices.coupon_usage(merchant).await?;
                Ok(filter_by_active(list, filter)
                    .into_iter()
                    .map(|coupon| CouponView {
                        usage_count: usage.get(&coupon.id).copied().unwrap_or_default(),
                        coupon,
                    })
                    .collect())
            }
            .into_actor(self),
        )
    }
}

impl Handler<Get> for CouponService {
    type Result = ResponseActFuture<Self, Result<CouponView, CouponError>>;

    fn handle(&mut self, Get(merchant, id): Get, _: &mut Self::Context) -> Self::Result {
        let coupons = self.coupons.clone();
        let merchants = self.merchants.clone();
        let invoices = self.invoices.clone();
        Box::pin(
            async move {
                ensure_merchant(merchants.as_ref(), merchant).await?;
                let coupon = coupons
                    .get_one(&id)
                    .await?
                    .filter(|c| c.merchant_id == merchant)
                    .ok_or(CouponError::CouponNotFound)?;
                view(invoices.as_ref(), coupon).await
            }
            .into_actor(self),
        )
    }
}

impl Handler<Create> for CouponService {
    type Result = ResponseActFuture<Self, Result<CouponView, CouponError>>;

    fn handle(&mut self, Create(merchant, mut draft): Create, _: &mut Self::Context) -> Self::Result {
        let coupons = self.coupons.clone();
        let invoices = self.invoices.clone();
        draft.merchant_id = Some(merchant);
        draft.usage_count.get_or_insert(0);
        Box::pin(
            async move {
                let coupon = match coupons.create(draft).await {
                    Ok(coupon) => coupon,
                    Err(CouponError::Invalid(errors)) => {
                        log::warn!("Coupon rejected for merchant {merchant}: {errors}");
                        return Err(CouponError::Invalid(errors));
                    }
                    Err(err) => return Err(err),
                };
                log::info!(
                    "Coupon {} ({}) created for merchant {merchant}, active: {}",
                    coupon.id,
                    coupon.code,
                    coupon.active
                );
                view(invoices.as_ref(), coupon).await
            }
            .into_actor(self),
        )
    }
}

impl Handler<Toggle> for CouponService {
    type Result = ResponseActFuture<Self, Result<CouponView, CouponError>>;

    fn handle(&mut self, Toggle(merchant, id): Toggle, _: &mut Self::Context) -> Self::Result {
        let coupons = self.coupons.clone();
        let merchants = self.merchants.clone();
        let invoices = self.invoices.clone();
        Box::pin(
            async move {
                ensure_merchant(merchants.as_ref(), merchant).await?;
                let (coupon, transition) = match coupons.toggle_active(merchant, id).await {
                    Ok(res) => res,
                    Err(CouponError::Invalid(errors)) => {
                        log::warn!("Coupon {id} of merchant {merchant} not toggled: {errors}");
                        return Err(CouponError::Invalid(errors));
                    }
                    Err(err) => return Err(err),
                };
                log::info!("Coupon {id} of merchant {merchant} {transition}");
                view(invoices.as_ref(), coupon).await
            }
            .into_actor(self),
        )
    }
}

impl Handler<CountActive> for CouponService {
    type Result = ResponseActFuture<Self, Result<usize, CouponError>>;

    fn handle(
        &mut self,
        CountActive(merchant, excluding): CountActive,
        _: &mut Self::Context,
    ) -> Self::Result {
        let coupons = self.coupons.clone();
        Box::pin(
            async move { Ok(coupons.count_active(merchant, excluding).await?) }.into_actor(self),
        )
    }
}
