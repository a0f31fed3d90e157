use crate::control::{ControllerError, Document, Resource, Response};
use actix::prelude::*;
use actix_web::web::{Data, Json, Path, Query};
use actix_web::{get, patch, post, HttpResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_types::coupon::filter::ActiveFilter;
use storefront_types::coupon::service::{self, CouponService};
use storefront_types::coupon::{Coupon, CouponDraft, CouponView};
use storefront_types::merchant::Merchant;
use typesafe_repository::IdentityOf;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponAttributes<'a> {
    full_name: &'a str,
    code: &'a str,
    #[serde(with = "rust_decimal::serde::float_option")]
    percent_off: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    dollar_off: Option<Decimal>,
    active: bool,
    merchant_id: IdentityOf<Merchant>,
    usage_count: u64,
}

fn resource(view: &CouponView) -> Resource<CouponAttributes<'_>> {
    let CouponView { coupon, usage_count } = view;
    let Coupon {
        id,
        full_name,
        code,
        percent_off,
        dollar_off,
        active,
        merchant_id,
        usage_count: _,
    } = coupon;
    Resource::new(
        "coupon",
        id,
        CouponAttributes {
            full_name,
            code,
            percent_off: *percent_off,
            dollar_off: *dollar_off,
            active: *active,
            merchant_id: *merchant_id,
            usage_count: *usage_count,
        },
    )
}

#[derive(Deserialize)]
pub struct CouponsQuery {
    active: Option<String>,
}

#[get("/merchants/{merchant_id}/coupons")]
pub async fn index(
    merchant_id: Path<IdentityOf<Merchant>>,
    query: Query<CouponsQuery>,
    coupon_service: Data<Addr<CouponService>>,
) -> Response {
    let filter = ActiveFilter::from_param(query.active.as_deref())?;
    let coupons = coupon_service
        .send(service::List(merchant_id.into_inner(), filter))
        .await??;
    Ok(HttpResponse::Ok().json(Document {
        data: coupons.iter().map(resource).collect::<Vec<_>>(),
    }))
}

#[post("/merchants/{merchant_id}/coupons")]
pub async fn create(
    merchant_id: Path<IdentityOf<Merchant>>,
    draft: Json<CouponDraft>,
    coupon_service: Data<Addr<CouponService>>,
) -> Response {
    let coupon = coupon_service
        .send(service::Create(merchant_id.into_inner(), draft.into_inner()))
        .await?
        .map_err(ControllerError::rejected)?;
    Ok(HttpResponse::Created().json(Document {
        data: resource(&coupon),
    }))
}

#[get("/merchants/{merchant_id}/coupons/{id}")]
pub async fn show(
    path: Path<(IdentityOf<Merchant>, IdentityOf<Coupon>)>,
    coupon_service: Data<Addr<CouponService>>,
) -> Response {
    let (merchant_id, id) = path.into_inner();
    let coupon = coupon_service
        .send(service::Get(merchant_id, id))
        .await??;
    Ok(HttpResponse::Ok().json(Document {
        data: resource(&coupon),
    }))
}

#[patch("/merchants/{merchant_id}/coupons/{id}")]
pub async fn toggle(
    path: Path<(IdentityOf<Merchant>, IdentityOf<Coupon>)>,
    coupon_service: Data<Addr<CouponService>>,
) -> Response {
    let (merchant_id, id) = path.into_inner();
    let coupon = coupon_service
        .send(service::Toggle(merchant_id, id))
        .await??;
    Ok(HttpResponse::Ok().json(Document {
        data: resource(&coupon),
    }))
}
