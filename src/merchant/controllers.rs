use crate::control::{ControllerError, Document, Resource, Response};
use actix::prelude::*;
use actix_web::web::{Data, Path};
use actix_web::{get, HttpResponse};
use storefront_types::merchant::service::{self, MerchantService};
use storefront_types::merchant::Merchant;
use typesafe_repository::IdentityOf;

#[get("/merchants/{merchant_id}")]
pub async fn show(
    merchant_id: Path<IdentityOf<Merchant>>,
    merchant_service: Data<Addr<MerchantService>>,
) -> Response {
    let summary = merchant_service
        .send(service::Summary(merchant_id.into_inner()))
        .await??
        .ok_or_else(|| ControllerError::NotFound("Merchant not found".to_string()))?;
    Ok(HttpResponse::Ok().json(Document {
        data: Resource::new("merchant", summary.id, &summary),
    }))
}
