use crate::control::{ControllerError, Document, Resource, Response};
use actix::prelude::*;
use actix_web::web::{Data, Path, Query};
use actix_web::{get, HttpResponse};
use serde::{Deserialize, Serialize};
use storefront_types::coupon::Coupon;
use storefront_types::invoice::service::{self, InvoiceService};
use storefront_types::invoice::{Invoice, InvoiceStatus};
use storefront_types::merchant::Merchant;
use typesafe_repository::IdentityOf;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceAttributes {
    customer_id: Option<i64>,
    merchant_id: IdentityOf<Merchant>,
    coupon_id: Option<IdentityOf<Coupon>>,
    status: String,
}

fn resource(invoice: &Invoice) -> Resource<InvoiceAttributes> {
    Resource::new(
        "invoice",
        invoice.id,
        InvoiceAttributes {
            customer_id: invoice.customer_id,
            merchant_id: invoice.merchant_id,
            coupon_id: invoice.coupon_id,
            status: invoice.status.to_string(),
        },
    )
}

#[derive(Deserialize)]
pub struct InvoicesQuery {
    status: Option<String>,
}

#[get("/merchants/{merchant_id}/invoices")]
pub async fn index(
    merchant_id: Path<IdentityOf<Merchant>>,
    query: Query<InvoicesQuery>,
    invoice_service: Data<Addr<InvoiceService>>,
) -> Response {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(s) => Some(InvoiceStatus::try_from(s).map_err(|err| {
            ControllerError::InvalidInput {
                field: "status".to_string(),
                msg: err.to_string(),
            }
        })?),
    };
    let invoices = invoice_service
        .send(service::List(merchant_id.into_inner(), status))
        .await??
        .ok_or_else(|| ControllerError::NotFound("Merchant not found".to_string()))?;
    Ok(HttpResponse::Ok().json(Document {
        data: invoices.iter().map(resource).collect::<Vec<_>>(),
    }))
}
