use crate::invoice::{Invoice, InvoiceRepository, InvoiceStatus};
use crate::merchant::{Merchant, MerchantRepository};
use actix::prelude::*;
use anyhow::Context as AnyhowContext;
use std::sync::Arc;
use typesafe_repository::IdentityOf;

pub struct InvoiceService {
    invoices: Arc<dyn InvoiceRepository>,
    merchants: Arc<dyn MerchantRepository>,
}

impl InvoiceService {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        merchants: Arc<dyn MerchantRepository>,
    ) -> Self {
        Self {
            invoices,
            merchants,
        }
    }
}

impl Actor for InvoiceService {
    type Context = Context<Self>;
}

/// Resolves to `None` when the merchant does not exist
#[derive(Message)]
#[rtype(result = "Result<Option<Vec<Invoice>>, anyhow::Error>")]
pub struct List(pub IdentityOf<Merchant>, pub Option<InvoiceStatus>);

impl Handler<List> for InvoiceService {
    type Result = ResponseActFuture<Self, Result<Option<Vec<Invoice>>, anyhow::Error>>;

    fn handle(&mut self, List(merchant, status): List, _: &mut Self::Context) -> Self::Result {
        let invoices = self.invoices.clone();
        let merchants = self.merchants.clone();
        Box::pin(
            async move {
                if merchants.get_one(&merchant).await?.is_none() {
                    return Ok(None);
                }
                let list = invoices
                    .list_by_merchant(merchant, status)
                    .await
                    .context("Unable to list invoices")?;
                Ok(Some(list))
            }
            .into_actor(self),
        )
    }
}
