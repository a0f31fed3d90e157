use crate::merchant::{Merchant, MerchantRepository, MerchantSummary};
use actix::prelude::*;
use anyhow::Context as AnyhowContext;
use std::sync::Arc;
use typesafe_repository::IdentityOf;

pub struct MerchantService {
    repo: Arc<dyn MerchantRepository>,
}

impl MerchantService {
    pub fn new(repo: Arc<dyn MerchantRepository>) -> Self {
        Self { repo }
    }
}

impl Actor for MerchantService {
    type Context = Context<Self>;
}

#[derive(Message)]
#[rtype(result = "Result<Option<Merchant>, anyhow::Error>")]
pub struct Get(pub IdentityOf<Merchant>);

#[derive(Message)]
#[rtype(result = "Result<Merchant, anyhow::Error>")]
pub struct Add(pub String);

#[derive(Message)]
#[rtype(result = "Result<Option<MerchantSummary>, anyhow::Error>")]
pub struct Summary(pub IdentityOf<Merchant>);

impl Handler<Get> for MerchantService {
    type Result = ResponseActFuture<Self, Result<Option<Merchant>, anyhow::Error>>;

    fn handle(&mut self, Get(id): Get, _: &mut Self::Context) -> Self::Result {
        let repo = self.repo.clone();
        Box::pin(
            async move { repo.get_one(&id).await.context("Unable to get merchant") }
                .into_actor(self),
        )
    }
}

impl Handler<Add> for MerchantService {
    type Result = ResponseActFuture<Self, Result<Merchant, anyhow::Error>>;

    fn handle(&mut self, Add(name): Add, _: &mut Self::Context) -> Self::Result {
        let repo = self.repo.clone();
        Box::pin(
            async move {
                let merchant = repo.add(name).await.context("Unable to add merchant")?;
                log::info!("Merchant {} added", merchant.id);
                Ok(merchant)
            }
            .into_actor(self),
        )
    }
}

impl Handler<Summary> for MerchantService {
    type Result = ResponseActFuture<Self, Result<Option<MerchantSummary>, anyhow::Error>>;

    fn handle(&mut self, Summary(id): Summary, _: &mut Self::Context) -> Self::Result {
        let repo = self.repo.clone();
        Box::pin(
            async move {
                repo.summary(id)
                    .await
                    .context("Unable to summarize merchant")
            }
            .into_actor(self),
        )
    }
}
