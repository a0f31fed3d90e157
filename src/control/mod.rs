use actix_web::HttpResponse;
use derive_more::{Display, Error};
use serde::Serialize;
use storefront_types::coupon::filter::InvalidActiveFlag;
use storefront_types::coupon::CouponError;

pub type Response = Result<HttpResponse, ControllerError>;

/// Top level `{"data": ..}` wrapper of every successful response
#[derive(Serialize, Debug)]
pub struct Document<T> {
    pub data: T,
}

#[derive(Serialize, Debug)]
pub struct Resource<A> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attributes: A,
}

impl<A> Resource<A> {
    pub fn new(kind: &'static str, id: impl ToString, attributes: A) -> Self {
        Self {
            id: id.to_string(),
            kind,
            attributes,
        }
    }
}

#[derive(Debug, Display, Error)]
pub enum ControllerError {
    #[error(ignore)]
    NotFound(String),
    /// Validation failure reported as one sentence
    #[error(ignore)]
    Rejected(String),
    /// Validation failure reported message by message
    #[error(ignore)]
    #[display("{}", _0.join(", "))]
    Unprocessable(Vec<String>),
    #[error(ignore)]
    Unexpected(anyhow::Error),
    #[error(ignore)]
    InternalServerError(anyhow::Error),
    #[error(ignore)]
    #[display("Invalid field {field}")]
    InvalidInput { field: String, msg: String },
}

impl ControllerError {
    /// Maps a failed creation, where validation messages are joined in a sentence
    pub fn rejected(err: CouponError) -> Self {
        match err {
            CouponError::Invalid(errors) => Self::Rejected(errors.to_sentence()),
            err => err.into(),
        }
    }
}

impl From<CouponError> for ControllerError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::Invalid(errors) => Self::Unprocessable(errors.into_messages()),
            err @ (CouponError::MerchantNotFound | CouponError::CouponNotFound) => {
                Self::NotFound(err.to_string())
            }
            CouponError::Unexpected(err) => Self::Unexpected(err),
        }
    }
}

impl From<InvalidActiveFlag> for ControllerError {
    fn from(err: InvalidActiveFlag) -> Self {
        Self::InvalidInput {
            field: "active".to_string(),
            msg: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for ControllerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unexpected(err)
    }
}

impl From<actix::MailboxError> for ControllerError {
    fn from(err: actix::MailboxError) -> Self {
        Self::InternalServerError(err.into())
    }
}

impl actix_web::error::ResponseError for ControllerError {
    fn error_response(&self) -> HttpResponse {
        log::warn!("{self:?}");
        use ControllerError::*;
        match self {
            NotFound(msg) => HttpResponse::NotFound().json(serde_json::json!({ "error": msg })),
            Rejected(sentence) => {
                HttpResponse::UnprocessableEntity().json(serde_json::json!({ "error": sentence }))
            }
            Unprocessable(messages) => {
                HttpResponse::UnprocessableEntity().json(serde_json::json!({ "errors": messages }))
            }
            Unexpected(err) => HttpResponse::UnprocessableEntity()
                .json(serde_json::json!({ "errors": [err.to_string()] })),
            InternalServerError(err) => HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": err.to_string() })),
            InvalidInput { field, msg } => {
                HttpResponse::BadRequest().json(serde_json::json!({ "error": format!("{field}: {msg}") }))
            }
        }
    }
}
