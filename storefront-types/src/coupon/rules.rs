//! Business rules every coupon write has to pass.
//!
//! The functions here are pure: the storage layer gathers an [`Existing`]
//! snapshot inside its write transaction and asks the rules for a verdict,
//! so the check and the write it guards are never separated.

use crate::coupon::{Coupon, CouponDraft};
use derive_more::{Deref, Display, Error};
use itertools::Itertools;
use rust_decimal::Decimal;

pub const ACTIVE_COUPON_LIMIT: usize = 5;

pub const FULL_NAME_MISSING: &str = "Full name must be present";
pub const CODE_MISSING: &str = "Code must be present";
pub const CODE_TAKEN: &str = "Code has already been taken";
pub const ACTIVE_MISSING: &str = "Active is not included in the list";
pub const MERCHANT_MISSING: &str = "Merchant must be present";
pub const USAGE_COUNT_MISSING: &str = "Usage count must be present";
pub const DISCOUNT_MISSING: &str = "one discount type (percent or dollar off) must be specified.";
pub const DISCOUNT_AMBIGUOUS: &str =
    "only one discount type (percent or dollar off) can be specified at a time.";
pub const PERCENT_OFF_NOT_POSITIVE: &str = "Percent off must be greater than 0";
pub const DOLLAR_OFF_NOT_POSITIVE: &str = "Dollar off must be greater than 0";
pub const ACTIVE_LIMIT_REACHED: &str = "This merchant already has 5 active coupons.";

/// Every message produced by a failed validation, in the order the checks ran
#[derive(Debug, Display, Error, Deref, Clone, PartialEq, Eq, Default)]
#[display("{}", sentence(_0))]
pub struct ValidationErrors(#[error(not(source))] Vec<String>);

impl ValidationErrors {
    pub fn single<S: Into<String>>(message: S) -> Self {
        Self(vec![message.into()])
    }
    pub fn add<S: Into<String>>(&mut self, message: S) {
        self.0.push(message.into());
    }
    pub fn contains(&self, message: &str) -> bool {
        self.0.iter().any(|m| m == message)
    }
    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
    /// Joins messages the way an English sentence lists things:
    /// `a`, `a and b`, `a, b, and c`
    pub fn to_sentence(&self) -> String {
        sentence(&self.0)
    }
    fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn sentence(messages: &[String]) -> String {
    match messages {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.iter().join(", ")),
    }
}

/// State of the store observed while validating a coupon
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Existing {
    pub code_taken: bool,
    /// Active coupons of the owning merchant, not counting the validated one
    pub active_coupons: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum Transition {
    #[display("activated")]
    Activated,
    #[display("deactivated")]
    Deactivated,
}

fn is_blank(s: &Option<String>) -> bool {
    s.as_deref().map_or(true, |s| s.trim().is_empty())
}

fn cap_reached(active_coupons: usize) -> bool {
    active_coupons >= ACTIVE_COUPON_LIMIT
}

/// Runs all checks and collects every failure instead of stopping at the first one
pub fn validate(draft: &CouponDraft, existing: &Existing) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if is_blank(&draft.full_name) {
        errors.add(FULL_NAME_MISSING);
    }
    if is_blank(&draft.code) {
        errors.add(CODE_MISSING);
    } else if existing.code_taken {
        errors.add(CODE_TAKEN);
    }
    if draft.active.is_none() {
        errors.add(ACTIVE_MISSING);
    }
    if draft.merchant_id.is_none() {
        errors.add(MERCHANT_MISSING);
    }
    if draft.usage_count.is_none() {
        errors.add(USAGE_COUNT_MISSING);
    }
    match (draft.percent_off, draft.dollar_off) {
        (None, None) => errors.add(DISCOUNT_MISSING),
        (Some(_), Some(_)) => errors.add(DISCOUNT_AMBIGUOUS),
        _ => (),
    }
    if draft.percent_off.is_some_and(|p| p <= Decimal::ZERO) {
        errors.add(PERCENT_OFF_NOT_POSITIVE);
    }
    if draft.dollar_off.is_some_and(|d| d <= Decimal::ZERO) {
        errors.add(DOLLAR_OFF_NOT_POSITIVE);
    }
    if draft.active == Some(true) && cap_reached(existing.active_coupons) {
        errors.add(ACTIVE_LIMIT_REACHED);
    }
    errors.into_result()
}

/// Flips `active`, guarding only the `Inactive -> Active` edge.
///
/// `other_active` must not include `coupon` itself. On rejection the coupon
/// is left untouched.
pub fn toggle_active(
    coupon: &mut Coupon,
    other_active: usize,
) -> Result<Transition, ValidationErrors> {
    let proposed = !coupon.active;
    if proposed && cap_reached(other_active) {
        return Err(ValidationErrors::single(ACTIVE_LIMIT_REACHED));
    }
    coupon.active = proposed;
    Ok(if proposed {
        Transition::Activated
    } else {
        Transition::Deactivated
    })
}
