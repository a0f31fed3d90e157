use crate::coupon::Coupon;
use derive_more::{Display, Error};
use std::str::FromStr;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display("active must be either true or false, got {value:?}")]
pub struct InvalidActiveFlag {
    #[error(not(source))]
    pub value: String,
}

/// Strictly parsed `active` query flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveFilter(pub bool);

impl FromStr for ActiveFilter {
    type Err = InvalidActiveFlag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(Self(true)),
            "false" => Ok(Self(false)),
            value => Err(InvalidActiveFlag {
                value: value.to_string(),
            }),
        }
    }
}

impl ActiveFilter {
    /// Absent and empty parameters mean "do not filter"
    pub fn from_param(param: Option<&str>) -> Result<Option<Self>, InvalidActiveFlag> {
        match param {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }
}

/// Keeps the input order; `None` returns the collection untouched
pub fn filter_by_active(coupons: Vec<Coupon>, filter: Option<ActiveFilter>) -> Vec<Coupon> {
    match filter {
        Some(ActiveFilter(active)) => coupons.into_iter().filter(|c| c.active == active).collect(),
        None => coupons,
    }
}
