pub mod coupon;
pub mod invoice;
pub mod merchant;
