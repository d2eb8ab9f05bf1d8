//! Engine operations, grouped by the part of the platform they touch.
//!
//! Each module adds an `impl Engine` block; the methods validate, mutate,
//! and end with a commit.

pub mod admin;
pub mod backup;
pub mod friends;
pub mod profile;
pub mod session;
pub mod teams;
pub mod tournaments;
pub mod vip;
pub mod wallet;

pub use vip::VipPaymentQuote;
