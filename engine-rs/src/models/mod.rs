pub mod notification;
pub mod system;
pub mod team;
pub mod tournament;
pub mod user;
pub mod vip;
pub mod wallet;

pub use notification::*;
pub use system::*;
pub use team::*;
pub use tournament::*;
pub use user::*;
pub use vip::*;
pub use wallet::*;

use uuid::Uuid;

/// Prefixed record id, e.g. `user_3f2a...`.
pub(crate) fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}
