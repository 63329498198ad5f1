pub mod common;
pub mod invite;
pub mod login_log;
pub mod pagination;
pub mod user;

pub use common::*;
pub use invite::*;
pub use login_log::*;
pub use pagination::*;
pub use user::*;
