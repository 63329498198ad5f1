pub mod invite_histories;
pub mod login_logs;
pub mod users;
pub mod wechat_open_ids;

pub use invite_histories as invite_history_entity;
pub use login_logs as login_log_entity;
pub use users as user_entity;
pub use wechat_open_ids as wechat_open_id_entity;

pub use invite_histories::InviteStatus;
pub use login_logs::{LoginCommand, LoginType};
pub use users::{Gender, UserStatus};
