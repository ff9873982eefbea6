pub const SESSION_USER_KEY: &str = "user_identity";

mod oauth;
mod session;
mod session_helpers;

pub use oauth::oauth_callback_handler;
pub use session::{logout_handler, me_handler};
