//! User authentication: cookie handling, the log-in/log-out endpoints and the
//! middleware guards that protect routes.

mod cookie;
mod log_in;
mod log_out;
mod middleware;

pub(crate) use cookie::DEFAULT_COOKIE_DURATION;
pub use log_in::log_in_endpoint;
pub use log_out::log_out_endpoint;
pub use middleware::{AuthenticatedUser, admin_guard, auth_guard};
