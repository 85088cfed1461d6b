//! The endpoint for logging out the current user.

use axum::{http::StatusCode, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;

use crate::auth::cookie::invalidate_auth_cookie;

/// Handler for log-out requests.
///
/// Invalidates the auth cookies so that the client deletes them. Logging out
/// while not logged in is not an error.
pub async fn log_out_endpoint(jar: PrivateCookieJar) -> impl IntoResponse {
    (invalidate_auth_cookie(jar), StatusCode::NO_CONTENT)
}
