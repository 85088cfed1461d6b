//! Authentication middleware that validates cookies and gates admin routes.
//!
//! Requests that fail either guard get a 403 JSON response; neither guard
//! participates in ledger logic beyond deciding whether the request may
//! proceed.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, FromRequestParts, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;

use crate::{
    AppState,
    auth::cookie::get_user_id_from_cookies,
    user::{Role, UserId, get_user_by_id},
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// The logged-in caller, placed into request extensions by [auth_guard].
///
/// Route handlers can use the function argument
/// `Extension(user): Extension<AuthenticatedUser>` to receive it. This struct
/// doubles as the public JSON representation of a user; it never carries the
/// password hash.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    /// The user's ID.
    pub id: UserId,
    /// The name the user logs in with.
    pub username: String,
    /// The user's capability level.
    pub role: Role,
}

fn forbidden_response() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "forbidden" })),
    )
        .into_response()
}

/// Middleware function that checks for a valid authorization cookie.
///
/// The matching user is loaded from the database and placed into request
/// extensions, then the request is executed normally. Requests with a
/// missing, invalid, or expired cookie, or whose user no longer exists, get
/// a 403 response.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Rejecting request.");
            return forbidden_response();
        }
    };

    let user_id = match get_user_id_from_cookies(&jar) {
        Ok(user_id) => user_id,
        Err(_) => return forbidden_response(),
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(_) => {
                tracing::error!("Could not acquire the database lock in the auth middleware.");
                return forbidden_response();
            }
        };

        match get_user_by_id(user_id, &connection) {
            Ok(user) => user,
            // The cookie refers to a user that has since been deleted.
            Err(_) => return forbidden_response(),
        }
    };

    parts.extensions.insert(AuthenticatedUser {
        id: user.id,
        username: user.username,
        role: user.role,
    });

    next.run(Request::from_parts(parts, body)).await
}

/// Middleware function that rejects callers without the admin role.
///
/// Must be layered inside [auth_guard] so that the authenticated user is
/// available in request extensions; requests with no authenticated user are
/// rejected as well.
pub async fn admin_guard(request: Request, next: Next) -> Response {
    match request.extensions().get::<AuthenticatedUser>() {
        Some(user) if user.role == Role::Admin => next.run(request).await,
        Some(user) => {
            tracing::debug!("Access denied: {} is not an admin.", user.username);
            forbidden_response()
        }
        None => forbidden_response(),
    }
}
