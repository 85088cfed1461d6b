//! The endpoint for registering a new user account.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::AuthenticatedUser,
    password::PasswordHash,
    user::{Role, count_users, create_user},
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegisterUserState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegisterUserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials submitted to the registration endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    /// The name the new user will log in with.
    pub username: String,
    /// The new user's password in plain text.
    pub password: String,
}

/// Register a new user account.
///
/// The very first account registered becomes the admin; every later account
/// gets the staff role.
///
/// # Errors
/// Returns a 400 response if the username is empty or taken, or if the
/// password is too weak.
pub async fn register_user_endpoint(
    State(state): State<RegisterUserState>,
    Json(form): Json<RegisterForm>,
) -> Result<impl IntoResponse, Error> {
    let username = form.username.trim();
    if username.is_empty() {
        return Err(Error::MissingField("username"));
    }

    let password_hash = PasswordHash::from_raw_password(&form.password, PasswordHash::DEFAULT_COST)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let role = if count_users(&connection)? == 0 {
        Role::Admin
    } else {
        Role::Staff
    };

    let user = create_user(username, role, password_hash, &connection)?;

    tracing::info!("Registered user {} with role {}.", user.username, user.role);

    Ok((
        StatusCode::CREATED,
        Json(AuthenticatedUser {
            id: user.id,
            username: user.username,
            role: user.role,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        user::{Role, get_user_by_username},
    };

    use super::{RegisterForm, RegisterUserState, register_user_endpoint};

    const STRONG_PASSWORD: &str = "asomewhatlongpassword1";

    fn get_test_state() -> RegisterUserState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        RegisterUserState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn form(username: &str, password: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }

    #[tokio::test]
    async fn first_user_becomes_admin() {
        let state = get_test_state();

        let response = register_user_endpoint(State(state.clone()), Json(form("halima", STRONG_PASSWORD)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_username("halima", &connection).unwrap();
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn second_user_becomes_staff() {
        let state = get_test_state();
        register_user_endpoint(State(state.clone()), Json(form("halima", STRONG_PASSWORD)))
            .await
            .into_response();

        let response = register_user_endpoint(
            State(state.clone()),
            Json(form("warsame", STRONG_PASSWORD)),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_username("warsame", &connection).unwrap();
        assert_eq!(user.role, Role::Staff);
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let state = get_test_state();

        let response = register_user_endpoint(State(state), Json(form("halima", "hunter2")))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let state = get_test_state();
        register_user_endpoint(State(state.clone()), Json(form("halima", STRONG_PASSWORD)))
            .await
            .into_response();

        let response = register_user_endpoint(State(state), Json(form("halima", STRONG_PASSWORD)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_empty_username() {
        let state = get_test_state();

        let response = register_user_endpoint(State(state), Json(form("  ", STRONG_PASSWORD)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
