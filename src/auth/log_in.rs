//! The endpoint for logging in a user with a username and password.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        cookie::{DEFAULT_COOKIE_DURATION, set_auth_cookie},
        middleware::AuthenticatedUser,
    },
    user::get_user_by_username,
};

/// The state needed to perform a log-in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

impl LogInState {
    /// Create a log-in state with the default cookie duration.
    pub fn new(cookie_key: Key, db_connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            cookie_key,
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection,
        }
    }
}

/// The credentials submitted to the log-in endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LogInForm {
    /// The name the user registered with.
    pub username: String,
    /// The user's password in plain text.
    pub password: String,
}

/// Handler for log-in requests.
///
/// On success the response carries the auth cookies and the logged-in user's
/// public details.
///
/// # Errors
/// Returns a 401 response if the username is unknown or the password does not
/// match. The two cases are deliberately indistinguishable to the client.
pub async fn log_in_endpoint(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Json(form): Json<LogInForm>,
) -> Result<impl IntoResponse, Error> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_by_username(&form.username, &connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?
    };

    let password_is_valid = user
        .password_hash
        .verify(&form.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !password_is_valid {
        return Err(Error::InvalidCredentials);
    }

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), "now".to_owned()))?;

    tracing::info!("User {} logged in.", user.username);

    Ok((
        jar,
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
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        password::PasswordHash,
        user::{Role, create_user},
    };

    use super::{LogInForm, LogInState, log_in_endpoint};

    const TEST_PASSWORD: &str = "okon";
    // The bcrypt hash of TEST_PASSWORD.
    const TEST_PASSWORD_HASH: &str = "$2b$12$Gwf0uvxH3L7JLfo0CC/NCOoijK2vQ/wbgP.LeNup8vj6gg31IiFkm";

    fn get_test_state() -> LogInState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_user(
            "halima",
            Role::Admin,
            PasswordHash::new_unchecked(TEST_PASSWORD_HASH),
            &conn,
        )
        .unwrap();

        LogInState::new(Key::generate(), Arc::new(Mutex::new(conn)))
    }

    fn get_test_jar(state: &LogInState) -> PrivateCookieJar {
        PrivateCookieJar::new(state.cookie_key.clone())
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let state = get_test_state();
        let jar = get_test_jar(&state);
        let form = LogInForm {
            username: "halima".to_owned(),
            password: TEST_PASSWORD.to_owned(),
        };

        let response = log_in_endpoint(State(state), jar, Json(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("set-cookie"));
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let state = get_test_state();
        let jar = get_test_jar(&state);
        let form = LogInForm {
            username: "halima".to_owned(),
            password: "thewrongpassword".to_owned(),
        };

        let response = log_in_endpoint(State(state), jar, Json(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_username() {
        let state = get_test_state();
        let jar = get_test_jar(&state);
        let form = LogInForm {
            username: "nobody".to_owned(),
            password: TEST_PASSWORD.to_owned(),
        };

        let response = log_in_endpoint(State(state), jar, Json(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
