//! The endpoint for appending a transaction to a customer's ledger.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{AppState, Error, auth::AuthenticatedUser, database_id::CustomerId};

use super::core::{NewTransaction, append_transaction};

/// The state needed to append a transaction.
#[derive(Debug, Clone)]
pub struct AppendTransactionState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AppendTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body for appending a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct AppendTransactionForm {
    /// The customer whose ledger to append to.
    pub customer_id: CustomerId,
    /// "credit" or "debit".
    ///
    /// Kept as a string so that unknown types produce this API's 400 error
    /// rather than a deserialization failure.
    pub transaction_type: String,
    /// The positive amount of money moved.
    pub amount: Decimal,
}

/// Append a transaction to a customer's ledger and return the persisted row.
///
/// The recording user is taken from the authenticated session.
///
/// # Errors
/// Returns a 400 response if the amount is zero or negative or the
/// transaction type is unrecognized, or a 404 response if the customer does
/// not exist.
pub async fn append_transaction_endpoint(
    State(state): State<AppendTransactionState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(form): Json<AppendTransactionForm>,
) -> Result<impl IntoResponse, Error> {
    let transaction_type = form.transaction_type.parse()?;

    let mut connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = append_transaction(
        NewTransaction {
            customer_id: form.customer_id,
            user_id: user.id,
            transaction_type,
            amount: form.amount,
        },
        &mut connection,
    )?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use rust_decimal::dec;

    use crate::{
        auth::AuthenticatedUser,
        customer::{CustomerForm, create_customer},
        database_id::CustomerId,
        db::initialize,
        ledger::{count_transactions, current_balance},
        password::PasswordHash,
        user::{Role, create_user},
    };

    use super::{AppendTransactionForm, AppendTransactionState, append_transaction_endpoint};

    fn get_test_state() -> (AppendTransactionState, AuthenticatedUser, CustomerId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let user = create_user(
            "halima",
            Role::Staff,
            PasswordHash::new_unchecked("$2b$04$notarealhashnotarealhashnotarealha"),
            &conn,
        )
        .unwrap();
        let customer = create_customer(
            &CustomerForm {
                firstname: "Asha".to_owned(),
                lastname: "Omar".to_owned(),
                phone: None,
                notes: None,
            },
            &conn,
        )
        .unwrap();

        let state = AppendTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let authenticated_user = AuthenticatedUser {
            id: user.id,
            username: user.username,
            role: user.role,
        };

        (state, authenticated_user, customer.id)
    }

    #[tokio::test]
    async fn can_append_transaction() {
        let (state, user, customer_id) = get_test_state();
        let form = AppendTransactionForm {
            customer_id,
            transaction_type: "credit".to_owned(),
            amount: dec!(25.00),
        };

        let response = append_transaction_endpoint(State(state.clone()), Extension(user), Json(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(current_balance(customer_id, &connection).unwrap(), dec!(25.00));
    }

    #[tokio::test]
    async fn append_rejects_unknown_transaction_type() {
        let (state, user, customer_id) = get_test_state();
        let form = AppendTransactionForm {
            customer_id,
            transaction_type: "deposit".to_owned(),
            amount: dec!(25.00),
        };

        let response = append_transaction_endpoint(State(state.clone()), Extension(user), Json(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn append_rejects_non_positive_amount() {
        let (state, user, customer_id) = get_test_state();
        let form = AppendTransactionForm {
            customer_id,
            transaction_type: "debit".to_owned(),
            amount: dec!(0),
        };

        let response = append_transaction_endpoint(State(state.clone()), Extension(user), Json(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn append_rejects_unknown_customer() {
        let (state, user, _) = get_test_state();
        let form = AppendTransactionForm {
            customer_id: 42,
            transaction_type: "credit".to_owned(),
            amount: dec!(25.00),
        };

        let response = append_transaction_endpoint(State(state.clone()), Extension(user), Json(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }
}
