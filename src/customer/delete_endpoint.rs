//! The endpoint for removing a customer from the directory.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;

use crate::{AppState, Error, database_id::CustomerId};

use super::core::delete_customer;

/// The state needed to delete a customer.
#[derive(Debug, Clone)]
pub struct DeleteCustomerState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCustomerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete the customer with `customer_id`.
///
/// Deleting a customer also deletes their ledger via the transaction table's
/// foreign key.
///
/// # Errors
/// Returns a 404 response if the customer does not exist.
pub async fn delete_customer_endpoint(
    State(state): State<DeleteCustomerState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_customer(customer_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
