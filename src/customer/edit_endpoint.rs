//! The endpoint for updating a customer's profile fields.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::IntoResponse,
};
use rusqlite::Connection;

use crate::{AppState, Error, database_id::CustomerId};

use super::core::{CustomerForm, update_customer};

/// The state needed to update a customer.
#[derive(Debug, Clone)]
pub struct EditCustomerState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCustomerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Replace the profile fields of the customer with `customer_id`.
///
/// # Errors
/// Returns a 400 response if the first or last name is empty, or a 404
/// response if the customer does not exist.
pub async fn edit_customer_endpoint(
    State(state): State<EditCustomerState>,
    Path(customer_id): Path<CustomerId>,
    Json(form): Json<CustomerForm>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let customer = update_customer(customer_id, &form, &connection)?;

    Ok(Json(customer))
}
