//! The read-only endpoints for the customer directory: list, search and
//! fetch-by-ID.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, database_id::CustomerId};

use super::core::{get_customer, list_customers, search_customers};

/// The state needed to query the customer directory.
#[derive(Debug, Clone)]
pub struct CustomerQueryState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CustomerQueryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List all customers, newest first.
pub async fn get_customers_endpoint(
    State(state): State<CustomerQueryState>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let customers = list_customers(&connection)?;

    Ok(Json(customers))
}

/// The query string for the customer search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// The text to match against customer names and phone numbers.
    #[serde(default)]
    pub query: String,
}

/// Search customers by first name, last name or phone number.
///
/// # Errors
/// Returns a 400 response if the query string is empty or missing.
pub async fn search_customers_endpoint(
    State(state): State<CustomerQueryState>,
    Query(search): Query<SearchQuery>,
) -> Result<impl IntoResponse, Error> {
    if search.query.trim().is_empty() {
        return Err(Error::MissingField("query"));
    }

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let customers = search_customers(&search.query, &connection)?;

    Ok(Json(customers))
}

/// Fetch a single customer by ID.
///
/// # Errors
/// Returns a 404 response if the customer does not exist.
pub async fn get_customer_endpoint(
    State(state): State<CustomerQueryState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let customer = get_customer(customer_id, &connection)?;

    Ok(Json(customer))
}
