//! The endpoint for adding a customer to the directory.

use std::sync::{Arc, Mutex};

use axum::{Json, extract::FromRef, extract::State, http::StatusCode, response::IntoResponse};
use rusqlite::Connection;

use crate::{AppState, Error};

use super::core::{CustomerForm, create_customer};

/// The state needed to create a customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCustomerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create a new customer from a JSON body.
///
/// # Errors
/// Returns a 400 response if the first or last name is empty.
pub async fn create_customer_endpoint(
    State(state): State<CreateCustomerState>,
    Json(form): Json<CustomerForm>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let customer = create_customer(&form, &connection)?;

    Ok((StatusCode::CREATED, Json(customer)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{customer::get_customer, db::initialize};

    use super::{CreateCustomerState, CustomerForm, create_customer_endpoint};

    fn get_test_state() -> CreateCustomerState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        CreateCustomerState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn can_create_customer() {
        let state = get_test_state();
        let form = CustomerForm {
            firstname: "Asha".to_owned(),
            lastname: "Omar".to_owned(),
            phone: Some("0612345678".to_owned()),
            notes: None,
        };

        let response = create_customer_endpoint(State(state.clone()), Json(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        let customer = get_customer(1, &connection).unwrap();
        assert_eq!(customer.firstname, "Asha");
        assert_eq!(customer.phone.as_deref(), Some("0612345678"));
    }

    #[tokio::test]
    async fn create_rejects_missing_lastname() {
        let state = get_test_state();
        let form = CustomerForm {
            firstname: "Asha".to_owned(),
            lastname: "".to_owned(),
            phone: None,
            notes: None,
        };

        let response = create_customer_endpoint(State(state), Json(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
