//! Application router configuration with unprotected, authenticated, and
//! admin-only route groups.

use axum::{
    Extension, Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    auth::{AuthenticatedUser, admin_guard, auth_guard, log_in_endpoint, log_out_endpoint},
    customer::{
        create_customer_endpoint, delete_customer_endpoint, edit_customer_endpoint,
        get_customer_endpoint, get_customers_endpoint, search_customers_endpoint,
    },
    endpoints,
    ledger::{
        append_transaction_endpoint, get_customer_balance_endpoint,
        get_customer_transactions_endpoint, get_transactions_endpoint,
    },
    register_user::register_user_endpoint,
    summary::get_summary_endpoint,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::USERS_REGISTER, post(register_user_endpoint))
        .route(endpoints::USERS_LOGIN, post(log_in_endpoint));

    let protected_routes = Router::new()
        .route(endpoints::USERS_ME, get(get_current_user))
        .route(endpoints::USERS_LOGOUT, post(log_out_endpoint))
        .route(endpoints::CUSTOMERS, get(get_customers_endpoint))
        .route(endpoints::CUSTOMERS_SEARCH, get(search_customers_endpoint))
        .route(endpoints::CUSTOMER, get(get_customer_endpoint))
        .route(
            endpoints::CUSTOMER_BALANCE,
            get(get_customer_balance_endpoint),
        )
        .route(endpoints::TRANSACTIONS, post(append_transaction_endpoint))
        .route(
            endpoints::CUSTOMER_TRANSACTIONS,
            get(get_customer_transactions_endpoint),
        )
        .route(endpoints::SUMMARY, get(get_summary_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let admin_routes = Router::new()
        .route(endpoints::CUSTOMERS, post(create_customer_endpoint))
        .route(endpoints::CUSTOMER, put(edit_customer_endpoint))
        .route(endpoints::CUSTOMER, delete(delete_customer_endpoint))
        .route(endpoints::TRANSACTIONS, get(get_transactions_endpoint))
        .layer(middleware::from_fn(admin_guard))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(admin_routes)
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Return the currently logged-in user, as placed into request extensions by
/// the auth middleware.
async fn get_current_user(Extension(user): Extension<AuthenticatedUser>) -> Response {
    Json(user).into_response()
}

/// The JSON 404 response for unknown routes.
async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
}

#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use cookie::CookieJar;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{AppState, endpoints, endpoints::format_endpoint};

    use super::build_router;

    const ADMIN_PASSWORD: &str = "asomewhatlongpassword1";
    const STAFF_PASSWORD: &str = "anotherdecentpassword2";

    fn get_test_server() -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        let state = AppState::new(conn, "42").unwrap();

        TestServer::new(build_router(state))
    }

    /// Register a user and log them in, returning the auth cookies.
    ///
    /// The first registered user becomes the admin.
    async fn register_and_log_in(server: &TestServer, username: &str, password: &str) -> CookieJar {
        server
            .post(endpoints::USERS_REGISTER)
            .json(&json!({ "username": username, "password": password }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::USERS_LOGIN)
            .json(&json!({ "username": username, "password": password }))
            .await;
        response.assert_status_ok();

        response.cookies()
    }

    async fn create_customer(
        server: &TestServer,
        jar: &CookieJar,
        firstname: &str,
        lastname: &str,
    ) -> i64 {
        let response = server
            .post(endpoints::CUSTOMERS)
            .add_cookies(jar.clone())
            .json(&json!({ "firstname": firstname, "lastname": lastname }))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn unauthenticated_requests_are_rejected() {
        let server = get_test_server();

        let response = server.get(endpoints::CUSTOMERS).await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn staff_cannot_use_admin_routes() {
        let server = get_test_server();
        let _admin_jar = register_and_log_in(&server, "halima", ADMIN_PASSWORD).await;
        let staff_jar = register_and_log_in(&server, "warsame", STAFF_PASSWORD).await;

        let response = server
            .post(endpoints::CUSTOMERS)
            .add_cookies(staff_jar)
            .json(&json!({ "firstname": "Asha", "lastname": "Omar" }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn staff_can_append_transactions() {
        let server = get_test_server();
        let admin_jar = register_and_log_in(&server, "halima", ADMIN_PASSWORD).await;
        let staff_jar = register_and_log_in(&server, "warsame", STAFF_PASSWORD).await;
        let customer_id = create_customer(&server, &admin_jar, "Asha", "Omar").await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .add_cookies(staff_jar)
            .json(&json!({
                "customer_id": customer_id,
                "transaction_type": "credit",
                "amount": 10.0,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["balance_after"].as_f64().unwrap(), 10.0);
    }

    #[tokio::test]
    async fn ledger_scenario_round_trip() {
        let server = get_test_server();
        let jar = register_and_log_in(&server, "halima", ADMIN_PASSWORD).await;
        let customer_id = create_customer(&server, &jar, "Asha", "Omar").await;

        for (transaction_type, amount, expected_balance) in [
            ("credit", 100.0, 100.0),
            ("debit", 30.0, 70.0),
            ("credit", 5.50, 75.50),
        ] {
            let response = server
                .post(endpoints::TRANSACTIONS)
                .add_cookies(jar.clone())
                .json(&json!({
                    "customer_id": customer_id,
                    "transaction_type": transaction_type,
                    "amount": amount,
                }))
                .await;
            response.assert_status(StatusCode::CREATED);
            assert_eq!(
                response.json::<Value>()["balance_after"].as_f64().unwrap(),
                expected_balance
            );
        }

        let balance = server
            .get(&format_endpoint(endpoints::CUSTOMER_BALANCE, customer_id))
            .add_cookies(jar.clone())
            .await
            .json::<Value>();
        assert_eq!(balance["balance"].as_f64().unwrap(), 75.50);

        let transactions = server
            .get(&format_endpoint(
                endpoints::CUSTOMER_TRANSACTIONS,
                customer_id,
            ))
            .add_cookies(jar)
            .await
            .json::<Value>();
        let balances: Vec<f64> = transactions
            .as_array()
            .unwrap()
            .iter()
            .map(|transaction| transaction["balance_after"].as_f64().unwrap())
            .collect();
        assert_eq!(balances, vec![75.50, 70.0, 100.0]);
    }

    #[tokio::test]
    async fn balance_of_new_customer_is_zero() {
        let server = get_test_server();
        let jar = register_and_log_in(&server, "halima", ADMIN_PASSWORD).await;
        let customer_id = create_customer(&server, &jar, "Asha", "Omar").await;

        let balance = server
            .get(&format_endpoint(endpoints::CUSTOMER_BALANCE, customer_id))
            .add_cookies(jar)
            .await
            .json::<Value>();

        assert_eq!(balance["balance"].as_f64().unwrap(), 0.0);
    }

    #[tokio::test]
    async fn invalid_append_does_not_persist_a_row() {
        let server = get_test_server();
        let jar = register_and_log_in(&server, "halima", ADMIN_PASSWORD).await;
        let customer_id = create_customer(&server, &jar, "Asha", "Omar").await;

        server
            .post(endpoints::TRANSACTIONS)
            .add_cookies(jar.clone())
            .json(&json!({
                "customer_id": customer_id,
                "transaction_type": "credit",
                "amount": -10.0,
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let transactions = server
            .get(&format_endpoint(
                endpoints::CUSTOMER_TRANSACTIONS,
                customer_id,
            ))
            .add_cookies(jar)
            .await
            .json::<Value>();
        assert!(transactions.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn me_returns_the_logged_in_user() {
        let server = get_test_server();
        let jar = register_and_log_in(&server, "halima", ADMIN_PASSWORD).await;

        let user = server
            .get(endpoints::USERS_ME)
            .add_cookies(jar)
            .await
            .json::<Value>();

        assert_eq!(user["username"], "halima");
        assert_eq!(user["role"], "admin");
        assert_eq!(user["password"], Value::Null);
    }

    #[tokio::test]
    async fn log_out_clears_the_auth_cookies() {
        let server = get_test_server();
        let jar = register_and_log_in(&server, "halima", ADMIN_PASSWORD).await;

        let response = server.post(endpoints::USERS_LOGOUT).add_cookies(jar).await;

        response.assert_status(StatusCode::NO_CONTENT);
        let cleared_jar = response.cookies();
        server
            .get(endpoints::USERS_ME)
            .add_cookies(cleared_jar)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_route_returns_json_404() {
        let server = get_test_server();

        let response = server.get("/api/bogus").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
