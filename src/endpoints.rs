//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/customers/{customer_id}',
//! use [format_endpoint].

/// The route for registering a new user account.
pub const USERS_REGISTER: &str = "/api/users/register";
/// The route for logging in a user.
pub const USERS_LOGIN: &str = "/api/users/login";
/// The route for the client to log out the current user.
pub const USERS_LOGOUT: &str = "/api/users/logout";
/// The route returning the currently logged-in user.
pub const USERS_ME: &str = "/api/users/me";

/// The route to list or create customers.
pub const CUSTOMERS: &str = "/api/customers";
/// The route to search customers by name or phone number.
pub const CUSTOMERS_SEARCH: &str = "/api/customers/search";
/// The route to access a single customer.
pub const CUSTOMER: &str = "/api/customers/{customer_id}";
/// The route returning a customer's current balance.
pub const CUSTOMER_BALANCE: &str = "/api/customers/{customer_id}/balance";

/// The route to list (admin) or append transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route returning a single customer's ledger.
pub const CUSTOMER_TRANSACTIONS: &str = "/api/transactions/customer/{customer_id}";

/// The route returning the dashboard summary.
pub const SUMMARY: &str = "/api/summary";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace. For
/// example, in the endpoint path '/api/customers/{customer_id}',
/// '{customer_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::USERS_REGISTER,
            endpoints::USERS_LOGIN,
            endpoints::USERS_LOGOUT,
            endpoints::USERS_ME,
            endpoints::CUSTOMERS,
            endpoints::CUSTOMERS_SEARCH,
            endpoints::SUMMARY,
            endpoints::TRANSACTIONS,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }

        for endpoint in [
            endpoints::CUSTOMER,
            endpoints::CUSTOMER_BALANCE,
            endpoints::CUSTOMER_TRANSACTIONS,
        ] {
            assert_endpoint_is_valid_uri(&format_endpoint(endpoint, 1));
        }
    }

    #[test]
    fn format_endpoint_replaces_parameter() {
        assert_eq!(
            format_endpoint(endpoints::CUSTOMER, 42),
            "/api/customers/42"
        );
        assert_eq!(
            format_endpoint(endpoints::CUSTOMER_BALANCE, 7),
            "/api/customers/7/balance"
        );
    }

    #[test]
    fn format_endpoint_without_parameter_is_identity() {
        assert_eq!(format_endpoint(endpoints::CUSTOMERS, 42), endpoints::CUSTOMERS);
    }
}
