//! The customer directory: the shop's record of who it extends credit to.
//!
//! Customers are profile rows (name, phone, notes). Their balances live in
//! the [crate::ledger] module, which references customers by ID.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod query_endpoints;

pub use core::{
    Customer, CustomerForm, count_customers, create_customer, create_customer_table,
    customer_exists, delete_customer, get_customer, list_customers, search_customers,
    update_customer,
};
pub use create_endpoint::create_customer_endpoint;
pub use delete_endpoint::delete_customer_endpoint;
pub use edit_endpoint::edit_customer_endpoint;
pub use query_endpoints::{
    get_customer_endpoint, get_customers_endpoint, search_customers_endpoint,
};
