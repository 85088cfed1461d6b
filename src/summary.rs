//! The endpoint producing the dashboard summary: headline numbers about the
//! customer directory and the ledger.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::IntoResponse,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    AppState, Error,
    customer::count_customers,
    ledger::{TransactionType, count_transactions, decimal_from_column, latest_balances},
};

/// The state needed to compute the summary.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Aggregate numbers about the customer directory and the ledger.
///
/// "Paid" and "owed" are derived from each customer's latest balance: a
/// positive balance is money the shop holds for the customer, a negative
/// balance is money the customer owes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// The number of customers in the directory.
    pub total_customers: u32,
    /// The number of ledger transactions.
    pub total_transactions: u32,
    /// The number of credit transactions.
    pub credit_count: u32,
    /// The number of debit transactions.
    pub debit_count: u32,
    /// The mean transaction amount, or zero if there are no transactions.
    pub average_transaction: Decimal,
    /// The sum of all positive latest balances.
    pub total_paid: Decimal,
    /// The absolute sum of all negative latest balances.
    pub total_owed: Decimal,
    /// How many customers currently hold a positive balance.
    pub customers_with_balance: u32,
    /// How many customers currently hold a negative balance.
    pub customers_with_debt: u32,
}

/// Compute the summary over the whole database.
///
/// Decimal sums are folded in Rust rather than delegated to SQLite, which
/// would coerce the stored amounts to floats.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn compute_summary(connection: &Connection) -> Result<Summary, Error> {
    let total_customers = count_customers(connection)?;
    let total_transactions = count_transactions(connection)?;

    let mut credit_count = 0;
    let mut debit_count = 0;
    let mut amount_sum = Decimal::ZERO;
    let movements = connection
        .prepare("SELECT transaction_type, amount FROM ledger_transaction")?
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, decimal_from_column(row, 1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (raw_type, amount) in movements {
        match raw_type.parse::<TransactionType>()? {
            TransactionType::Credit => credit_count += 1,
            TransactionType::Debit => debit_count += 1,
        }
        amount_sum += amount;
    }
    let average_transaction = if total_transactions == 0 {
        Decimal::ZERO
    } else {
        amount_sum / Decimal::from(total_transactions)
    };

    let mut total_paid = Decimal::ZERO;
    let mut total_owed = Decimal::ZERO;
    let mut customers_with_balance = 0;
    let mut customers_with_debt = 0;
    for (_, balance) in latest_balances(connection)? {
        if balance > Decimal::ZERO {
            total_paid += balance;
            customers_with_balance += 1;
        } else if balance < Decimal::ZERO {
            total_owed += balance.abs();
            customers_with_debt += 1;
        }
    }

    Ok(Summary {
        total_customers,
        total_transactions,
        credit_count,
        debit_count,
        average_transaction,
        total_paid,
        total_owed,
        customers_with_balance,
        customers_with_debt,
    })
}

/// Get the dashboard summary.
pub async fn get_summary_endpoint(
    State(state): State<SummaryState>,
) -> Result<impl IntoResponse, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let summary = compute_summary(&connection)?;

    Ok(Json(summary))
}
