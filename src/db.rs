//! Functions for initializing the application's database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, customer::create_customer_table, ledger::create_transaction_table,
    user::create_user_table,
};

/// Create the tables for the application's domain models.
///
/// Tables are created inside a single exclusive transaction so that a
/// partially initialized database is never left behind.
///
/// # Errors
/// Returns an error if there was an SQL error creating any of the tables.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // The ledger relies on foreign keys to reject transactions for customers
    // that do not exist.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_customer_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
