//! Defines the core data model and database operations for the ledger.
//!
//! The one rule that matters lives in [append_transaction]: a new transaction
//! reads the customer's latest balance, applies the signed amount, and
//! persists the row together with the resulting balance, all under a single
//! SQLite transaction.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    customer::customer_exists,
    database_id::{CustomerId, TransactionId},
    user::UserId,
};

// ============================================================================
// MODELS
// ============================================================================

/// The direction of a ledger transaction.
///
/// A credit increases the customer's balance, a debit decreases it. Amounts
/// are always positive; the type carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money received from the customer; increases their balance.
    Credit,
    /// Goods given on credit or money paid out; decreases their balance.
    Debit,
}

impl TransactionType {
    /// The string stored in the database for this transaction type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(Error::InvalidTransactionType(other.to_owned())),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single entry in a customer's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The customer whose ledger this transaction belongs to.
    pub customer_id: CustomerId,
    /// The user who recorded the transaction.
    pub user_id: UserId,
    /// Whether the transaction increases or decreases the balance.
    pub transaction_type: TransactionType,
    /// The positive amount of money moved.
    pub amount: Decimal,
    /// The customer's running balance immediately after this transaction.
    pub balance_after: Decimal,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The fields needed to append a transaction to a customer's ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The customer whose ledger to append to.
    pub customer_id: CustomerId,
    /// The user recording the transaction.
    pub user_id: UserId,
    /// Whether the transaction increases or decreases the balance.
    pub transaction_type: TransactionType,
    /// The positive amount of money moved.
    pub amount: Decimal,
}

/// A transaction joined with the customer and recording user's names, for the
/// admin transaction listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// The transaction itself.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The customer's first name.
    pub firstname: String,
    /// The customer's last name.
    pub lastname: String,
    /// The username of the user who recorded the transaction.
    pub username: String,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Append a new transaction to a customer's ledger and return the persisted
/// row, including the running balance it produced.
///
/// The read-compute-insert sequence runs inside an IMMEDIATE SQLite
/// transaction. Together with the connection-level mutex held by the caller,
/// this serializes appends so that two concurrent requests cannot both derive
/// their balance from the same predecessor and silently lose an update. The
/// row and its `balance_after` commit together or not at all.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is zero or negative,
/// - or [Error::NotFound] if the customer does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn append_transaction(
    new: NewTransaction,
    connection: &mut Connection,
) -> Result<Transaction, Error> {
    if new.amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(new.amount));
    }

    let sql_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if !customer_exists(new.customer_id, &sql_transaction)? {
        return Err(Error::NotFound);
    }

    let previous_balance = current_balance(new.customer_id, &sql_transaction)?;
    let new_balance = match new.transaction_type {
        TransactionType::Credit => previous_balance + new.amount,
        TransactionType::Debit => previous_balance - new.amount,
    };

    let transaction = sql_transaction
        .prepare(
            "INSERT INTO ledger_transaction
                (customer_id, user_id, transaction_type, amount, balance_after, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, customer_id, user_id, transaction_type, amount, balance_after,
                created_at",
        )?
        .query_one(
            (
                new.customer_id,
                new.user_id.as_i64(),
                new.transaction_type.as_str(),
                new.amount.to_string(),
                new_balance.to_string(),
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )?;

    sql_transaction.commit()?;

    Ok(transaction)
}

/// Get a customer's current balance: the `balance_after` of their most recent
/// transaction, or zero if they have none.
///
/// "Most recent" is the total order `(created_at, id)`; the ID tie-break
/// disambiguates transactions recorded within the same timestamp resolution.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn current_balance(customer_id: CustomerId, connection: &Connection) -> Result<Decimal, Error> {
    let balance = connection
        .query_row(
            "SELECT balance_after FROM ledger_transaction
             WHERE customer_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
            (customer_id,),
            |row| decimal_from_column(row, 0),
        )
        .optional()?;

    Ok(balance.unwrap_or(Decimal::ZERO))
}

/// Retrieve a customer's transactions, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn list_customer_transactions(
    customer_id: CustomerId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, customer_id, user_id, transaction_type, amount, balance_after, created_at
             FROM ledger_transaction
             WHERE customer_id = :customer_id
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map(&[(":customer_id", &customer_id)], map_transaction_row)?
        .map(|transaction| transaction.map_err(|error| error.into()))
        .collect()
}

/// Retrieve all transactions joined with customer and user names, newest
/// first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn list_all_transactions(connection: &Connection) -> Result<Vec<TransactionRecord>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.customer_id, t.user_id, t.transaction_type, t.amount,
                t.balance_after, t.created_at, c.firstname, c.lastname, u.username
             FROM ledger_transaction t
             JOIN customer c ON t.customer_id = c.id
             JOIN user u ON t.user_id = u.id
             ORDER BY t.created_at DESC, t.id DESC",
        )?
        .query_map([], |row| {
            Ok(TransactionRecord {
                transaction: map_transaction_row(row)?,
                firstname: row.get(7)?,
                lastname: row.get(8)?,
                username: row.get(9)?,
            })
        })?
        .map(|record| record.map_err(|error| error.into()))
        .collect()
}

/// The latest balance of every customer that has at least one transaction.
///
/// Uses the same `(created_at, id)` order as [current_balance].
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn latest_balances(connection: &Connection) -> Result<Vec<(CustomerId, Decimal)>, Error> {
    connection
        .prepare(
            "SELECT t.customer_id, t.balance_after
             FROM ledger_transaction t
             WHERE t.id = (SELECT id FROM ledger_transaction
                           WHERE customer_id = t.customer_id
                           ORDER BY created_at DESC, id DESC
                           LIMIT 1)",
        )?
        .query_map([], |row| Ok((row.get(0)?, decimal_from_column(row, 1)?)))?
        .map(|balance| balance.map_err(|error| error.into()))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM ledger_transaction;", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the ledger transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS ledger_transaction (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                transaction_type TEXT NOT NULL,
                amount TEXT NOT NULL,
                balance_after TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(customer_id) REFERENCES customer(id) ON DELETE CASCADE,
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('ledger_transaction', 0)",
        (),
    )?;

    // Composite index backing the latest-balance and per-customer listing queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_customer_created
         ON ledger_transaction(customer_id, created_at, id);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Transaction].
pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_type: String = row.get(3)?;
    let transaction_type = raw_type.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("invalid transaction type \"{raw_type}\"").into(),
        )
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        user_id: UserId::new(row.get(2)?),
        transaction_type,
        amount: decimal_from_column(row, 4)?,
        balance_after: decimal_from_column(row, 5)?,
        created_at: row.get(6)?,
    })
}

/// Read a decimal stored as TEXT from `row` at `index`.
pub(crate) fn decimal_from_column(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    Decimal::from_str(&text).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })
}

// ============================================================================
// TESTS
// ============================================================================
