//! Defines the core data model and database queries for customers.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::CustomerId};

// ============================================================================
// MODELS
// ============================================================================

/// A customer of the shop, i.e. someone whose running balance is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// The ID of the customer.
    pub id: CustomerId,
    /// The customer's first name.
    pub firstname: String,
    /// The customer's last name.
    pub lastname: String,
    /// The customer's phone number, if known.
    pub phone: Option<String>,
    /// Free-form notes about the customer.
    pub notes: Option<String>,
    /// When the customer record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the customer record was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The profile fields used to create or update a [Customer].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerForm {
    /// The customer's first name. Must not be empty.
    pub firstname: String,
    /// The customer's last name. Must not be empty.
    pub lastname: String,
    /// The customer's phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Free-form notes about the customer.
    #[serde(default)]
    pub notes: Option<String>,
}

impl CustomerForm {
    fn validate(&self) -> Result<(), Error> {
        if self.firstname.trim().is_empty() {
            return Err(Error::MissingField("firstname"));
        }

        if self.lastname.trim().is_empty() {
            return Err(Error::MissingField("lastname"));
        }

        Ok(())
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the customer table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_customer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS customer (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                firstname TEXT NOT NULL,
                lastname TEXT NOT NULL,
                phone TEXT,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create a new customer in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingField] if the first or last name is empty,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_customer(form: &CustomerForm, connection: &Connection) -> Result<Customer, Error> {
    form.validate()?;

    let now = OffsetDateTime::now_utc();

    let customer = connection
        .prepare(
            "INSERT INTO customer (firstname, lastname, phone, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, firstname, lastname, phone, notes, created_at, updated_at",
        )?
        .query_one(
            (
                form.firstname.trim(),
                form.lastname.trim(),
                &form.phone,
                &form.notes,
                now,
                now,
            ),
            map_customer_row,
        )?;

    Ok(customer)
}

/// Retrieve a customer from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid customer,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_customer(id: CustomerId, connection: &Connection) -> Result<Customer, Error> {
    connection
        .prepare(
            "SELECT id, firstname, lastname, phone, notes, created_at, updated_at
             FROM customer WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_customer_row)
        .map_err(|error| error.into())
}

/// Retrieve all customers, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn list_customers(connection: &Connection) -> Result<Vec<Customer>, Error> {
    connection
        .prepare(
            "SELECT id, firstname, lastname, phone, notes, created_at, updated_at
             FROM customer ORDER BY id DESC",
        )?
        .query_map([], map_customer_row)?
        .map(|customer| customer.map_err(|error| error.into()))
        .collect()
}

/// Retrieve all customers whose first name, last name or phone number contains
/// `query`, ignoring case, ordered by first name.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn search_customers(query: &str, connection: &Connection) -> Result<Vec<Customer>, Error> {
    let search_term = format!("%{}%", query.trim());

    connection
        .prepare(
            "SELECT id, firstname, lastname, phone, notes, created_at, updated_at
             FROM customer
             WHERE firstname LIKE :term OR lastname LIKE :term OR phone LIKE :term
             ORDER BY firstname ASC",
        )?
        .query_map(&[(":term", &search_term)], map_customer_row)?
        .map(|customer| customer.map_err(|error| error.into()))
        .collect()
}

/// Update the profile fields of the customer with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingField] if the first or last name is empty,
/// - or [Error::NotFound] if `id` does not refer to a valid customer,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_customer(
    id: CustomerId,
    form: &CustomerForm,
    connection: &Connection,
) -> Result<Customer, Error> {
    form.validate()?;

    connection
        .prepare(
            "UPDATE customer
             SET firstname = ?1, lastname = ?2, phone = ?3, notes = ?4, updated_at = ?5
             WHERE id = ?6
             RETURNING id, firstname, lastname, phone, notes, created_at, updated_at",
        )?
        .query_one(
            (
                form.firstname.trim(),
                form.lastname.trim(),
                &form.phone,
                &form.notes,
                OffsetDateTime::now_utc(),
                id,
            ),
            map_customer_row,
        )
        .map_err(|error| error.into())
}

/// Delete the customer with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid customer,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_customer(id: CustomerId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute("DELETE FROM customer WHERE id = ?1", (id,))?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Check whether a customer with `id` exists.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn customer_exists(id: CustomerId, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM customer WHERE id = ?1)",
            (id,),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Get the total number of customers in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn count_customers(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM customer;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Map a database row to a [Customer].
pub(crate) fn map_customer_row(row: &Row) -> Result<Customer, rusqlite::Error> {
    Ok(Customer {
        id: row.get(0)?,
        firstname: row.get(1)?,
        lastname: row.get(2)?,
        phone: row.get(3)?,
        notes: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
