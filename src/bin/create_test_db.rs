use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::dec;

use shopbook::{
    PasswordHash, ValidatedPassword,
    customer::{CustomerForm, create_customer},
    initialize_db,
    ledger::{NewTransaction, TransactionType, append_transaction},
    user::{Role, create_user},
};

/// A utility for creating a test database for the REST API server of shopbook.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let mut conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let admin = create_user("admin", Role::Admin, password_hash, &conn)?;

    println!("Creating test customers and transactions...");

    let customers = [
        ("Asha", "Omar", Some("021 555 0134")),
        ("Mohamed", "Warsame", None),
        ("Fatima", "Hassan", Some("021 555 0198")),
    ];
    let mut customer_ids = Vec::new();
    for (firstname, lastname, phone) in customers {
        let customer = create_customer(
            &CustomerForm {
                firstname: firstname.to_owned(),
                lastname: lastname.to_owned(),
                phone: phone.map(str::to_owned),
                notes: None,
            },
            &conn,
        )?;
        customer_ids.push(customer.id);
    }

    for (customer_index, transaction_type, amount) in [
        (0, TransactionType::Credit, dec!(150.00)),
        (0, TransactionType::Debit, dec!(45.50)),
        (1, TransactionType::Debit, dec!(20.00)),
        (2, TransactionType::Credit, dec!(75.00)),
    ] {
        append_transaction(
            NewTransaction {
                customer_id: customer_ids[customer_index],
                user_id: admin.id,
                transaction_type,
                amount,
            },
            &mut conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
