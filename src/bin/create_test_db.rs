use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use expense_tracker::{
    AssetForm, AssetKind, PasswordHash, TransactionForm, TransactionType, ValidatedPassword,
    create_asset, create_transaction, create_user, initialize_db,
};

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo";

/// A utility for creating a test database for the expense tracker server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The canonical timezone the demo transaction times are in.
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,
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
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating demo user {DEMO_EMAIL} with the password '{DEMO_PASSWORD}'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(DEMO_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(DEMO_EMAIL, "Demo", password_hash, &conn)?;

    println!("Creating assets...");

    let bank = create_asset(
        user.id,
        &AssetForm {
            name: "Everyday account".to_owned(),
            kind: AssetKind::Bank,
            balance: 12580.0,
            icon: Some("🏦".to_owned()),
            color: Some("#007AFF".to_owned()),
        },
        &conn,
    )?;
    create_asset(
        user.id,
        &AssetForm {
            name: "Wallet".to_owned(),
            kind: AssetKind::Cash,
            balance: 200.0,
            icon: Some("👛".to_owned()),
            color: Some("#FF9500".to_owned()),
        },
        &conn,
    )?;

    println!("Creating transactions...");

    let transactions = [
        (32.0, TransactionType::Expense, "food", "2026-01-19T12:30:00", Some("Beef noodles for lunch")),
        (1500.0, TransactionType::Income, "part-time", "2026-01-18T18:00:00", None),
        (299.0, TransactionType::Expense, "shopping", "2026-01-18T14:20:00", Some("Uniqlo")),
        (45.0, TransactionType::Expense, "transport", "2026-01-17T09:15:00", Some("Taxi to work")),
        (6800.0, TransactionType::Income, "salary", "2026-01-15T10:00:00", None),
    ];

    for (amount, kind, category_id, date, note) in transactions {
        let new_transaction = TransactionForm {
            amount,
            kind,
            category_id: category_id.to_owned(),
            category_name: None,
            date: Some(date.to_owned()),
            note: note.map(str::to_owned),
            asset_id: Some(bank.id),
        }
        .validate(&args.timezone)?;

        create_transaction(user.id, &new_transaction, &conn)?;
    }

    println!("Success!");

    Ok(())
}
