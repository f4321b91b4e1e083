use std::{error::Error, io, path::PathBuf, process::exit};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use time::macros::format_description;

use expense_tracker::{
    Asset, AssetForm, AssetId, AssetKind, CategoryStats, CategoryStatsQuery, MonthlyTotals,
    Transaction, TransactionForm, TransactionId, TransactionQuery, TransactionType,
    client::{ApiClient, ClientError, FileTokenStore},
};

/// A command-line client for the expense tracker.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Server base URL.
    #[arg(long, default_value = "http://localhost:3000")]
    base_url: String,

    /// File the session tokens are kept in between runs.
    #[arg(long, default_value = ".tracker_tokens.json")]
    token_file: PathBuf,

    /// Print raw JSON instead of a summary.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Income,
    Expense,
}

impl From<Kind> for TransactionType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Income => TransactionType::Income,
            Kind::Expense => TransactionType::Expense,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AssetType {
    Bank,
    Stock,
    Fund,
    Cash,
    Other,
}

impl From<AssetType> for AssetKind {
    fn from(asset_type: AssetType) -> Self {
        match asset_type {
            AssetType::Bank => AssetKind::Bank,
            AssetType::Stock => AssetKind::Stock,
            AssetType::Fund => AssetKind::Fund,
            AssetType::Cash => AssetKind::Cash,
            AssetType::Other => AssetKind::Other,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account.
    Register {
        email: String,
        /// Prompted for when not given.
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        nickname: Option<String>,
    },
    /// Log in and remember the session.
    Login {
        email: String,
        /// Prompted for when not given.
        #[arg(long)]
        password: Option<String>,
    },
    /// Log out and forget the session.
    Logout,
    /// Show your profile, balance and this month's totals.
    Me,
    /// Record a transaction.
    Add {
        #[arg(value_enum)]
        kind: Kind,
        amount: f64,
        /// A category ID such as "food" or "salary".
        category: String,
        /// A custom category name.
        #[arg(long)]
        category_name: Option<String>,
        /// `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM` or RFC 3339. Defaults to now.
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        asset: Option<AssetId>,
    },
    /// List transactions, newest first.
    List {
        /// First day to include, `YYYY-MM-DD`.
        #[arg(long)]
        start: Option<String>,
        /// Last day to include, `YYYY-MM-DD`.
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Delete a transaction.
    Delete { id: TransactionId },
    /// List your assets.
    Assets,
    /// Create an asset.
    AddAsset {
        name: String,
        #[arg(value_enum)]
        kind: AssetType,
        #[arg(long, default_value_t = 0.0)]
        balance: f64,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Show totals by category.
    Stats {
        #[arg(long, value_enum, default_value = "expense")]
        kind: Kind,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Show income and expenses for recent months.
    Monthly {
        #[arg(long)]
        months: Option<u32>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        match error.downcast_ref::<ClientError>() {
            Some(ClientError::SessionExpired) | Some(ClientError::NotLoggedIn) => {
                eprintln!("{error}. Run `tracker login <email>` first.");
            }
            _ => eprintln!("Error: {error}"),
        }
        exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let client = ApiClient::new(&cli.base_url, FileTokenStore::new(&cli.token_file));
    let json = cli.json;

    match cli.command {
        Command::Register {
            email,
            password,
            nickname,
        } => {
            let password = password_or_prompt(password)?;
            let response = client
                .register(&email, &password, nickname.as_deref())
                .await?;
            output(&response, json, |response| response.message.clone());
        }
        Command::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let response = client.log_in(&email, &password).await?;
            output(&response.user, json, |user| {
                format!("Logged in as {} ({})", user.nickname, user.email)
            });
        }
        Command::Logout => {
            let response = client.log_out().await?;
            output(&response, json, |response| response.message.clone());
        }
        Command::Me => {
            let me = client.me().await?;
            output(&me, json, |me| {
                let mut lines = vec![
                    format!("{} <{}>", me.user.nickname, me.user.email),
                    format!("Balance:          {:>12.2}", me.stats.balance),
                    format!("Income (month):   {:>12.2}", me.stats.monthly_income),
                    format!("Expenses (month): {:>12.2}", me.stats.monthly_expense),
                ];
                lines.extend(me.assets.iter().map(format_asset));
                lines.join("\n")
            });
        }
        Command::Add {
            kind,
            amount,
            category,
            category_name,
            date,
            note,
            asset,
        } => {
            let transaction = client
                .create_transaction(&TransactionForm {
                    amount,
                    kind: kind.into(),
                    category_id: category,
                    category_name,
                    date,
                    note,
                    asset_id: asset,
                })
                .await?;
            output(&transaction, json, |transaction| {
                format!("Created {}", format_transaction(transaction))
            });
        }
        Command::List { start, end, limit } => {
            let transactions = client
                .list_transactions(&TransactionQuery { start, end, limit })
                .await?;
            output(&transactions, json, |transactions| {
                transactions
                    .iter()
                    .map(format_transaction)
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }
        Command::Delete { id } => {
            let response = client.delete_transaction(id).await?;
            output(&response, json, |response| response.message.clone());
        }
        Command::Assets => {
            let assets = client.list_assets().await?;
            output(&assets, json, |assets| {
                assets.iter().map(format_asset).collect::<Vec<_>>().join("\n")
            });
        }
        Command::AddAsset {
            name,
            kind,
            balance,
            icon,
            color,
        } => {
            let asset = client
                .create_asset(&AssetForm {
                    name,
                    kind: kind.into(),
                    balance,
                    icon,
                    color,
                })
                .await?;
            output(&asset, json, |asset| format!("Created {}", format_asset(asset)));
        }
        Command::Stats { kind, start, end } => {
            let stats = client
                .category_stats(&CategoryStatsQuery {
                    kind: Some(kind.into()),
                    start,
                    end,
                })
                .await?;
            output(&stats, json, format_category_stats);
        }
        Command::Monthly { months } => {
            let totals = client.monthly_stats(months).await?;
            output(&totals, json, |totals| {
                totals
                    .iter()
                    .map(format_month)
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }
    }

    Ok(())
}

fn password_or_prompt(password: Option<String>) -> io::Result<String> {
    match password {
        Some(password) => Ok(password),
        None => rpassword::prompt_password("Password: "),
    }
}

fn output<T: Serialize>(value: &T, json: bool, summarize: impl FnOnce(&T) -> String) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(error) => eprintln!("Could not format JSON: {error}"),
        }
    } else {
        println!("{}", summarize(value));
    }
}

fn format_transaction(transaction: &Transaction) -> String {
    let date = transaction
        .date
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| transaction.date.to_string());
    let sign = match transaction.kind {
        TransactionType::Income => "+",
        TransactionType::Expense => "-",
    };

    let mut line = format!(
        "{}  {date}  {sign}{:>10.2}  {}",
        transaction.id, transaction.amount, transaction.category_name
    );
    if let Some(note) = &transaction.note {
        line.push_str(&format!("  {note}"));
    }
    if let Some(asset) = &transaction.asset {
        line.push_str(&format!("  [{}]", asset.name));
    }

    line
}

fn format_asset(asset: &Asset) -> String {
    format!(
        "{}  {:<20} {:<6} {:>12.2}",
        asset.id,
        asset.name,
        asset.kind.to_string(),
        asset.balance
    )
}

fn format_category_stats(stats: &CategoryStats) -> String {
    let mut lines = vec![format!("Total {}: {:.2}", stats.kind, stats.total)];
    lines.extend(stats.details.iter().map(|detail| {
        format!(
            "{:<16} {:>12.2} {:>4}%",
            detail.category_name, detail.amount, detail.percentage
        )
    }));
    lines.join("\n")
}

fn format_month(totals: &MonthlyTotals) -> String {
    format!(
        "{}  income {:>10.2}  expense {:>10.2}  net {:>10.2}",
        totals.month, totals.income, totals.expense, totals.net
    )
}
