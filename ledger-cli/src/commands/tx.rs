//! Record and inspect transactions.

use anyhow::{bail, Result};
use clap::Subcommand;
use ledger_client::{ApiClient, HttpTransport, NewTransaction, SyncService};
use ledger_types::{now_millis, MutationKind, Transaction, TransactionKind};
use serde_json::json;
use std::sync::Arc;

/// Transaction subcommands.
#[derive(Subcommand, Debug)]
pub enum TxCommand {
    /// Record a transaction
    Add {
        /// Amount, e.g. `12.50`
        amount: String,

        /// `expense` or `income`
        #[arg(long, default_value = "expense")]
        kind: String,

        /// Free-form note
        #[arg(long)]
        note: Option<String>,

        /// Queue locally for the next sync instead of calling the server
        #[arg(long)]
        offline: bool,
    },

    /// List transactions
    List {
        /// Read the offline cache instead of the server
        #[arg(long)]
        cached: bool,
    },
}

/// Run a transaction subcommand.
pub async fn run<T: HttpTransport + 'static>(
    client: &ApiClient<T>,
    service: &Arc<SyncService<T>>,
    command: TxCommand,
) -> Result<()> {
    match command {
        TxCommand::Add {
            amount,
            kind,
            note,
            offline,
        } => {
            let amount_minor = parse_amount_minor(&amount)?;
            let kind = parse_kind(&kind)?;

            if offline {
                let id = service
                    .enqueue(
                        MutationKind::CreateTransaction,
                        json!({
                            "kind": kind,
                            "amountMinor": amount_minor,
                            "note": note,
                            "occurredAt": now_millis(),
                        }),
                    )
                    .await?;
                println!(
                    "Queued {} for next sync (mutation {}, {} pending).",
                    format_amount(amount_minor),
                    id,
                    service.pending_count().await
                );
            } else {
                let tx = client
                    .create_transaction(&NewTransaction {
                        kind,
                        amount_minor,
                        category_id: None,
                        note,
                        occurred_at: now_millis(),
                    })
                    .await?;
                println!("Recorded {} as {}.", format_amount(amount_minor), tx.id);
            }
        }
        TxCommand::List { cached } => {
            let transactions = if cached {
                service.snapshot().await.transactions
            } else {
                client.list_transactions().await?
            };
            if transactions.is_empty() {
                println!("No transactions.");
            }
            for tx in transactions {
                print_transaction(&tx);
            }
        }
    }
    Ok(())
}

fn print_transaction(tx: &Transaction) {
    let sign = match tx.kind {
        TransactionKind::Income => "+",
        TransactionKind::Expense => "-",
    };
    let note = tx.note.as_deref().unwrap_or("");
    println!("{}  {}{}  {}", tx.id, sign, format_amount(tx.amount_minor), note);
}

/// Parse a decimal amount like `12.50` into minor units (1250).
fn parse_amount_minor(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        bail!("invalid amount: {input}");
    }
    if frac.len() > 2 {
        bail!("amounts have at most two decimal places: {input}");
    }
    let whole_minor: i64 = if whole.is_empty() {
        0
    } else {
        match whole.parse::<i64>() {
            Ok(v) if v >= 0 => v.saturating_mul(100),
            _ => bail!("invalid amount: {input}"),
        }
    };
    let frac_minor: i64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<2}");
        match padded.parse::<i64>() {
            Ok(v) => v,
            Err(_) => bail!("invalid amount: {input}"),
        }
    };
    Ok(whole_minor + frac_minor)
}

fn format_amount(minor: i64) -> String {
    format!("{}.{:02}", minor / 100, (minor % 100).abs())
}

fn parse_kind(input: &str) -> Result<TransactionKind> {
    match input {
        "expense" => Ok(TransactionKind::Expense),
        "income" => Ok(TransactionKind::Income),
        other => bail!("kind must be 'expense' or 'income', got: {other}"),
    }
}
