//! Show credentials, queue, and cache state.

use anyhow::Result;
use ledger_client::{ApiClient, HttpTransport, SyncService};

/// Run the status command.
pub async fn run<T: HttpTransport + 'static>(
    client: &ApiClient<T>,
    service: &SyncService<T>,
) -> Result<()> {
    println!("=== ledger-cli status ===");
    println!();

    let credentials = client.tokens().credentials().await;
    if credentials.is_authenticated() {
        println!("Account:");
        if let Some(user_id) = &credentials.user_id {
            println!("  User:  {}", user_id);
        }
        let expired = client.tokens().is_token_expired().await;
        println!("  Token: {}", if expired { "expired" } else { "valid" });
    } else {
        println!("Account: NOT SIGNED IN");
        println!();
        println!("Run 'ledger-cli login --email <email>' to sign in.");
    }

    println!();

    println!("Sync Queue:");
    println!("  Pending:     {}", service.pending_count().await);
    let dead = service.dead_letter().await;
    if !dead.is_empty() {
        println!("  Dead-letter: {}", dead.len());
    }

    println!();

    let snapshot = service.snapshot().await;
    println!("Cache:");
    println!("  Transactions: {}", snapshot.transactions.len());
    println!("  Categories:   {}", snapshot.categories.len());
    println!("  Alerts:       {}", snapshot.alerts.len());
    println!("  Reminders:    {}", snapshot.reminders.len());
    match snapshot.last_sync_time {
        Some(ts) => println!("  Last sync:    {}", format_timestamp(ts)),
        None => println!("  Last sync:    never"),
    }

    Ok(())
}

/// Format a unix-millis timestamp as a human-readable age.
fn format_timestamp(ts_millis: u64) -> String {
    let now = ledger_types::now_millis();
    let diff_secs = now.saturating_sub(ts_millis) / 1000;

    if diff_secs < 60 {
        "just now".to_string()
    } else if diff_secs < 3600 {
        format!("{} minutes ago", diff_secs / 60)
    } else if diff_secs < 86400 {
        format!("{} hours ago", diff_secs / 3600)
    } else {
        format!("{} days ago", diff_secs / 86400)
    }
}
