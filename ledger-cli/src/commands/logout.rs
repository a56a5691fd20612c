//! Sign out and clear stored credentials.

use anyhow::Result;
use ledger_client::{ApiClient, HttpTransport};

/// Run the logout command.
pub async fn run<T: HttpTransport>(client: &ApiClient<T>) -> Result<()> {
    client.logout().await?;
    println!("Signed out; local credentials cleared.");
    Ok(())
}
