//! Sign in and store credentials.

use anyhow::{Context, Result};
use ledger_client::{ApiClient, HttpTransport};

/// Run the login command.
pub async fn run<T: HttpTransport>(
    client: &ApiClient<T>,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let auth = client.login(email, &password).await?;

    println!("Signed in as {} (user {})", email, auth.user_id);
    Ok(())
}
