//! Account commands (signup, login, logout, whoami, profile)

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use penny_core::{store, ApiClient, KeyValueStore};

/// Environment variable read when `--password` is not given
pub const PASSWORD_ENV: &str = "PENNY_PASSWORD";

/// Password from PENNY_PASSWORD, otherwise one line from stdin
pub fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    prompt_secret("Password", &mut io::stdin().lock(), &mut io::stdout())
}

/// Prompt for one line of secret input
///
/// The terminal is not put into no-echo mode, so the prompt says the input
/// will be visible.
pub fn prompt_secret(
    label: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<String> {
    write!(output, "{} (input is visible): ", label)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let secret = line.trim_end_matches(['\r', '\n']).to_string();
    if secret.is_empty() {
        bail!("No {} given", label.to_lowercase());
    }
    Ok(secret)
}

pub async fn cmd_signup(
    client: &ApiClient,
    name: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    println!("📝 Creating account for {}...", email.trim());

    let reply = client
        .register(name, email, password)
        .await
        .context("Signup failed")?;

    println!(
        "✅ {}",
        reply.message.as_deref().unwrap_or("Account created successfully")
    );
    println!("   Run `penny login --email {}` to start a session.", email.trim());
    Ok(())
}

pub async fn cmd_login(
    client: &ApiClient,
    store: &impl KeyValueStore,
    email: &str,
    password: &str,
) -> Result<()> {
    println!("🔑 Logging in as {}...", email.trim());

    let login = client.login(email, password).await.context("Login failed")?;
    let token = login.token.unwrap_or_default();
    store::save_token(store, &token).context("Failed to save session token")?;

    println!(
        "✅ {}",
        login.message.as_deref().unwrap_or("Login successful")
    );
    Ok(())
}

pub fn cmd_logout(store: &impl KeyValueStore) -> Result<()> {
    if store::load_token(store)?.is_none() {
        println!("Not logged in.");
        return Ok(());
    }
    store::clear_token(store).context("Failed to clear session token")?;
    println!("👋 Logged out.");
    Ok(())
}

pub async fn cmd_whoami(client: &ApiClient) -> Result<()> {
    let profile = client.profile().await.context("Failed to fetch profile")?;

    println!();
    println!("👤 {}", profile.name.as_deref().unwrap_or("(no name)"));
    if let Some(email) = &profile.email {
        println!("   {}", email);
    }
    println!("   Backend: {}", client.base_url());
    Ok(())
}

/// Change name and/or email; fields not given keep their current value
pub async fn cmd_profile_update(
    client: &ApiClient,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<()> {
    if name.is_none() && email.is_none() {
        bail!("Nothing to update: pass --name and/or --email");
    }

    let current = client.profile().await.context("Failed to fetch profile")?;
    let name = name
        .map(str::to_string)
        .or(current.name)
        .unwrap_or_default();
    let email = email
        .map(str::to_string)
        .or(current.email)
        .unwrap_or_default();

    let reply = client
        .update_profile(&name, &email)
        .await
        .context("Failed to update profile")?;
    println!(
        "✅ {}",
        reply.message.as_deref().unwrap_or("Profile updated successfully")
    );
    Ok(())
}

pub async fn cmd_profile_password(
    client: &ApiClient,
    current: &str,
    new_password: &str,
    confirm: &str,
) -> Result<()> {
    let reply = client
        .update_password(current, new_password, confirm)
        .await
        .context("Failed to update password")?;
    println!(
        "✅ {}",
        reply.message.as_deref().unwrap_or("Password updated successfully")
    );
    Ok(())
}
