use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};

use crate::backend::BackendClient;
use crate::core::{AppConfig, SessionContext};

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

/// The persisted session, or an anonymous one when nothing is saved.
pub fn load_session(config: &AppConfig) -> SessionContext {
    SessionContext::load(&config.session_path).unwrap_or_else(SessionContext::anonymous)
}

pub async fn register(config: &AppConfig) -> Result<()> {
    let name = prompt("First name")?;
    let last_name = prompt("Last name")?;
    let age: u32 = prompt("Age")?.parse().context("age must be a number")?;
    let email = prompt("Email")?;
    let password = prompt("Password")?;

    let client = BackendClient::new(&config.api_base_url);
    let id = client
        .register(&name, &last_name, age, &email, &password)
        .await?;

    match id {
        Some(id) => println!("Account {} created. Sign in with `huddle signin`.", id),
        None => println!("Account created. Sign in with `huddle signin`."),
    }
    Ok(())
}

pub async fn signin(config: &AppConfig) -> Result<()> {
    let email = prompt("Email")?;
    let password = prompt("Password")?;

    let client = BackendClient::new(&config.api_base_url);
    let session = client.signin(&email, &password).await?;
    session.save(&config.session_path)?;

    match &session.customer_id {
        Some(id) => println!("Signed in as customer {}.", id),
        None => println!("Signed in."),
    }
    Ok(())
}

pub async fn whoami(config: &AppConfig) -> Result<()> {
    let session = load_session(config);
    let user_id = session.require_user()?.to_string();

    let client = BackendClient::new(&config.api_base_url);
    let user = client.get_profile(&session, &user_id).await?;
    let email = user.email.as_deref().unwrap_or("-");
    println!("{}  {}  <{}>", user.id, user.label(), email);
    Ok(())
}

pub fn signout(config: &AppConfig) -> Result<()> {
    if fs::remove_file(&config.session_path).is_ok() {
        println!("Signed out.");
    } else {
        println!("No saved session.");
    }
    Ok(())
}
