//! User account commands: create, list, reset-password.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Password;

use labinv_types::user::{RegisterRequest, UserRole};

use crate::state::AppState;

/// Prompt for a password twice with hidden input.
fn prompt_password(prompt: &str) -> Result<String> {
    Ok(Password::new()
        .with_prompt(prompt)
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?)
}

/// Create an account from the command line. Bypasses self-registration so
/// the ADMIN role can be granted.
pub async fn create_user(
    state: &AppState,
    username: String,
    password: Option<String>,
    admin: bool,
    json: bool,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password(&format!("Password for {}", style(&username).bold()))?,
    };
    let role = if admin { UserRole::Admin } else { UserRole::User };

    let user = state
        .user_service
        .create_user(RegisterRequest {
            username,
            password,
            role: Some(role.to_string()),
            ..Default::default()
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} User '{}' created ({})",
        style("✓").green().bold(),
        style(&user.username).cyan(),
        user.role
    );
    println!();
    Ok(())
}

/// List all accounts.
pub async fn list_users(state: &AppState, json: bool) -> Result<()> {
    let users = state.user_service.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!();
        println!(
            "  {} No users yet. Create one with: {}",
            style("i").blue().bold(),
            style("labinv user create --username <name>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Username").fg(Color::White),
        Cell::new("Role").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Position").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for user in &users {
        let role_cell = match user.role {
            UserRole::Admin => Cell::new("ADMIN").fg(Color::Yellow),
            UserRole::User => Cell::new("USER").fg(Color::Green),
        };
        let name = [user.first_name.as_deref(), user.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        table.add_row(vec![
            Cell::new(user.id),
            Cell::new(&user.username).fg(Color::Cyan),
            role_cell,
            Cell::new(name),
            Cell::new(user.position.as_deref().unwrap_or("")),
            Cell::new(user.created_at.format("%Y-%m-%d")).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} user{}",
        style(users.len()).bold(),
        if users.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

/// Replace the password of `username`.
pub async fn reset_password(
    state: &AppState,
    username: &str,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let user = state.user_service.get_by_username(username).await?;
    let password = match password {
        Some(p) => p,
        None => prompt_password(&format!("New password for {}", style(username).bold()))?,
    };
    state.user_service.reset_password(user.id, &password).await?;

    if json {
        println!("{}", serde_json::json!({ "reset": true, "username": username }));
    } else {
        println!(
            "  {} Password for '{}' updated",
            style("✓").green().bold(),
            style(username).bold()
        );
    }
    Ok(())
}
