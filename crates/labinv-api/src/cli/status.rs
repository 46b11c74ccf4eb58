//! System status dashboard command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display record counts, data directory and server settings.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let users = state.user_service.count().await?;
    let chemicals = state.chemical_service.count().await?;
    let studies = state.study_service.stats().await?;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "users": users,
            "chemicals": chemicals,
            "studies": studies,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} labinv v{}",
        style("⚗").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Inventory ──").dim());
    println!("  Chemicals: {}", style(chemicals).bold());
    println!("  Studies:   {}", style(studies.total).bold());
    if studies.total > 0 {
        println!(
            "    {} completed, {} in progress, {} pending",
            style(studies.completed).green(),
            style(studies.in_progress).cyan(),
            style(studies.pending).yellow()
        );
        if studies.high_risk > 0 {
            println!("    {} high risk", style(studies.high_risk).red());
        }
    }
    println!();

    println!("  {}", style("── Accounts ──").dim());
    println!("  Users: {}", style(users).bold());
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Database: {}", style("SQLite (WAL mode)").dim());
    println!("  Base URL: {}", style(&state.config.server.base_url).dim());
    println!();

    Ok(())
}
