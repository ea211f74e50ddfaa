#!/usr/bin/env cargo
//! Helm Console Binary
//!
//! Scripted demo of the approval-gated agent protocol.
//!
//! # Usage
//! ```bash
//! helm-console [--landing /team] [--user-role admin] [--verbose]
//! ```

use clap::Parser;
use helm_console::{
    Console, ConsoleConfig, InMemoryDirectory, InMemoryVault, NAVIGATE_INTENT,
};
use helm_console::data::{seed_cards, seed_team};
use helm_core::{ArgMap, CurrentUser, Decision, Page, Role};
use serde_json::json;
use std::str::FromStr;

/// Helm Console - Approval-Gated Agent Operations
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Landing page path (default: /team)
    #[arg(long, default_value = "/team")]
    landing: String,

    /// Role of the demo user (admin or member)
    #[arg(long, default_value = "admin")]
    user_role: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_target(false)
            .init();
    }

    let landing = Page::from_path(&args.landing)
        .ok_or_else(|| format!("unknown page: {}", args.landing))?;
    let role = Role::from_str(&args.user_role)?;
    let user = CurrentUser::new("u1", "Dana Reyes", role);

    let config = ConsoleConfig::default()
        .with_landing_page(landing)
        .with_verbose(args.verbose);

    print_banner(&user);

    let directory = InMemoryDirectory::new(user.clone(), seed_team());
    let vault = InMemoryVault::new(user.clone(), seed_cards());
    let (mut console, mut events) = Console::new(&config, user, directory, vault).await;

    println!("Current page: {}", console.current_page());
    println!(
        "Agent readable: {}",
        serde_json::to_string_pretty(&console.agent_context().readable())?
    );
    println!();

    // The agent proposes a role change; the human approves it.
    let mut role_args = ArgMap::new();
    role_args.insert("id".to_string(), json!("2"));
    role_args.insert("role".to_string(), json!("admin"));
    let outcome = console.invoke("change-member-role", role_args).await;
    if let Some(summary) = console.pending_summary() {
        println!("Proposal: {summary}");
    }
    let responded = console.respond(Decision::Approve).await?;
    println!("{}", responded.acknowledgement());
    println!("Agent outcome: {}", outcome.await?);
    console.team_mut()?.refresh().await;
    println!();

    // The agent proposes a removal; the human denies it.
    let mut remove_args = ArgMap::new();
    remove_args.insert("id".to_string(), json!("3"));
    let outcome = console.invoke("remove-member", remove_args).await;
    if let Some(summary) = console.pending_summary() {
        println!("Proposal: {summary}");
    }
    console.respond(Decision::Deny).await?;
    println!("Agent outcome: {}", outcome.await?);
    println!("Roster still has {} members", console.team()?.roster().len());
    println!();

    // Cross-page: a cards operation requested from the team page.
    let mut pin_args = ArgMap::new();
    pin_args.insert("cardId".to_string(), json!("card-1"));
    let outcome = console.invoke("change-pin", pin_args).await;
    println!("Agent outcome: {}", outcome.await?);
    println!(
        "PIN dialog open for card: {:?}",
        console.cards()?.pin_dialog().card_id()
    );
    console.cards_mut()?.cancel_pin();
    println!();

    // Explicit navigation proposal back to the team page.
    let mut nav_args = ArgMap::new();
    nav_args.insert("page".to_string(), json!("/team"));
    nav_args.insert("operation".to_string(), json!("invite-member"));
    nav_args.insert("email".to_string(), json!("lena@acme.dev"));
    let outcome = console.invoke(NAVIGATE_INTENT, nav_args).await;
    if let Some(summary) = console.pending_summary() {
        println!("Proposal: {summary}");
    }
    console.respond(Decision::Approve).await?;
    println!("Agent outcome: {}", outcome.await?);
    println!(
        "Invite dialog open: {}",
        console.team()?.dialog().is_open()
    );
    console.team_mut()?.submit_dialog().await?;
    println!("Roster now has {} members", console.team()?.roster().len());
    println!();

    // Drain any detached mutation failures before exit.
    while let Ok(event) = events.try_recv() {
        println!("Protocol event: {event:?}");
    }

    println!("Done.");
    Ok(())
}

fn print_banner(user: &CurrentUser) {
    println!();
    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║                                                               ║");
    println!("║            🧭  HELM CONSOLE — APPROVAL-GATED AGENT            ║");
    println!("║                                                               ║");
    println!("║     Human-in-the-loop operations for team and cards           ║");
    println!("║                                                               ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    println!();
    println!("👤 Signed in as {} ({})", user.name, user.role);
    println!();
    println!("📄 Pages");
    println!("   ├─ /team   — roster, invitations, roles");
    println!("   ├─ /cards  — corporate cards, PIN changes");
    println!("   └─ /       — home");
    println!();
    println!("─────────────────────────────────────────────────────────────────");
    println!();
}
