// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin Console CLI
//!
//! Signs in to the admin backend and runs a few dashboard queries using the
//! same session layer the dashboard front end uses.

use admin_console::{
    config::Config,
    models::{RegisterRequest, Role, UserQuery},
    routes::GuardDecision,
    services::{session, MemoryNavigator, TokenStore},
    time_utils::{format_remaining, format_utc_rfc3339},
    Console,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(version, about = "Admin dashboard session client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and persist the session
    Login {
        #[arg(long, env = "ADMIN_EMAIL")]
        email: String,
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// End the session
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// List users
    Users {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        role: Option<Role>,
    },
    /// Show dashboard statistics
    Stats,
    /// Check whether the current session may open a dashboard path
    CheckAccess { path: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let store = TokenStore::file(&config.token_file);
    let navigator = Arc::new(MemoryNavigator::new("/"));

    let console = Console::new(config, store, navigator.clone())
        .context("Failed to initialize API client")?;

    let outcome = run(&console, cli.command).await;

    if !navigator.history().is_empty() {
        eprintln!("Session expired. Run `admin-console login` to sign in again.");
    }

    outcome
}

async fn run(console: &Console, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let user = console
                .session
                .login(&email, &password)
                .await
                .map_err(|e| {
                    let message = console.session.error().unwrap_or_else(|| e.user_message());
                    anyhow::anyhow!(message).context("Login failed")
                })?;
            println!("Signed in as {} ({})", user.display_name(), user.role);
        }

        Command::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            let request = RegisterRequest {
                email,
                password,
                first_name,
                last_name,
            };
            let user = console
                .session
                .register(&request)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()).context("Registration failed"))?;
            println!("Registered {} ({})", user.email, user.id);
        }

        Command::Logout => {
            // Notify inline; a background notification would not outlive the process.
            let store = console.client.store();
            let token = store.token();
            store.clear();
            console.session.logout();
            if let Some(token) = token {
                if let Err(e) = console.api.auth.logout(&token).await {
                    tracing::debug!(error = %e, "Logout notification failed");
                }
            }
            println!("Signed out");
        }

        Command::Whoami => {
            let Some(user) = console.session.user() else {
                anyhow::bail!("Not signed in");
            };
            println!("{} <{}>", user.display_name(), user.email);
            println!("  id:    {}", user.id);
            println!("  role:  {}", user.role);
            if let Some(token) = console.client.store().token() {
                if let Some(expires) = session::token_expiration(&token) {
                    println!(
                        "  expires: {} (in {})",
                        format_utc_rfc3339(expires),
                        format_remaining(session::time_until_expiration(&token))
                    );
                }
            }
        }

        Command::Users {
            page,
            limit,
            search,
            role,
        } => {
            let query = UserQuery {
                page,
                limit,
                search,
                role,
                ..UserQuery::default()
            };
            let users = console
                .api
                .users
                .list(&query)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            for user in &users.items {
                println!(
                    "{:<24} {:<32} {:<10} {}",
                    user.id,
                    user.email,
                    user.role,
                    if user.is_active { "active" } else { "inactive" }
                );
            }
            println!(
                "page {}/{} ({} users)",
                users.page, users.total_pages, users.total
            );
        }

        Command::Stats => {
            let overview = console
                .api
                .dashboard
                .overview()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let stats = &overview.stats;
            println!("total users:     {}", stats.total_users);
            println!(
                "active users:    {} ({:.0}%)",
                stats.active_users,
                stats.active_ratio() * 100.0
            );
            println!("new this month:  {}", stats.new_users_this_month);
            println!(
                "sign-ups (30d):  {}",
                overview.growth.iter().map(|p| p.count).sum::<u64>()
            );
            for entry in &overview.activity {
                println!(
                    "  {} {} {}",
                    format_utc_rfc3339(entry.timestamp),
                    entry.user_email,
                    entry.action
                );
            }
        }

        Command::CheckAccess { path } => match console.guard(&path) {
            GuardDecision::Allow => println!("allow"),
            GuardDecision::Loading => println!("loading"),
            GuardDecision::RedirectToLogin { location } => println!("redirect {}", location),
            GuardDecision::AccessDenied { reason } => println!("denied: {}", reason),
        },
    }

    Ok(())
}

/// Initialize logging to stderr; JSON when `LOG_FORMAT=json`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("admin_console=debug,info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
