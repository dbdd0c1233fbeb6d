use anyhow::Context;
use clap::Parser;
use colored::*;
use github_account_sync::actors::sync_factory::SyncFactoryConfig;
use github_account_sync::actors::{SyncSupervisor, SyncSupervisorMessage};
use github_account_sync::admin::{create_admin_router, AdminState};
use github_account_sync::cli::{Cli, Command};
use github_account_sync::health::{start_http_server, AppState};
use github_account_sync::{CollectorOutcome, MemoryStore, SurrealStore, SyncCoordinator, SyncReport, SyncStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if cli.local {
        println!("{}", "Running in local mode (DB URL: ws://localhost:8000)".yellow());
    }

    println!("{}", "GitHub Account Sync".bold().green());
    println!("{}\n", "=".repeat(50).dimmed());

    match &cli.command {
        Command::Sync {
            user_id,
            token,
            dry_run,
        } => {
            let store: Arc<dyn SyncStore> = if *dry_run {
                println!("{}", "Dry run: rows are kept in memory".yellow());
                Arc::new(MemoryStore::new())
            } else {
                Arc::new(connect_store(&cli)?)
            };

            let coordinator = SyncCoordinator::new(store, cli.sync_config());
            let report = coordinator
                .sync_all_with_timeout(user_id, token)
                .await
                .context("Sync failed")?;
            print_report(&report);
        }

        Command::Merge {
            user_id,
            github_user_id,
        } => {
            let store = Arc::new(connect_store(&cli)?);
            let coordinator = SyncCoordinator::new(store, cli.sync_config());
            let merged = coordinator
                .merge_network_stars(user_id, *github_user_id)
                .await
                .context("Merge failed")?;
            println!(
                "✅ Moved {} network stars of GitHub user {} to {}",
                merged.to_string().bold(),
                github_user_id,
                user_id
            );
        }

        Command::Serve {
            port,
            workers,
            admin_api_key,
        } => serve(&cli, *port, *workers, admin_api_key.clone()).await?,
    }

    Ok(())
}

fn connect_store(cli: &Cli) -> anyhow::Result<SurrealStore> {
    let store = SurrealStore::connect(cli.connection_config(), cli.pool_config())
        .context("Failed to create connection pool")?;
    println!("✅ Created SurrealDB connection pool with {} connections", cli.db_pool_max_size);
    Ok(store)
}

fn print_report(report: &SyncReport) {
    println!("\n📊 Sync report for {}", report.user_id.bold());
    for outcome in &report.outcomes {
        match outcome {
            CollectorOutcome::Succeeded(r) => println!(
                "  {} {:<14} {} rows, {} pages{}",
                "✔".green(),
                r.kind.to_string(),
                r.rows_written,
                r.pages_fetched,
                if r.skipped_users.is_empty() {
                    String::new()
                } else {
                    format!(", {} users skipped", r.skipped_users.len()).yellow().to_string()
                }
            ),
            CollectorOutcome::Failed { kind, error } => {
                println!("  {} {:<14} {}", "✘".red(), kind.to_string(), error.red())
            }
        }
    }

    let elapsed = report.finished_at - report.started_at;
    println!(
        "\n{} rows written in {:.1}s",
        report.rows_written(),
        elapsed.num_milliseconds() as f64 / 1000.0
    );
    if !report.is_complete() {
        println!("{}", "Some collectors failed; their tables were left as they were".yellow());
    }
}

async fn serve(cli: &Cli, port: u16, workers: usize, admin_api_key: Option<String>) -> anyhow::Result<()> {
    let surreal = Arc::new(connect_store(cli)?);
    let coordinator = Arc::new(SyncCoordinator::new(surreal.clone(), cli.sync_config()));

    let factory_config = SyncFactoryConfig {
        num_initial_workers: workers.max(1),
        ..Default::default()
    };

    let supervisor = SyncSupervisor::spawn_with_live_query(surreal, coordinator.clone(), factory_config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start supervisor: {}", e))?;

    println!("✅ Sync supervisor started with {} workers", workers.max(1));
    println!("📡 Listening for new GitHub accounts...");

    let app_state = AppState {
        store: coordinator.store().clone(),
        supervisor: supervisor.clone(),
        start_time: std::time::Instant::now(),
    };

    let admin = match admin_api_key {
        Some(key) => {
            println!("🔑 Admin API enabled at /admin");
            Some(create_admin_router(
                AdminState {
                    coordinator,
                    supervisor: supervisor.clone(),
                },
                key,
            ))
        }
        None => None,
    };

    let server = tokio::spawn(async move {
        if let Err(e) = start_http_server(app_state, admin, port).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    println!("\nPress Ctrl+C to stop the server\n");

    tokio::signal::ctrl_c().await?;
    println!("\n🛑 Shutting down server...");

    match supervisor
        .call(SyncSupervisorMessage::GetStats, Some(std::time::Duration::from_secs(5)))
        .await
    {
        Ok(ractor::rpc::CallResult::Success(stats)) => {
            println!("\n📊 Final Statistics:");
            println!("Accounts received: {}", stats.accounts_received);
            println!(
                "Syncs: {} completed, {} partial, {} failed",
                stats.counters.syncs_completed, stats.counters.syncs_partial, stats.counters.syncs_failed
            );
            println!("Network stars merged: {}", stats.counters.network_stars_merged);
            println!("Factory queue depth: {}", stats.factory_queue_depth);
        }
        Ok(_) => eprintln!("Timeout getting final statistics"),
        Err(e) => eprintln!("Failed to get final statistics: {}", e),
    }

    supervisor
        .send_message(SyncSupervisorMessage::Shutdown)
        .map_err(|e| anyhow::anyhow!("Failed to shutdown supervisor: {:?}", e))?;

    println!("Waiting for workers to finish current tasks...");
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    server.abort();

    println!("✅ Server stopped");
    Ok(())
}
