//! Database migration tool: `migrate` applies pending migrations, `check`
//! prints a quick status, `reset` drops and recreates the schema after an
//! explicit confirmation.

use anyhow::{anyhow, Result};
use practice_tracker_bot::config::Config;
use practice_tracker_bot::database::connection::DatabaseManager;
use std::env;
use std::io::{self, Write};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("migrate");

    match command {
        "migrate" | "up" => run_migrations().await,
        "check" => check_database().await,
        "reset" => reset_database().await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            print_help();
            std::process::exit(1);
        }
    }
}

async fn connect() -> Result<DatabaseManager> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    println!("📊 Database URL: {}", mask_url(&config.database_url));

    // Make sure the data directory exists for SQLite
    if let Some(path) = config.database_url.strip_prefix("sqlite:") {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                println!("📁 Creating directory: {}", parent.display());
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    DatabaseManager::new(&config.database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))
}

async fn run_migrations() -> Result<()> {
    println!("🔧 Practice Tracker Bot - Database Migration Tool");
    println!("=================================================");

    let db = connect().await?;

    println!("🚀 Running database migrations...");
    db.run_migrations()
        .await
        .map_err(|e| anyhow!("Migration failed: {}", e))?;
    println!("✅ Migrations applied successfully");
    Ok(())
}

async fn check_database() -> Result<()> {
    println!("🔍 Checking database...");

    let db = connect().await?;
    db.ping().await.map_err(|e| anyhow!("Database unreachable: {}", e))?;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&db.pool)
        .await
        .unwrap_or(0);
    let tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(&db.pool)
        .await
        .unwrap_or(0);
    let due: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks WHERE next_reminder IS NOT NULL AND status != 'done'",
    )
    .fetch_one(&db.pool)
    .await
    .unwrap_or(0);

    println!("✅ Database reachable");
    println!("   Users: {users}");
    println!("   Tasks: {tasks} ({due} with an armed reminder)");
    Ok(())
}

async fn reset_database() -> Result<()> {
    println!("⚠️  This will DELETE ALL tasks and users.");
    print!("Type 'yes' to continue: ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    if answer.trim().to_lowercase() != "yes" {
        println!("Aborted.");
        return Ok(());
    }

    let db = connect().await?;
    sqlx::query("DROP TABLE IF EXISTS tasks").execute(&db.pool).await?;
    sqlx::query("DROP TABLE IF EXISTS users").execute(&db.pool).await?;
    sqlx::query("DROP TABLE IF EXISTS _sqlx_migrations")
        .execute(&db.pool)
        .await?;
    println!("🧹 Schema dropped");

    db.run_migrations().await?;
    println!("✅ Schema recreated");
    Ok(())
}

fn mask_url(url: &str) -> String {
    // Nothing secret in a sqlite path, but keep the habit for other schemes.
    match url.split_once('@') {
        Some((_, host)) => format!("***@{host}"),
        None => url.to_string(),
    }
}

fn print_help() {
    println!("Practice Tracker Bot migration tool");
    println!();
    println!("Usage: migrate [COMMAND]");
    println!();
    println!("Commands:");
    println!("  migrate, up   Apply pending migrations (default)");
    println!("  check         Verify connectivity and print row counts");
    println!("  reset         Drop and recreate the schema (destructive)");
    println!("  help          Show this message");
}
