use std::env;

use anyhow::{Context, Result};
use diesel::dsl::count_star;
use diesel::prelude::*;
use tracing_subscriber::EnvFilter;

use fleet_maintenance::{
    config::AppConfig,
    db,
    schema::{equipments, operations, vessels},
};

const USAGE: &str = "Usage: maintenance <migrate|stats>";

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("migrate") => migrate()?,
        Some("stats") => stats()?,
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
        None => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn connect() -> Result<db::PgPool> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "maintenance",
        database_url = %config.redacted_database_url(),
        "loaded service configuration"
    );
    db::init_pool(&config.database_url)
}

fn migrate() -> Result<()> {
    let pool = connect()?;
    let applied = db::run_migrations(&pool)?;
    if applied == 0 {
        println!("Schema is up to date.");
    } else {
        println!("Applied {applied} migration(s).");
    }
    Ok(())
}

fn stats() -> Result<()> {
    let pool = connect()?;
    let mut conn = pool.get().context("failed to get database connection")?;

    let vessel_count: i64 = vessels::table
        .select(count_star())
        .first(&mut conn)
        .context("failed to count vessels")?;
    let equipment_count: i64 = equipments::table
        .select(count_star())
        .first(&mut conn)
        .context("failed to count equipment")?;
    let active_count: i64 = equipments::table
        .filter(equipments::active.eq(true))
        .select(count_star())
        .first(&mut conn)
        .context("failed to count active equipment")?;
    let operation_count: i64 = operations::table
        .select(count_star())
        .first(&mut conn)
        .context("failed to count operations")?;

    println!("vessels:    {vessel_count}");
    println!("equipment:  {equipment_count} ({active_count} active)");
    println!("operations: {operation_count}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
