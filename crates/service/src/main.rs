use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ipledger_service::config::LedgerConfig;
use ipledger_service::context::LedgerContext;
use ipledger_service::statistics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ipledger_service=debug,ipledger_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = LedgerConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        country_code = %config.country_code,
        max_connections = config.max_connections,
        "Loaded ledger configuration"
    );

    // --- Database ---
    let pool = ipledger_db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    ipledger_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    ipledger_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Report ---
    let ctx = LedgerContext::new(pool, config);
    let (overview, fees) = tokio::try_join!(
        statistics::overview(&ctx),
        statistics::fee_statistics(&ctx, None),
    )?;

    let report = serde_json::json!({
        "overview": overview,
        "fee_statistics": fees,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    ctx.pool.close().await;
    Ok(())
}
