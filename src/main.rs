use dotenvy::dotenv;
use fee_ledger::{
    api::{self, AppState},
    config::{database, school, server::ServerConfig},
    core::{billing, family},
    errors::Result,
    qr::SvgQrEncoder,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load configuration
    let school_config = school::load_default_config()
        .inspect_err(|e| error!("Failed to load school configuration: {}", e))?;
    let server_config = ServerConfig::from_env()
        .inspect_err(|e| error!("Invalid server configuration: {}", e))?;

    // 4. Open both database handles and make sure the tables exist
    let database_url = database::get_database_url();
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    let public_db = database::create_connection(&database::get_public_database_url())
        .await
        .inspect_err(|e| error!("Failed to connect to public database: {}", e))?;

    // 5. Seed families and run this month's billing if it hasn't happened yet
    let seeded = family::seed_families(&db, &school_config)
        .await
        .inspect_err(|e| error!("Failed to seed families: {}", e))?;
    info!("Seeded {} new families.", seeded);

    if let Some(run) = billing::run_monthly_billing_if_needed(&db)
        .await
        .inspect_err(|e| error!("Monthly billing failed: {}", e))?
    {
        info!(
            "Billed {} families for {} {}",
            run.billed.len(),
            run.month,
            run.year
        );
    }

    // 6. Serve until shutdown, then close both handles
    let state = AppState {
        db: db.clone(),
        public_db: public_db.clone(),
        qr: Arc::new(SvgQrEncoder::default()),
        receipt_base_url: server_config.receipt_base_url,
        school_name: school_config.school_name,
    };

    let served = api::serve(state, server_config.bind_addr).await;

    if let Err(e) = public_db.close().await {
        error!("Failed to close public database handle: {}", e);
    }
    if let Err(e) = db.close().await {
        error!("Failed to close database handle: {}", e);
    }

    served
}
