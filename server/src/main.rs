//! crudkit-server: serves `/item` CRUD under the configured API prefix.
//!
//! Settings come from the environment (and `.env`): `API_ENVIRON`, `DATABASE_URL`, `API_KEY`, ...

mod item;

use clap::Parser;
use crudkit::{connect_pool, ensure_database_exists, execute_ddl, App, Settings};
use item::{Item, ITEM_DDL};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crudkit-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "REST CRUD service for the item table", long_about = None)]
struct Cli {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Create the database named in DATABASE_URL if it does not exist
    #[arg(long)]
    ensure_db: bool,

    /// Create the item table if it does not exist
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.default_log_filter())),
        )
        .init();
    let cli = Cli::parse();

    if cli.ensure_db {
        ensure_database_exists(&settings.database.url).await?;
    }
    let pool = connect_pool(&settings.database).await?;
    if cli.migrate {
        execute_ddl(&pool, &[ITEM_DDL]).await?;
    }

    tracing::info!(
        environment = settings.environment.as_str(),
        prefix = %settings.api_url,
        "starting"
    );
    let app = App::new(settings, pool).entity::<Item>("item").into_router();

    let listener = TcpListener::bind((cli.host.as_str(), cli.port)).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
