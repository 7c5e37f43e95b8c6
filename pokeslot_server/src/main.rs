use std::sync::Arc;

use clap::Parser;
use pokeslot_core::{config::DEFAULT_BONUS_PROBABILITY, GeneratorConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod db;
mod routes;

use routes::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "pokeslot-server", about = "Serves slot outcomes over HTTP")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BIND", default_value = "127.0.0.1:3000")]
    bind: String,
    /// Database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://pokeslot.db")]
    database_url: String,
    /// Bearer token for admin routes
    #[arg(long, env = "API_KEY", default_value = "dev-key")]
    api_key: String,
    #[arg(long, env = "POKESLOT_ROWS", default_value_t = 1)]
    rows: usize,
    #[arg(long, env = "POKESLOT_COLUMNS", default_value_t = 3)]
    columns: usize,
    #[arg(long, env = "POKESLOT_SYMBOLS", default_value_t = 6)]
    symbols: usize,
    /// Bonus probability written on first start; later changed via the admin route
    #[arg(long, env = "POKESLOT_BONUS_PROBABILITY", default_value_t = DEFAULT_BONUS_PROBABILITY)]
    bonus_probability: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let generator = GeneratorConfig {
        rows: args.rows,
        columns: args.columns,
        symbol_count: args.symbols,
        bonus_probability: args.bonus_probability,
    };
    generator.validate()?;

    let db = db::connect(&args.database_url).await?;
    db::init_db(&db, generator.bonus_probability).await?;

    let state = Arc::new(AppState {
        db,
        api_key: args.api_key,
        generator,
    });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!("listening on {}", args.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
