use clap::Parser;
use pokeslot_client::{OutcomeClient, SpinDriver, TerminalRenderer};
use pokeslot_core::{
    config::{DEFAULT_INITIAL_BET, DEFAULT_INITIAL_COINS, DEFAULT_SETTLE_DELAY_MS},
    SessionConfig, SpinSession,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pokeslot-client", about = "Play pokeslot in the terminal")]
struct Args {
    /// Server base URL
    #[arg(long, env = "POKESLOT_SERVER", default_value = "http://127.0.0.1:3000/")]
    server: String,
    /// Seed mixed into the server's provably-fair draw
    #[arg(long, env = "POKESLOT_CLIENT_SEED")]
    client_seed: Option<String>,
    #[arg(long, default_value_t = DEFAULT_INITIAL_BET as f64)]
    bet: f64,
    #[arg(long, default_value_t = DEFAULT_INITIAL_COINS)]
    coins: i64,
    /// Manual spins to play when autoplay is off
    #[arg(long, default_value_t = 1)]
    spins: u32,
    /// Keep spinning until interrupted
    #[arg(long)]
    autoplay: bool,
    #[arg(long, env = "POKESLOT_SETTLE_DELAY_MS", default_value_t = DEFAULT_SETTLE_DELAY_MS)]
    settle_delay_ms: u64,
    /// Give the stake back when a spin request fails
    #[arg(long)]
    refund_on_failure: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config = SessionConfig {
        settle_delay_ms: args.settle_delay_ms,
        initial_coins: args.coins,
        refund_on_failure: args.refund_on_failure,
        ..Default::default()
    };

    let mut client = OutcomeClient::new(&args.server)?;
    if let Some(seed) = &args.client_seed {
        client = client.with_client_seed(seed);
    }

    let session = SpinSession::new(config, TerminalRenderer::stdout())?;
    let (driver, mut handle) = SpinDriver::new(session, client);
    let task = tokio::spawn(driver.run());

    handle.set_bet(args.bet).await?;
    if args.autoplay {
        handle.set_autoplay(true).await?;
        handle.spin().await?;
        info!("autoplay on, press ctrl-c to stop");
        tokio::signal::ctrl_c().await?;
    } else {
        for _ in 0..args.spins {
            handle.spin_and_wait().await?;
        }
    }

    handle.shutdown().await?;
    let (ledger, _) = task.await?.into_parts();
    info!(
        coins = ledger.coins(),
        earnings = ledger.earnings(),
        small_wins = ledger.small_wins(),
        big_wins = ledger.big_wins(),
        bonuses = ledger.bonuses(),
        "session finished"
    );
    Ok(())
}
