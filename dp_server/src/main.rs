//! Five-card draw poker host.
//!
//! Runs the authority router, listens for participants, and starts a game
//! once enough of them have joined.

use std::net::SocketAddr;

use anyhow::Error;
use dp_server::{
    config::{CliOverrides, HostTransport, ServerConfig},
    host::HostSession,
    listener::HostListener,
    logging, metrics,
};
use draw_poker::{Role, Router, transport::websocket::local_ip};
use log::{error, info, warn};
use pico_args::Arguments;

const HELP: &str = "\
Host a five-card draw poker game

USAGE:
  dp_server [OPTIONS]

OPTIONS:
  --transport  ws|stream   Transport participants connect with  [default: env DP_TRANSPORT or ws]
  --host       IP          Interface to listen on               [default: env DP_HOST or 0.0.0.0]
  --port       PORT        First port to try (ws) or exact port (stream)  [default: env DP_PORT or 8000]
  --players    N           Seats to fill before dealing, including the host's  [default: env DP_PLAYERS or 2]
  --metrics    IP:PORT     Serve Prometheus metrics on this address  [default: env DP_METRICS_BIND]

FLAGS:
  --headless               Don't seat the host; just route
  --host-deals             Only the lowest seated player may deal
  -h, --help               Print help information

ENVIRONMENT:
  DP_FRAMING               Stream framing, nul or prefixed  [default: nul]
  DP_MAX_FRAME_SIZE        Largest accepted frame or WebSocket message in bytes
  DP_MAX_CLIENTS           Client slots, including the host's own
  DP_QUEUE_CAPACITY        Outbound frames buffered per participant
  RUST_LOG                 Log filter  [default: info]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let cli = CliOverrides {
        transport: pargs.opt_value_from_str("--transport")?,
        host: pargs.opt_value_from_str("--host")?,
        port: pargs.opt_value_from_str("--port")?,
        players: pargs.opt_value_from_str("--players")?,
        headless: pargs.contains("--headless"),
        host_deals: pargs.contains("--host-deals"),
        metrics_bind: pargs.opt_value_from_str::<_, SocketAddr>("--metrics")?,
    };
    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("unrecognized arguments: {remaining:?}");
    }

    logging::init();

    let config = ServerConfig::from_env(cli)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        info!("Metrics available at http://{addr}/metrics");
    }

    let (router, handle, events) = Router::new(
        Role::Authority {
            headless: config.headless,
        },
        config.router_settings(),
    );
    let router_task = tokio::spawn(router.run());

    let listener = HostListener::bind(&config).await?;
    let port = listener.port()?;
    match config.transport {
        HostTransport::WebSocket => info!("Players can join at ws://{}:{port}", local_ip()),
        HostTransport::Stream => info!(
            "Players can join at {}:{port} ({} framing)",
            local_ip(),
            config.framing
        ),
    }
    info!(
        "Waiting for {} player(s) before dealing",
        config.remote_players()
    );
    tokio::spawn(listener.serve(handle.clone()));

    tokio::select! {
        stats = HostSession::new(handle.clone(), &config).run(events) => {
            warn!("Router stopped unexpectedly after {} game(s)", stats.games_started);
        }
        () = shutdown_signal() => info!("Received shutdown signal"),
    }

    let _ = handle.shutdown().await;
    router_task.await?;
    info!("Host stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
}
