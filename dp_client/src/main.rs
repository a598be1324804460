//! A five-card draw poker participant.
//!
//! Connects to a host over WebSocket or a raw stream and plays from the
//! terminal.

use anyhow::{Context, Result, bail};
use dp_client::{
    commands::{self, Command, parse_command},
    view::PlayerView,
};
use draw_poker::{
    Role, Router, RouterHandle, RouterSettings,
    messages::Action,
    net::framing::Framing,
    transport::{
        Channel,
        stream::{self, PeerDirectory, StreamSettings},
        websocket::{self, WsSettings},
    },
};
use log::{debug, warn};
use pico_args::Arguments;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Join a five-card draw poker game

USAGE:
  dp_client [OPTIONS]

OPTIONS:
  --transport  ws|stream   How to reach the host  [default: ws]
  --connect    HOST:PORT   Host address  [default: 127.0.0.1:8000]
  --peer       NAME        Connect to a named peer from DP_PEERS (stream only)
  --framing    nul|prefixed  Stream framing  [default: nul]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DP_PEERS                 Known peers, e.g. den=192.168.1.20:9000,attic=192.168.1.31:9000
  RUST_LOG                 Log filter  [default: warn]
";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Transport {
    WebSocket,
    Stream,
}

impl std::str::FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ws" | "websocket" => Ok(Self::WebSocket),
            "stream" | "tcp" => Ok(Self::Stream),
            other => Err(format!("unknown transport '{other}'")),
        }
    }
}

struct Args {
    transport: Transport,
    addr: String,
    peer: Option<String>,
    framing: Framing,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        transport: pargs
            .opt_value_from_str("--transport")?
            .unwrap_or(Transport::WebSocket),
        addr: pargs
            .opt_value_from_str("--connect")?
            .unwrap_or_else(|| "127.0.0.1:8000".to_string()),
        peer: pargs.opt_value_from_str("--peer")?,
        framing: pargs
            .opt_value_from_str("--framing")?
            .unwrap_or(Framing::NulTerminated),
    };

    run(args).await
}

async fn connect(args: &Args) -> Result<Channel> {
    let settings = StreamSettings {
        framing: args.framing,
        ..StreamSettings::default()
    };
    match (args.transport, &args.peer) {
        (Transport::WebSocket, None) => {
            Ok(websocket::connect(&args.addr, WsSettings::default()).await?)
        }
        (Transport::WebSocket, Some(_)) => bail!("--peer only works with --transport stream"),
        (Transport::Stream, None) => Ok(stream::connect(&args.addr, settings).await?),
        (Transport::Stream, Some(name)) => {
            let peers = std::env::var("DP_PEERS").unwrap_or_default();
            let directory = PeerDirectory::parse(&peers).map_err(anyhow::Error::msg)?;
            directory
                .connect_named(name, settings)
                .await
                .with_context(|| format!("Failed to reach peer '{name}'"))
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let channel = connect(&args).await.context("Failed to connect to the host")?;
    println!("Connected to {}. Type 'help' for commands.", channel.peer);

    let (router, handle, mut events) = Router::new(Role::Participant, RouterSettings::default());
    let router_task = tokio::spawn(router.run());
    handle.add_connection(channel).await?;

    let mut view = PlayerView::new();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                debug!("{event:?}");
                for line in view.apply(event) {
                    println!("{line}");
                }
                if view.disconnected {
                    break;
                }
            }
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => handle_command(&handle, &view, command).await,
                    Err(err) => println!("{err}"),
                }
            }
        }
    }

    let _ = handle.shutdown().await;
    router_task.await?;
    println!("Left the game.");
    Ok(())
}

async fn handle_command(router: &RouterHandle, view: &PlayerView, command: Command) {
    let action = match command {
        Command::Swap(positions) => match view.swap(&positions) {
            Ok(action) => action,
            Err(reason) => {
                println!("{reason}");
                return;
            }
        },
        Command::Deal => Action::Deal,
        Command::Hand => {
            println!("{}", view.describe_hand());
            return;
        }
        Command::Help => {
            print!("{}", commands::HELP);
            return;
        }
        Command::Quit => return,
    };
    if let Err(err) = router.submit(action).await {
        warn!("Could not send action: {err}");
        println!("Could not send that: {err}");
    }
}
