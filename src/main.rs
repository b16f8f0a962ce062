//! Comm - peer-to-peer terminal chat.
//!
//! This binary module is intentionally small: it parses CLI arguments,
//! sets up logging, starts the TCP node and runs the terminal client until
//! the user quits.

use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use comm::{tui, utils, Client, CrosstermKeys, NodeConfig, TcpNode};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on for peer connections
    #[arg(long, default_value = "0.0.0.0:6667")]
    listen: String,
    /// Host other peers should use to reach us
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Secret the node address is derived from (defaults to the user name)
    #[arg(long)]
    secret: Option<String>,
    /// Peer to connect to at startup; may be repeated
    #[arg(long = "connect", value_name = "ADDR")]
    bootstrap: Vec<String>,
    /// Write logs to this file (filtered by RUST_LOG)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    // the TUI owns the terminal, so logs only go to a file
    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let secret = cli.secret.unwrap_or_else(whoami::username);
    let config = NodeConfig {
        address: utils::address_for_secret(&secret),
        listen: cli.listen,
        host: cli.host,
        bootstrap: cli.bootstrap,
    };

    let mut client = Client::new();
    let node = TcpNode::start(config, client.handle())?;
    let address = node.local_peer().address.clone();

    let mut terminal = tui::enter()?;
    let result = client.run(node.as_ref(), &mut CrosstermKeys, &mut terminal);
    tui::leave(&mut terminal)?;
    node.shutdown();
    result?;

    println!("Comm closed ({address}).");
    Ok(())
}

fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
