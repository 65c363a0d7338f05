mod api;
mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use gerirecall_core::{Scheduler, Store};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::commands::{open_scheduler, run};
use cli::opts::{Cli, Command};
use config::Config;

pub type SharedScheduler = Arc<Scheduler<Box<dyn Store>>>;

fn init_logging(level: &str) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::new("warn")
            .add_directive(format!("gerirecall={level}").parse()?)
            .add_directive(format!("gerirecall_core={level}").parse()?)
            .add_directive(format!("gerirecall_json={level}").parse()?)
            .add_directive(format!("tower_http={level}").parse()?),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("installing log subscriber")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let config = Config::load(args.config.as_deref())?;
    init_logging(&config.log_level)?;

    let sched = open_scheduler(&args, &config)?;

    match &args.cmd {
        Command::Serve { addr } => {
            let addr = addr.as_deref().unwrap_or(&config.api.addr);
            let addr: std::net::SocketAddr =
                addr.parse().with_context(|| format!("bad bind address {addr}"))?;
            let rt = Runtime::new()?;
            rt.block_on(api::server::run(sched, addr))
        }
        _ => run(&sched, args.cmd.clone()),
    }
}
