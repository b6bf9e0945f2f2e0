//! hexterm — entry point.
//!
//! ```text
//! hexterm tcp 4000                       Listen for TCP connections
//! hexterm --ascii tcp host:23            Talk text to a TCP server
//! hexterm --spam-rate 10 udp host:5000   Load a UDP peer
//! hexterm --gen-config                   Dump default config and exit
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hexterm::config::{HextermConfig, Overrides};
use hexterm::console::spawn_stdin_console;
use hexterm::target::{self, Target};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "hexterm", about = "Interactive hex/ascii diagnostic terminal")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "hexterm.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    target: Option<Target>,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&HextermConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = HextermConfig::load(&cli.config);
    config.apply(&cli.overrides);

    // Logs go to stderr; stdout carries the dumps.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("hexterm v{}", env!("CARGO_PKG_VERSION"));

    let Some(target) = cli.target else {
        return Err("no transport given; see --help".into());
    };
    config.session.validate()?;

    let mut console = spawn_stdin_console()?;
    match target::run(&target, &config.session, &mut console).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_end_of_stream() => {
            info!("remote end closed");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
