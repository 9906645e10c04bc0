#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

use std::{io::Write, path::PathBuf};

use clap::{Parser, Subcommand};
use mxtls::{Config, Mxtls};

/// Grades the TLS posture of mail servers
#[derive(Parser, Debug)]
#[command(name = "mxtls")]
#[command(about = "Probe the STARTTLS configuration of mail servers", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file, instead of searching MXTLS_CONFIG and the default paths
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Test every target read from stdin (one JSON pending test per line) and
    /// write each result to stdout
    Serve,
    /// Test a single mail server and print its result
    Probe {
        /// IP address of the mail server
        host: String,

        /// Port to connect to, overriding the configured one
        #[arg(short, long)]
        port: Option<u16>,

        /// Only print the JSON result message
        #[arg(short, long)]
        quiet: bool,
    },
}

fn load_config(explicit: Option<PathBuf>) -> anyhow::Result<Config> {
    let path = match explicit {
        Some(path) => Some(path),
        None => Config::discover()?,
    };

    Ok(match path {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config)?;

    match cli.command {
        Commands::Serve => Mxtls::new(config).serve().await,
        Commands::Probe { host, port, quiet } => {
            if let Some(port) = port {
                config.smtp.port = port;
            }

            let mut message = Vec::new();
            let run = Mxtls::new(config).probe(&host, &mut message).await?;
            std::io::stdout().write_all(&message)?;

            if !quiet {
                eprintln!("{}", mxtls::report(&run));
            }

            Ok(())
        }
    }
}
