// SPDX-FileCopyrightText: 2026 Tabrecall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tabrecall - a tab-memory daemon with on-device AI summarization.
//!
//! This is the binary entry point for the tabrecall daemon.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod bridge;
mod serve;
mod shutdown;
mod status;

/// Tabrecall - a tab-memory daemon with on-device AI summarization.
#[derive(Parser, Debug)]
#[command(name = "tabrecall", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the tabrecall daemon on the stdio companion bridge.
    Serve,
    /// Show tracked records from the persisted store.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match tabrecall_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            tabrecall_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json).await,
        Some(Commands::Config) => {
            match toml::to_string_pretty(&config) {
                Ok(rendered) => {
                    print!("{rendered}");
                    Ok(())
                }
                Err(e) => Err(tabrecall_core::TabrecallError::Internal(format!(
                    "failed to render config: {e}"
                ))),
            }
        }
        None => {
            println!("tabrecall: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
