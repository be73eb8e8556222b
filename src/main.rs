// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/main.rs
// Version: 3.0.0
//
// Command line entry point: parse arguments, set up logging, mine a single
// round and print the winning digest and nonce.

use anyhow::{Context, anyhow};
use bmx_miner::{
    Miner, MinerError, SessionHandle,
    core::types::Args,
    utils::{format::FormatUtils, logging::initialize_logging},
};
use clap::Parser;
use log::{error, info, warn};

const LOG_TARGET: &str = "bmx::main";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Validate arguments
    if let Err(err) = args.validate() {
        eprintln!("❌ Error: {}", err);
        std::process::exit(1);
    }

    initialize_logging(args.log_config.as_deref(), args.verbose)
        .context("could not set up logging")?;

    let target = args.resolve_target()?;
    let config = args.miner_config()?;

    let handle = SessionHandle::new();
    let ctrl_c_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(target: LOG_TARGET, "Ctrl+C received, stopping miner");
            ctrl_c_handle.stop();
        }
    });

    let miner = Miner::new(config);
    let outcome = tokio::task::spawn_blocking(move || miner.start_with_handle(handle)?.mine(target))
        .await
        .map_err(|e| anyhow!("mining task failed: {}", e))?;

    match outcome {
        Ok(result) => {
            info!(
                target: LOG_TARGET,
                "✅ Solution found in {} at {}",
                FormatUtils::format_elapsed(result.elapsed),
                FormatUtils::format_hashrate(result.hashrate())
            );
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result.report())?);
            } else {
                println!("nonce: {}", result.nonce);
                println!("hash:  {}", result.digest);
            }
            Ok(())
        }
        Err(MinerError::Cancelled) => {
            info!(target: LOG_TARGET, "Mining cancelled before a solution was found");
            std::process::exit(130);
        }
        Err(e) => {
            error!(target: LOG_TARGET, "❌ Mining failed: {}", e);
            Err(e.into())
        }
    }
}

// Changelog:
// - v3.0.0: Single-round BMX mining with Ctrl+C cancellation.
// - v2.0.0: Feature-based CPU/GPU/hybrid modes.
