//! `flowlang` entry point.

use clap::Parser;
use flow_cli::Args;
use log::{LevelFilter, error, info};
use std::process;
use std::str::FromStr;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    match flow_cli::run(&args).await {
        Ok(written) => info!("wrote {written}"),
        Err(err) => {
            error!("{err}");
            process::exit(1);
        }
    }
}
