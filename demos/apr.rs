//! Print the current yyJOE and yyPTP APRs.
//!
//! Both APRs are computed concurrently against the same block.
//!
//! # Usage
//!
//! ```bash
//! # Public endpoint
//! cargo run --example apr
//!
//! # Own node, with progress logs
//! RUST_LOG=info cargo run --example apr -- --rpc-url http://127.0.0.1:9650/ext/bc/C/rpc
//!
//! # Give up after 5 retries instead of retrying forever
//! cargo run --example apr -- --max-retries 5
//! ```
//!
//! # Output
//!
//! ```text
//! Connecting to RPC endpoint: https://rpc.ankr.com/avalanche
//! yyJOE APR 27.31% (1:1), 29.87% (market ratio) as of block 19000000
//! yyPTP APR 41.02% (1:1), 44.50% (market ratio) as of block 19000000
//! ```

use std::time::Duration;

use clap::Parser;
use yyapr::{
    Client, Config,
    config::{DEFAULT_RPC_URL, RPC_URL_ENV},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// RPC url
    #[arg(short, long, env = RPC_URL_ENV, default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
    /// Time allowed for one request before it is retried, in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
    /// Delay between retries, in milliseconds.
    #[arg(long, default_value_t = 2_000)]
    retry_delay_ms: u64,
    /// Maximum number of retries per request, unlimited if omitted.
    #[arg(long)]
    max_retries: Option<u32>,
    /// Print the results as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    simple_logger::init_with_env()?;
    let args = Cli::parse();

    println!("Connecting to RPC endpoint: {}", args.rpc_url);

    let mut config = Config {
        rpc_url: args.rpc_url,
        request_timeout: Duration::from_millis(args.timeout_ms),
        ..Config::default()
    };
    config.retry.delay = Duration::from_millis(args.retry_delay_ms);
    config.retry.max_retries = args.max_retries;

    let client = Client::from_config(config)?;
    let (joe, ptp) = client.all().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&[joe, ptp])?);
    } else {
        println!("{joe}");
        println!("{ptp}");
    }

    Ok(())
}
