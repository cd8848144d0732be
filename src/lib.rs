//! # yyapr
//!
//! APR calculator for the yyJOE and yyPTP yield wrappers on Avalanche C-Chain.
//!
//! yyJOE stakes JOE in Trader Joe's Boosted MasterChef, yyPTP stakes PTP in
//! MasterPlatypusV3. Both wrappers pass 15% of what they earn to the holders
//! staking the wrapper token. This crate reads the on-chain state of the
//! reward programs with plain `eth_call` requests, all pinned to one block,
//! and turns it into two APR figures per wrapper:
//!
//! - **pegged**: the wrapper is assumed to trade 1:1 with its underlying
//! - **discounted**: the staked wrapper is valued at the pair's market ratio,
//!   capped at 1
//!
//! ## Quick Navigation
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`rpc`] | JSON-RPC client with retry on timeouts and connection resets |
//! | [`abi`] | Contract call encoding and output decoding |
//! | [`units`] | Fixed point token amounts |
//! | [`rewards`] | Per-pool reward share arithmetic |
//! | [`apr`] | APR synthesis and formatting |
//! | [`protocols::joe`] | yyJOE over the Boosted MasterChef |
//! | [`protocols::platypus`] | yyPTP over MasterPlatypusV3 |
//! | [`config`] | Node URL, retry policy and contract addresses |
//!
//! ## Getting Started
//!
//! ```no_run
//! use yyapr::Client;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // honours AVALANCHE_RPC_URL
//!     let client = Client::mainnet()?;
//!     let (joe, ptp) = client.all().await?;
//!
//!     println!("{}: {} / {}", joe.wrapper, joe.apr_pegged, joe.apr_discounted);
//!     println!("{}: {} / {}", ptp.wrapper, ptp.apr_pegged, ptp.apr_discounted);
//!     Ok(())
//! }
//! ```
//!
//! A value that cannot be fetched does not fail the computation: the pool
//! it belongs to contributes nothing, or the APR it feeds renders as
//! `unavailable`. Only a failure to fetch the block number is fatal.
//!
//! The crate logs its progress through the [`log`] facade and never installs
//! a logger itself.

pub mod abi;
pub mod apr;
mod client;
pub mod config;
mod error;
pub mod protocols;
pub mod rewards;
pub mod rpc;
pub mod units;

#[cfg(test)]
mod testing;

pub use alloy::primitives::{Address, U256, address};
pub use apr::{Apr, YieldResult};
pub use client::Client;
pub use config::Config;
pub use error::Error;
pub use rust_decimal::Decimal;
