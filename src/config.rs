//! Client configuration.
//!
//! Everything defaults to Avalanche C-Chain mainnet. The node URL can be
//! overridden through the `AVALANCHE_RPC_URL` environment variable.

use std::{env, time::Duration};

use url::Url;

use crate::{
    Error,
    protocols::{joe, platypus},
    rpc::{DEFAULT_REQUEST_TIMEOUT, RetryPolicy},
};

/// Public Avalanche C-Chain endpoint.
pub const DEFAULT_RPC_URL: &str = "https://rpc.ankr.com/avalanche";

/// Environment variable overriding [`DEFAULT_RPC_URL`].
pub const RPC_URL_ENV: &str = "AVALANCHE_RPC_URL";

/// Node, retry behaviour and contract addresses used by [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub rpc_url: String,
    /// Time allowed for one HTTP request before it fails as a transient timeout.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub joe: joe::Contracts,
    pub platypus: platypus::Contracts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_owned(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            joe: joe::Contracts::default(),
            platypus: platypus::Contracts::default(),
        }
    }
}

impl Config {
    /// Default configuration with the node URL taken from `AVALANCHE_RPC_URL`
    /// when it is set and not empty.
    pub fn from_env() -> Self {
        Self::default().with_rpc_url_from(env::var(RPC_URL_ENV).ok())
    }

    fn with_rpc_url_from(mut self, value: Option<String>) -> Self {
        if let Some(rpc_url) = value.filter(|value| !value.trim().is_empty()) {
            self.rpc_url = rpc_url.trim().to_owned();
        }
        self
    }

    /// Parses [`Config::rpc_url`].
    pub fn url(&self) -> Result<Url, Error> {
        Ok(self.rpc_url.parse()?)
    }
}
