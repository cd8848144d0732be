//! JSON-RPC transport for an EVM node.
//!
//! [`RpcClient`] sends JSON-RPC 2.0 requests through a [`Transport`] and
//! retries the two transient failure classes (timeouts and connection
//! resets) after a fixed delay. By default it retries forever: public
//! endpoints drop requests often enough that giving up would make most
//! computations fail.
//!
//! # Example
//!
//! ```no_run
//! use yyapr::rpc::{HttpTransport, RetryPolicy, RpcClient};
//!
//! # async fn example() -> Result<(), yyapr::Error> {
//! let transport = HttpTransport::new("https://rpc.ankr.com/avalanche".parse().unwrap())?;
//! let rpc = RpcClient::new(transport, RetryPolicy::default());
//!
//! let block = rpc.block_number().await?;
//! println!("Current block: {block}");
//! # Ok(())
//! # }
//! ```

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{self, AtomicU64},
    },
    time::Duration,
};

use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use serde_with::SerializeDisplay;
use url::Url;

use crate::Error;

/// Default delay between two attempts of the same request.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2_000);

/// Default time allowed for one HTTP request before it counts as a timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Block a call is evaluated against.
///
/// Every call of one computation is pinned to the same [`BlockTag::Number`]
/// so all values come from a consistent snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, SerializeDisplay)]
pub enum BlockTag {
    /// The node's latest block.
    #[display("latest")]
    Latest,
    /// A specific block, rendered as a hex quantity.
    #[display("{_0:#x}")]
    Number(u64),
}

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub id: u64,
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
}

impl Request {
    /// Creates a request with `id: 1`.
    pub fn new(method: &'static str, params: Value) -> Self {
        Self {
            id: 1,
            jsonrpc: "2.0",
            method,
            params,
        }
    }

    /// `eth_blockNumber` request.
    pub fn block_number() -> Self {
        Self::new("eth_blockNumber", json!([]))
    }

    /// `eth_call` request against `to` with `data` as calldata.
    pub fn call(to: Address, data: &[u8], block: BlockTag) -> Self {
        let call = json!({
            "to": to,
            "data": const_hex::encode_prefixed(data),
        });
        Self::new("eth_call", json!([call, block]))
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl Response {
    /// Returns the `result` field.
    ///
    /// A `null` or missing result is `Ok(None)`: the node has no data for
    /// that block or address, which is not an error.
    pub fn into_result(self) -> Result<Option<Value>, Error> {
        if let Some(RpcError { code, message }) = self.error {
            return Err(Error::Rpc { code, message });
        }
        Ok(self.result.filter(|value| !value.is_null()))
    }
}

/// Sends a single request, exactly once.
///
/// Retrying is the job of [`RpcClient`]; implementations report failures
/// with the matching [`Error`] variant so transient ones can be told apart.
pub trait Transport: Send + Sync {
    fn send(&self, request: &Request) -> impl Future<Output = Result<Option<Value>, Error>> + Send;
}

/// HTTP POST transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
    url: Url,
}

impl HttpTransport {
    /// Creates a transport for the node at `url` with [`DEFAULT_REQUEST_TIMEOUT`].
    pub fn new(url: Url) -> Result<Self, Error> {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a transport whose requests fail with [`Error::Timeout`] after
    /// `timeout`.
    pub fn with_timeout(url: Url, timeout: Duration) -> Result<Self, Error> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .tcp_nodelay(true)
            .build()?;
        Ok(Self { http_client, url })
    }

    /// Returns the node URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> Result<Option<Value>, Error> {
        let response: Response = self
            .http_client
            .post(self.url.clone())
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response.into_result()
    }
}

/// Retry behaviour for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before resending the identical request.
    pub delay: Duration,
    /// Maximum number of retries, `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RETRY_DELAY,
            max_retries: None,
        }
    }
}

/// JSON-RPC client with retry on transient failures.
///
/// Cloning is cheap and clones share the attempt counter.
#[derive(Debug, Clone)]
pub struct RpcClient<T> {
    transport: T,
    retry: RetryPolicy,
    attempts: Arc<AtomicU64>,
}

impl<T> RpcClient<T>
where
    T: Transport,
{
    /// Creates a client on top of `transport`.
    pub fn new(transport: T, retry: RetryPolicy) -> Self {
        Self {
            transport,
            retry,
            attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Total number of requests handed to the transport, retries included.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(atomic::Ordering::Relaxed)
    }

    /// Sends `request` and returns its `result`.
    ///
    /// Timeouts and connection resets are retried after
    /// [`RetryPolicy::delay`]; any other error is returned immediately.
    pub async fn send(&self, request: &Request) -> Result<Option<Value>, Error> {
        let mut retries = 0u32;
        loop {
            self.attempts.fetch_add(1, atomic::Ordering::Relaxed);
            let err = match self.transport.send(request).await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_transient() => err,
                Err(err) => return Err(err),
            };

            if self.retry.max_retries.is_some_and(|max| retries >= max) {
                return Err(Error::RetriesExhausted {
                    attempts: retries + 1,
                    last: Box::new(err),
                });
            }
            retries += 1;

            log::warn!(
                "{} failed ({err}), trying again in {:?}",
                request.method,
                self.retry.delay
            );
            tokio::time::sleep(self.retry.delay).await;
        }
    }

    /// Returns the node's latest block number.
    pub async fn block_number(&self) -> Result<u64, Error> {
        let result = self.send(&Request::block_number()).await?;
        let hex = result
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidResponse(format!("eth_blockNumber returned {result:?}")))?;
        parse_quantity(hex)
    }

    /// Executes `eth_call` and returns the raw return data.
    ///
    /// `Ok(None)` means the node returned `null`.
    pub async fn call(&self, to: Address, data: &[u8], block: BlockTag) -> Result<Option<Bytes>, Error> {
        let Some(result) = self.send(&Request::call(to, data, block)).await? else {
            return Ok(None);
        };
        let hex = result
            .as_str()
            .ok_or_else(|| Error::InvalidResponse(format!("eth_call returned {result}")))?;
        let bytes = const_hex::decode(hex)
            .map_err(|err| Error::InvalidResponse(format!("eth_call returned {hex}: {err}")))?;
        Ok(Some(bytes.into()))
    }
}

/// Parses a hex quantity such as `0x1b4`.
fn parse_quantity(hex: &str) -> Result<u64, Error> {
    let digits = hex
        .strip_prefix("0x")
        .ok_or_else(|| Error::InvalidResponse(format!("not a hex quantity: {hex}")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|err| Error::InvalidResponse(format!("not a hex quantity: {hex}: {err}")))
}
