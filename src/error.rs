//! Error type shared by the RPC transport, the ABI layer and the aggregators.

use std::io;

/// Errors raised while talking to the node or encoding contract calls.
///
/// Only [`Error::Timeout`] and [`Error::ConnectionReset`] are transient; the
/// retry loop in [`RpcClient`](crate::rpc::RpcClient) retries those and
/// returns everything else to the caller on the first attempt.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request timed out.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The connection was reset or aborted by the peer.
    #[error("connection reset: {0}")]
    ConnectionReset(String),
    /// Any other HTTP level failure.
    #[error("http error: {0}")]
    Http(#[source] reqwest::Error),
    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// The node answered with something we could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// A retry cap was configured and every attempt failed transiently.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<Error> },
    /// The requested function is not part of the ABI fragment.
    #[error("function `{0}` not found in abi")]
    UnknownFunction(String),
    /// The ABI fragment could not be parsed.
    #[error("invalid abi: {0}")]
    InvalidAbi(String),
    /// The arguments do not match the function's declared inputs.
    #[error("abi error: {0}")]
    Abi(#[from] alloy::dyn_abi::Error),
    /// The node URL could not be parsed.
    #[error("invalid rpc url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` for the failure classes the transport retries.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::ConnectionReset(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout(err.to_string());
        }

        // reqwest wraps hyper which wraps the io error, walk down to it
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            if let Some(io_err) = inner.downcast_ref::<io::Error>() {
                match io_err.kind() {
                    io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                        return Self::ConnectionReset(err.to_string());
                    }
                    io::ErrorKind::TimedOut => return Self::Timeout(err.to_string()),
                    _ => {}
                }
            }
            source = inner.source();
        }

        Self::Http(err)
    }
}
