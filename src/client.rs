use futures::future::{join, try_join};

use crate::{
    Config, Error,
    apr::YieldResult,
    protocols::{joe, platypus},
    rpc::{HttpTransport, RpcClient, Transport},
};

/// Computes the yyJOE and yyPTP APRs over one shared RPC client.
///
/// # Example
///
/// ```no_run
/// # async fn example() -> Result<(), yyapr::Error> {
/// let client = yyapr::Client::mainnet()?;
/// let (joe, ptp) = client.all().await?;
/// println!("{joe}");
/// println!("{ptp}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client<T> {
    rpc: RpcClient<T>,
    joe: joe::Client<T>,
    platypus: platypus::Client<T>,
}

impl Client<HttpTransport> {
    /// Client for [`Config::from_env`].
    pub fn mainnet() -> Result<Self, Error> {
        Self::from_config(Config::from_env())
    }

    /// HTTP client for `config`.
    pub fn from_config(config: Config) -> Result<Self, Error> {
        let transport = HttpTransport::with_timeout(config.url()?, config.request_timeout)?;
        Self::new(RpcClient::new(transport, config.retry), &config)
    }
}

impl<T> Client<T>
where
    T: Transport + Clone,
{
    /// Creates a client using the contract sets of `config`.
    ///
    /// The node URL and retry policy of `config` are ignored: they are
    /// already baked into `rpc`.
    pub fn new(rpc: RpcClient<T>, config: &Config) -> Result<Self, Error> {
        Ok(Self {
            joe: joe::Client::new(rpc.clone(), config.joe)?,
            platypus: platypus::Client::new(rpc.clone(), config.platypus)?,
            rpc,
        })
    }

    /// Returns the RPC client shared by both protocols.
    pub fn rpc(&self) -> &RpcClient<T> {
        &self.rpc
    }

    /// yyJOE aggregator.
    pub fn joe(&self) -> &joe::Client<T> {
        &self.joe
    }

    /// yyPTP aggregator.
    pub fn platypus(&self) -> &platypus::Client<T> {
        &self.platypus
    }

    /// yyJOE APR at the latest block.
    pub async fn yy_joe_apr(&self) -> Result<YieldResult, Error> {
        self.joe.apr().await
    }

    /// yyPTP APR at the latest block.
    pub async fn yy_ptp_apr(&self) -> Result<YieldResult, Error> {
        self.platypus.apr().await
    }

    /// Both APRs, computed concurrently against the same block.
    pub async fn all(&self) -> Result<(YieldResult, YieldResult), Error> {
        log::info!("Getting latest blockNumber...");
        let block = self.rpc.block_number().await?;
        log::info!("Latest block has been retrieved, number = {block}");

        try_join(self.joe.apr_at(block), self.platypus.apr_at(block)).await
    }

    /// Both APRs, each pinned to its own latest block. A failure of one does
    /// not discard the other.
    pub async fn each(&self) -> (Result<YieldResult, Error>, Result<YieldResult, Error>) {
        join(self.yy_joe_apr(), self.yy_ptp_apr()).await
    }
}
