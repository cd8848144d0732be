//! Reward programs backing the yield wrappers.
//!
//! - [`joe`]: yyJOE, staked in the Boosted MasterChef.
//! - [`platypus`]: yyPTP, staked in MasterPlatypusV3.
//!
//! Both wrappers share the same outer shape: a staking contract holding the
//! staked wrapper tokens and a pair trading the wrapper against its
//! underlying token. That part lives here.

use alloy::{
    json_abi::JsonAbi,
    primitives::{Address, U256},
};

use crate::{
    Error,
    abi::{ContractCall, parse_abi},
    apr::AprInputs,
    rpc::{BlockTag, RpcClient, Transport},
    units::DecimalAmount,
};

pub mod contracts;
pub mod joe;
pub mod platypus;

/// Largest `poolLength` accepted from a node. Every pool costs a few
/// concurrent requests, so a garbage count is rejected before the fan-out.
pub const MAX_POOL_COUNT: usize = 10_000;

/// Wrapper side contracts of one protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrapperContracts {
    /// Wrapper token, also the account staking in the reward program.
    pub token: Address,
    /// Staking contract of the wrapper token.
    pub staking: Address,
    /// Pair with the underlying as token0 and the wrapper as token1.
    pub pair: Address,
    /// Share of the wrapper's rewards paid to its stakers.
    pub reward_share: f64,
}

/// Parsed ABIs of the pair and staking contracts.
#[derive(Debug, Clone)]
pub(crate) struct WrapperAbis {
    pub lp_token: JsonAbi,
    pub staking: JsonAbi,
}

impl WrapperAbis {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            lp_token: parse_abi(contracts::LP_TOKEN_ABI)?,
            staking: parse_abi(contracts::STAKING_ABI)?,
        })
    }
}

/// Staked principal and pair reserves, in token units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WrapperState {
    pub total_staked: Option<f64>,
    pub underlying_reserve: Option<f64>,
    pub wrapper_reserve: Option<f64>,
}

impl WrapperState {
    pub fn apr_inputs(&self, annual_reward: Option<f64>) -> AprInputs {
        AprInputs {
            annual_reward,
            total_staked: self.total_staked,
            underlying_reserve: self.underlying_reserve,
            wrapper_reserve: self.wrapper_reserve,
        }
    }
}

/// Fetches the single `uint` output of `call` scaled by `decimals`.
pub(crate) async fn fetch_amount<T>(
    rpc: &RpcClient<T>,
    call: ContractCall<'_>,
    decimals: u32,
) -> Result<Option<f64>, Error>
where
    T: Transport,
{
    let decoded = rpc.call_function(&call).await?;
    Ok(decoded
        .and_then(|decoded| decoded.uint())
        .map(|raw| DecimalAmount::from_raw(raw, decimals).to_f64()))
}

/// Converts a raw `poolLength` of `contract`, `None` above [`MAX_POOL_COUNT`].
pub(crate) fn pool_count(raw: U256, contract: &str) -> Option<usize> {
    match usize::try_from(raw) {
        Ok(count) if count <= MAX_POOL_COUNT => Some(count),
        _ => {
            log::error!("{contract} reported {raw} pools, more than the {MAX_POOL_COUNT} accepted");
            None
        }
    }
}

/// Fetches the staked wrapper balance and the pair reserves.
pub(crate) async fn wrapper_state<T>(
    rpc: &RpcClient<T>,
    abis: &WrapperAbis,
    wrapper: &WrapperContracts,
    symbol: &str,
    block: BlockTag,
) -> Result<WrapperState, Error>
where
    T: Transport,
{
    log::info!("Getting amount of {symbol} staked...");
    let total_staked = fetch_amount(
        rpc,
        ContractCall::new(&abis.staking, wrapper.staking, "internalBalance", vec![], block),
        contracts::WRAPPER_DECIMALS,
    )
    .await?;
    log::info!("{symbol} staked = {total_staked:?}");

    log::info!("Getting reserve info for the {symbol} pair...");
    let reserves = rpc
        .call_function(&ContractCall::new(
            &abis.lp_token,
            wrapper.pair,
            "getReserves",
            vec![],
            block,
        ))
        .await?;
    let reserve = |name: &str| {
        reserves
            .as_ref()
            .and_then(|reserves| reserves.uint_field(name))
            .map(|raw| DecimalAmount::from_raw(raw, contracts::WRAPPER_DECIMALS).to_f64())
    };
    let underlying_reserve = reserve("_reserve0");
    let wrapper_reserve = reserve("_reserve1");
    log::info!(
        "{symbol} pair currently has {underlying_reserve:?} underlying and {wrapper_reserve:?} {symbol}"
    );

    Ok(WrapperState {
        total_staked,
        underlying_reserve,
        wrapper_reserve,
    })
}
