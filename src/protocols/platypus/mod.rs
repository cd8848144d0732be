//! yyPTP APR from MasterPlatypusV3.
//!
//! Platypus splits emissions between a dialuting (base) part paid on LP
//! deposits and a non dialuting (boosted) part paid on vePTP factors. Pools
//! are weighted by their adjusted allocation points, which already include
//! the coverage ratio adjustment. 15% of everything yyPTP earns goes to yyPTP
//! stakers.

use alloy::{
    dyn_abi::DynSolValue,
    json_abi::JsonAbi,
    primitives::{Address, U256},
};
use futures::future::{try_join, try_join_all};

use crate::{
    Error,
    abi::{ContractCall, Decoded, address, parse_abi, uint},
    apr::{self, YieldResult},
    protocols::{WrapperAbis, WrapperContracts, fetch_amount, pool_count, wrapper_state},
    rewards::{self, PoolSnapshot, ProtocolEmission, RewardSplit},
    rpc::{BlockTag, RpcClient, Transport},
    units::DecimalAmount,
};

pub mod contracts;

use contracts::{FACTOR_DECIMALS, LP_DECIMALS, PTP_DECIMALS};

/// Wrapper token symbol.
pub const SYMBOL: &str = "yyPTP";

/// Contracts involved in the yyPTP APR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contracts {
    pub master_platypus: Address,
    pub wrapper: WrapperContracts,
}

impl Default for Contracts {
    fn default() -> Self {
        Self {
            master_platypus: contracts::MASTER_PLATYPUSV3_ADDRESS,
            wrapper: WrapperContracts {
                token: contracts::YYPTP_ADDRESS,
                staking: contracts::YYPTP_STAKING_ADDRESS,
                pair: contracts::PTP_YYPTP_PAIR_ADDRESS,
                reward_share: contracts::PERCENTAGE_REWARDS_TO_YYPTP,
            },
        }
    }
}

/// Emission context of MasterPlatypusV3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    pub emission: ProtocolEmission,
    /// Dialuting and non dialuting repartitions, shared by every pool.
    pub split: RewardSplit,
}

/// yyPTP APR client.
#[derive(Debug, Clone)]
pub struct Client<T> {
    rpc: RpcClient<T>,
    contracts: Contracts,
    master_abi: JsonAbi,
    wrapper_abis: WrapperAbis,
}

impl<T> Client<T>
where
    T: Transport,
{
    /// Creates a client. Fails only if the built-in ABI fragments do not parse.
    pub fn new(rpc: RpcClient<T>, contracts: Contracts) -> Result<Self, Error> {
        Ok(Self {
            rpc,
            contracts,
            master_abi: parse_abi(contracts::MASTER_PLATYPUSV3_ABI)?,
            wrapper_abis: WrapperAbis::new()?,
        })
    }

    /// Returns the RPC client.
    pub fn rpc(&self) -> &RpcClient<T> {
        &self.rpc
    }

    /// Returns the contract set.
    pub fn contracts(&self) -> &Contracts {
        &self.contracts
    }

    fn master_call(&self, function: &'static str, args: Vec<DynSolValue>, block: BlockTag) -> ContractCall<'_> {
        ContractCall::new(&self.master_abi, self.contracts.master_platypus, function, args, block)
    }

    async fn fetch_uint(&self, function: &'static str, block: BlockTag) -> Result<Option<U256>, Error> {
        Ok(self
            .rpc
            .call_function(&self.master_call(function, vec![], block))
            .await?
            .and_then(|decoded| decoded.uint()))
    }

    /// Computes the yyPTP APR at the latest block.
    pub async fn apr(&self) -> Result<YieldResult, Error> {
        log::info!("Getting latest blockNumber...");
        let block = self.rpc.block_number().await?;
        log::info!("Latest block has been retrieved, number = {block}");
        self.apr_at(block).await
    }

    /// Computes the yyPTP APR with every call pinned to `block`.
    pub async fn apr_at(&self, block: u64) -> Result<YieldResult, Error> {
        let tag = BlockTag::Number(block);

        let annual_reward = self.annual_reward(tag).await?;
        let to_stakers = annual_reward.map(|total| total * self.contracts.wrapper.reward_share);
        log::info!("PTP rewards to {SYMBOL} stakers per year = {to_stakers:?}");

        let state = wrapper_state(&self.rpc, &self.wrapper_abis, &self.contracts.wrapper, SYMBOL, tag).await?;
        let result = apr::synthesize(SYMBOL, &state.apr_inputs(to_stakers), block);
        log::info!("{result}");
        Ok(result)
    }

    /// Fetches the emission rate, total adjusted allocation points, pool
    /// count and repartitions.
    ///
    /// `None` if any of them is unavailable.
    pub async fn emission(&self, block: BlockTag) -> Result<Option<Emission>, Error> {
        log::debug!("Getting the ptpPerSec for MasterPlatypusV3 contract...");
        let rate_per_second =
            fetch_amount(&self.rpc, self.master_call("ptpPerSec", vec![], block), PTP_DECIMALS).await?;

        // adjusted points, not base points: rewards follow the coverage ratio adjustment
        log::debug!("Getting the totalAdjustedAllocPoint for MasterPlatypusV3 contract...");
        let total_allocation_weight = fetch_amount(
            &self.rpc,
            self.master_call("totalAdjustedAllocPoint", vec![], block),
            PTP_DECIMALS,
        )
        .await?;

        log::debug!("Getting the poolLength for MasterPlatypusV3 contract...");
        let pool_count = self
            .fetch_uint("poolLength", block)
            .await?
            .and_then(|raw| pool_count(raw, "MasterPlatypusV3"));

        log::debug!("Getting the dialutingRepartition and nonDialutingRepartition for MasterPlatypusV3 contract...");
        let permille = |raw: U256| u64::try_from(raw).ok();
        let dialuting = self.fetch_uint("dialutingRepartition", block).await?.and_then(permille);
        let non_dialuting = self.fetch_uint("nonDialutingRepartition", block).await?.and_then(permille);

        let (
            Some(rate_per_second),
            Some(total_allocation_weight),
            Some(pool_count),
            Some(dialuting),
            Some(non_dialuting),
        ) = (rate_per_second, total_allocation_weight, pool_count, dialuting, non_dialuting)
        else {
            log::error!(
                "MasterPlatypusV3 emission unavailable: ptpPerSec = {rate_per_second:?}, \
                 totalAdjustedAllocPoint = {total_allocation_weight:?}, poolLength = {pool_count:?}, \
                 dialutingRepartition = {dialuting:?}, nonDialutingRepartition = {non_dialuting:?}"
            );
            return Ok(None);
        };

        log::info!(
            "ptpPerSec = {rate_per_second} PTP, totalAdjustedAllocPoint = {total_allocation_weight}, \
             poolLength = {pool_count}, dialutingRepartition = {dialuting}, nonDialutingRepartition = {non_dialuting}"
        );
        Ok(Some(Emission {
            emission: ProtocolEmission {
                rate_per_second,
                total_allocation_weight,
                pool_count,
            },
            split: RewardSplit::from_permille(dialuting as f64, non_dialuting as f64),
        }))
    }

    /// Fetches `poolInfo`, the pool's LP balance and yyPTP's `userInfo`.
    pub async fn pool(&self, pool_index: usize, split: RewardSplit, block: BlockTag) -> Result<Option<PoolSnapshot>, Error> {
        let pid = uint(pool_index as u64);
        let user_info = self.master_call(
            "userInfo",
            vec![pid.clone(), address(self.contracts.wrapper.token)],
            block,
        );

        let ((pool_info, lp_supply), user_info) = try_join(
            self.pool_info(pid, block),
            self.rpc.call_function(&user_info),
        )
        .await?;

        let snapshot = pool_info
            .zip(lp_supply)
            .zip(user_info)
            .and_then(|((pool_info, lp_supply), user_info)| {
                pool_snapshot(pool_index, split, &pool_info, lp_supply, &user_info)
            });
        if snapshot.is_none() {
            log::error!("poolInfo/balanceOf/userInfo unavailable for MasterPlatypusV3 pool {pool_index}");
        }
        Ok(snapshot)
    }

    /// `poolInfo` followed by the LP token balance held by MasterPlatypusV3.
    async fn pool_info(&self, pid: DynSolValue, block: BlockTag) -> Result<(Option<Decoded>, Option<f64>), Error> {
        let pool_info = self
            .rpc
            .call_function(&self.master_call("poolInfo", vec![pid], block))
            .await?;
        let Some(lp_token) = pool_info.as_ref().and_then(|info| info.address_field("lpToken")) else {
            return Ok((pool_info, None));
        };

        let lp_supply = fetch_amount(
            &self.rpc,
            ContractCall::new(
                &self.wrapper_abis.lp_token,
                lp_token,
                "balanceOf",
                vec![address(self.contracts.master_platypus)],
                block,
            ),
            LP_DECIMALS,
        )
        .await?;
        Ok((pool_info, lp_supply))
    }

    /// Total PTP earned by yyPTP per year, before the stakers' share.
    pub async fn annual_reward(&self, block: BlockTag) -> Result<Option<f64>, Error> {
        let Some(Emission { emission, split }) = self.emission(block).await? else {
            return Ok(None);
        };

        log::info!(
            "Getting the poolInfo and userInfo for MasterPlatypusV3 contract for our {} pools...",
            emission.pool_count
        );
        let pools = try_join_all((0..emission.pool_count).map(|pool_index| async move {
            Ok::<_, Error>((pool_index, self.pool(pool_index, split, block).await?))
        }))
        .await?;

        let (total, rewards) = rewards::annual_reward(&emission, pools);
        for reward in &rewards {
            log::debug!(
                "pool {}: base {} PTP/year, boosted {} PTP/year",
                reward.pool_index,
                reward.base,
                reward.boosted
            );
        }
        log::info!("Total PTP earned per year = {total} PTP");
        Ok(Some(total))
    }
}

fn pool_snapshot(
    pool_index: usize,
    split: RewardSplit,
    pool_info: &Decoded,
    lp_supply: f64,
    user_info: &Decoded,
) -> Option<PoolSnapshot> {
    let amount = |decoded: &Decoded, name: &str, decimals: u32| {
        decoded
            .uint_field(name)
            .map(|raw| DecimalAmount::from_raw(raw, decimals).to_f64())
    };

    Some(PoolSnapshot {
        pool_index,
        allocation_weight: amount(pool_info, "adjustedAllocPoint", PTP_DECIMALS)?,
        total_staked_base: lp_supply,
        total_staked_boosted: amount(pool_info, "sumOfFactors", FACTOR_DECIMALS)?,
        user_staked_base: amount(user_info, "amount", LP_DECIMALS)?,
        user_staked_boosted: amount(user_info, "factor", FACTOR_DECIMALS)?,
        split,
    })
}
