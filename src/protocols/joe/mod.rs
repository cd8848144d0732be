//! yyJOE APR from the Boosted MasterChef.
//!
//! yyJOE stakes JOE derived LP in the Boosted MasterChef. Each pool pays a
//! regular stream on LP deposits and a boosted stream on veJOE factors, split
//! by the pool's `veJoeShareBp`. 15% of everything yyJOE earns goes to yyJOE
//! stakers.
//!
//! # Example
//!
//! ```no_run
//! use yyapr::{
//!     protocols::joe,
//!     rpc::{HttpTransport, RetryPolicy, RpcClient},
//! };
//!
//! # async fn example() -> Result<(), yyapr::Error> {
//! let transport = HttpTransport::new("https://rpc.ankr.com/avalanche".parse().unwrap())?;
//! let rpc = RpcClient::new(transport, RetryPolicy::default());
//! let client = joe::Client::new(rpc, joe::Contracts::default())?;
//!
//! let result = client.apr().await?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

use alloy::{dyn_abi::DynSolValue, json_abi::JsonAbi, primitives::Address};
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

use contracts::JOE_DECIMALS;

/// Wrapper token symbol.
pub const SYMBOL: &str = "yyJOE";

/// Contracts involved in the yyJOE APR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contracts {
    pub masterchef: Address,
    pub wrapper: WrapperContracts,
}

impl Default for Contracts {
    fn default() -> Self {
        Self {
            masterchef: contracts::BOOSTED_MASTERCHEF_ADDRESS,
            wrapper: WrapperContracts {
                token: contracts::YYJOE_ADDRESS,
                staking: contracts::YYJOE_STAKING_ADDRESS,
                pair: contracts::JOE_YYJOE_PAIR_ADDRESS,
                reward_share: contracts::PERCENTAGE_REWARDS_TO_YYJOE,
            },
        }
    }
}

/// yyJOE APR client.
#[derive(Debug, Clone)]
pub struct Client<T> {
    rpc: RpcClient<T>,
    contracts: Contracts,
    masterchef_abi: JsonAbi,
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
            masterchef_abi: parse_abi(contracts::BOOSTED_MASTERCHEF_ABI)?,
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

    fn masterchef_call(
        &self,
        function: &'static str,
        args: Vec<DynSolValue>,
        block: BlockTag,
    ) -> ContractCall<'_> {
        ContractCall::new(&self.masterchef_abi, self.contracts.masterchef, function, args, block)
    }

    /// Computes the yyJOE APR at the latest block.
    pub async fn apr(&self) -> Result<YieldResult, Error> {
        log::info!("Getting latest blockNumber...");
        let block = self.rpc.block_number().await?;
        log::info!("Latest block has been retrieved, number = {block}");
        self.apr_at(block).await
    }

    /// Computes the yyJOE APR with every call pinned to `block`.
    pub async fn apr_at(&self, block: u64) -> Result<YieldResult, Error> {
        let tag = BlockTag::Number(block);

        let annual_reward = self.annual_reward(tag).await?;
        let to_stakers = annual_reward.map(|total| total * self.contracts.wrapper.reward_share);
        log::info!("JOE rewards to {SYMBOL} stakers per year = {to_stakers:?}");

        let state = wrapper_state(&self.rpc, &self.wrapper_abis, &self.contracts.wrapper, SYMBOL, tag).await?;
        let result = apr::synthesize(SYMBOL, &state.apr_inputs(to_stakers), block);
        log::info!("{result}");
        Ok(result)
    }

    /// Fetches the emission rate, total allocation points and pool count.
    ///
    /// `None` if any of them is unavailable.
    pub async fn emission(&self, block: BlockTag) -> Result<Option<ProtocolEmission>, Error> {
        log::debug!("Getting the joePerSec for Boosted MasterChef contract...");
        let rate_per_second =
            fetch_amount(&self.rpc, self.masterchef_call("joePerSec", vec![], block), JOE_DECIMALS).await?;

        log::debug!("Getting the totalAllocPoint for Boosted MasterChef contract...");
        let total_allocation_weight =
            fetch_amount(&self.rpc, self.masterchef_call("totalAllocPoint", vec![], block), 0).await?;

        log::debug!("Getting the poolLength for Boosted MasterChef contract...");
        let pool_count = self
            .rpc
            .call_function(&self.masterchef_call("poolLength", vec![], block))
            .await?
            .and_then(|decoded| decoded.uint())
            .and_then(|raw| pool_count(raw, "Boosted MasterChef"));

        let (Some(rate_per_second), Some(total_allocation_weight), Some(pool_count)) =
            (rate_per_second, total_allocation_weight, pool_count)
        else {
            log::error!(
                "Boosted MasterChef emission unavailable: joePerSec = {rate_per_second:?}, \
                 totalAllocPoint = {total_allocation_weight:?}, poolLength = {pool_count:?}"
            );
            return Ok(None);
        };

        log::info!(
            "joePerSec = {rate_per_second} JOE, totalAllocPoint = {total_allocation_weight}, poolLength = {pool_count}"
        );
        Ok(Some(ProtocolEmission {
            rate_per_second,
            total_allocation_weight,
            pool_count,
        }))
    }

    /// Fetches `poolInfo` and yyJOE's `userInfo` for one pool.
    pub async fn pool(&self, pool_index: usize, block: BlockTag) -> Result<Option<PoolSnapshot>, Error> {
        let pid = uint(pool_index as u64);
        let pool_info = self.masterchef_call("poolInfo", vec![pid.clone()], block);
        let user_info = self.masterchef_call(
            "userInfo",
            vec![pid, address(self.contracts.wrapper.token)],
            block,
        );

        let (pool_info, user_info) = try_join(
            self.rpc.call_function(&pool_info),
            self.rpc.call_function(&user_info),
        )
        .await?;

        let snapshot = pool_info
            .zip(user_info)
            .and_then(|(pool_info, user_info)| pool_snapshot(pool_index, &pool_info, &user_info));
        if snapshot.is_none() {
            log::error!("poolInfo/userInfo unavailable for Boosted MasterChef pool {pool_index}");
        }
        Ok(snapshot)
    }

    /// Total JOE earned by yyJOE per year, before the stakers' share.
    pub async fn annual_reward(&self, block: BlockTag) -> Result<Option<f64>, Error> {
        let Some(emission) = self.emission(block).await? else {
            return Ok(None);
        };

        log::info!(
            "Getting the poolInfo and userInfo for Boosted MasterChef contract for our {} pools...",
            emission.pool_count
        );
        let pools = try_join_all((0..emission.pool_count).map(|pool_index| async move {
            Ok::<_, Error>((pool_index, self.pool(pool_index, block).await?))
        }))
        .await?;

        let (total, rewards) = rewards::annual_reward(&emission, pools);
        for reward in &rewards {
            log::debug!(
                "pool {}: regular {} JOE/year, boosted {} JOE/year",
                reward.pool_index,
                reward.base,
                reward.boosted
            );
        }
        log::info!("Total JOE earned per year = {total} JOE");
        Ok(Some(total))
    }
}

/// Builds the snapshot of one pool from `poolInfo` and `userInfo`.
fn pool_snapshot(pool_index: usize, pool_info: &Decoded, user_info: &Decoded) -> Option<PoolSnapshot> {
    let amount = |decoded: &Decoded, name: &str, decimals: u32| {
        decoded
            .uint_field(name)
            .map(|raw| DecimalAmount::from_raw(raw, decimals).to_f64())
    };

    Some(PoolSnapshot {
        pool_index,
        allocation_weight: amount(pool_info, "allocPoint", 0)?,
        total_staked_base: amount(pool_info, "totalLpSupply", JOE_DECIMALS)?,
        total_staked_boosted: amount(pool_info, "totalFactor", JOE_DECIMALS)?,
        user_staked_base: amount(user_info, "amount", JOE_DECIMALS)?,
        user_staked_boosted: amount(user_info, "factor", JOE_DECIMALS)?,
        split: RewardSplit::from_boosted_bp(amount(pool_info, "veJoeShareBp", 0)?),
    })
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;
    use crate::{
        apr::Apr,
        rpc::RetryPolicy,
        testing::{MockTransport, scaled},
    };

    const BLOCK: u64 = 19_000_000;

    fn mock_contracts() -> Contracts {
        Contracts {
            masterchef: address!("0x00000000000000000000000000000000000000c1"),
            wrapper: WrapperContracts {
                token: address!("0x00000000000000000000000000000000000000c2"),
                staking: address!("0x00000000000000000000000000000000000000c3"),
                pair: address!("0x00000000000000000000000000000000000000c4"),
                reward_share: 0.15,
            },
        }
    }

    fn pool_info(alloc_point: u64, ve_joe_share_bp: u64, total_factor: u64, total_lp_supply: u64) -> Vec<DynSolValue> {
        vec![
            DynSolValue::Address(Address::repeat_byte(0x11)),
            uint(alloc_point),
            uint(0u64),
            uint(0u64),
            uint(0u64),
            DynSolValue::Address(Address::ZERO),
            uint(ve_joe_share_bp),
            scaled(total_factor, 18),
            scaled(total_lp_supply, 18),
        ]
    }

    fn user_info(amount: u64, factor: u64) -> Vec<DynSolValue> {
        vec![scaled(amount, 18), uint(0u64), scaled(factor, 18)]
    }

    /// Two pools: pool 0 with 100 points and yyJOE stakes, pool 1 disabled.
    fn scenario() -> (MockTransport, Client<MockTransport>) {
        let contracts = mock_contracts();
        let transport = MockTransport::new(BLOCK);
        let rpc = RpcClient::new(transport.clone(), RetryPolicy::default());
        let client = Client::new(rpc, contracts).unwrap();
        let chef = &client.masterchef_abi;
        let wrapper = &client.wrapper_abis;
        let token = address(contracts.wrapper.token);

        transport.on_call(contracts.masterchef, chef, "joePerSec", &[], vec![scaled(1, 18)]);
        transport.on_call(contracts.masterchef, chef, "totalAllocPoint", &[], vec![uint(100u64)]);
        transport.on_call(contracts.masterchef, chef, "poolLength", &[], vec![uint(2u64)]);

        transport.on_call(contracts.masterchef, chef, "poolInfo", &[uint(0u64)], pool_info(100, 5_000, 200, 1_000));
        transport.on_call(
            contracts.masterchef,
            chef,
            "userInfo",
            &[uint(0u64), token.clone()],
            user_info(100, 50),
        );
        // degenerate totals must not leak NaN into the sum
        transport.on_call(contracts.masterchef, chef, "poolInfo", &[uint(1u64)], pool_info(0, 5_000, 0, 0));
        transport.on_call(
            contracts.masterchef,
            chef,
            "userInfo",
            &[uint(1u64), token],
            user_info(10, 10),
        );

        transport.on_call(
            contracts.wrapper.staking,
            &wrapper.staking,
            "internalBalance",
            &[],
            vec![scaled(10, 18)],
        );
        transport.on_call(
            contracts.wrapper.pair,
            &wrapper.lp_token,
            "getReserves",
            &[],
            vec![scaled(80, 18), scaled(100, 18), uint(0u64)],
        );

        (transport, client)
    }

    #[tokio::test]
    async fn test_emission() {
        let (_, client) = scenario();
        let emission = client.emission(BlockTag::Number(BLOCK)).await.unwrap().unwrap();
        assert_eq!(
            emission,
            ProtocolEmission {
                rate_per_second: 1.0,
                total_allocation_weight: 100.0,
                pool_count: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_pool_snapshot() {
        let (_, client) = scenario();
        let pool = client.pool(0, BlockTag::Number(BLOCK)).await.unwrap().unwrap();
        assert_eq!(
            pool,
            PoolSnapshot {
                pool_index: 0,
                allocation_weight: 100.0,
                total_staked_base: 1_000.0,
                total_staked_boosted: 200.0,
                user_staked_base: 100.0,
                user_staked_boosted: 50.0,
                split: RewardSplit {
                    base: 0.5,
                    boosted: 0.5
                },
            }
        );
    }

    #[tokio::test]
    async fn test_apr() {
        let (transport, client) = scenario();
        let result = client.apr().await.unwrap();

        // pool 0 only: 31_536_000 * (0.5 * 100 / 1_000 + 0.5 * 50 / 200) = 5_518_800 JOE,
        // 15% of it over 10 yyJOE
        assert_eq!(result.wrapper, "yyJOE");
        assert_eq!(result.as_of_block, BLOCK);
        assert_eq!(result.apr_pegged.to_string(), "8278200.00%");
        // 10 yyJOE are worth 8 JOE at a 0.8 ratio
        assert_eq!(result.apr_discounted.to_string(), "10347750.00%");

        // block number, 3 scalars, 2 calls per pool, staking and reserves
        assert_eq!(transport.requests(), 1 + 3 + 2 * 2 + 2);
    }

    #[tokio::test]
    async fn test_unavailable_pool_counts_as_zero() {
        let (_, client) = scenario();
        let contracts = *client.contracts();
        let transport = client.rpc().transport().clone();
        // a third pool whose userInfo reverts
        transport.on_call(
            contracts.masterchef,
            &client.masterchef_abi,
            "poolLength",
            &[],
            vec![uint(3u64)],
        );
        transport.on_call(
            contracts.masterchef,
            &client.masterchef_abi,
            "poolInfo",
            &[uint(2u64)],
            pool_info(50, 0, 10, 10),
        );
        transport.on_call_fail(
            contracts.masterchef,
            &client.masterchef_abi,
            "userInfo",
            &[uint(2u64), address(contracts.wrapper.token)],
            || Error::Rpc {
                code: -32000,
                message: "execution reverted".into(),
            },
        );

        let total = client
            .annual_reward(BlockTag::Number(BLOCK))
            .await
            .unwrap()
            .unwrap();
        assert!((total - 5_518_800.0).abs() < 1e-6, "{total}");
    }

    #[tokio::test]
    async fn test_garbage_pool_count_is_unavailable() {
        let (transport, client) = scenario();
        transport.on_call(
            client.contracts().masterchef,
            &client.masterchef_abi,
            "poolLength",
            &[],
            vec![uint(u64::MAX)],
        );

        assert_eq!(client.emission(BlockTag::Number(BLOCK)).await.unwrap(), None);
        let result = client.apr().await.unwrap();
        assert_eq!(result.apr_pegged, Apr::UNAVAILABLE);
        // no pool was queried: block number, 3 scalars, then staking and reserves
        assert_eq!(transport.requests(), 3 + 1 + 3 + 2);
    }

    #[tokio::test]
    async fn test_emission_unavailable() {
        let transport = MockTransport::new(BLOCK);
        let rpc = RpcClient::new(transport, RetryPolicy::default());
        let client = Client::new(rpc, mock_contracts()).unwrap();

        let result = client.apr().await.unwrap();
        assert_eq!(result.apr_pegged, Apr::UNAVAILABLE);
        assert_eq!(result.apr_discounted, Apr::UNAVAILABLE);
        assert_eq!(result.as_of_block, BLOCK);
    }

    #[tokio::test]
    async fn test_block_number_failure_is_fatal() {
        let transport = MockTransport::new(BLOCK);
        transport.fail_next(Error::Rpc {
            code: -32005,
            message: "limit exceeded".into(),
        });
        let rpc = RpcClient::new(transport, RetryPolicy::default());
        let client = Client::new(rpc, mock_contracts()).unwrap();

        assert!(matches!(client.apr().await, Err(Error::Rpc { code: -32005, .. })));
    }

    #[test]
    fn test_default_contracts() {
        let contracts = Contracts::default();
        assert_eq!(contracts.masterchef, contracts::BOOSTED_MASTERCHEF_ADDRESS);
        assert_eq!(contracts.wrapper.reward_share, 0.15);
        assert_eq!(contracts.wrapper.token, contracts::YYJOE_ADDRESS);
    }
}
