//! Boosted MasterChef contracts on Avalanche.

use alloy::primitives::{Address, address};

/// yyJOE token, the account staking in the Boosted MasterChef.
pub const YYJOE_ADDRESS: Address = address!("0xe7462905b79370389e8180e300f58f63d35b725f");

/// yyJOE staking contract.
pub const YYJOE_STAKING_ADDRESS: Address = address!("0x2d53bdf5507e9ae283c114a8404b460c05f700cb");

/// JOE/yyJOE pair on Trader Joe.
pub const JOE_YYJOE_PAIR_ADDRESS: Address = address!("0xe61dc1c6bb54262a7a24bd506cd50e8986af66c6");

/// Boosted MasterChef (BMCJ).
pub const BOOSTED_MASTERCHEF_ADDRESS: Address =
    address!("0x4483f0b6e2f5486d06958c20f8c39a7abe87bf8f");

/// Share of JOE earned by yyJOE that goes to yyJOE stakers.
pub const PERCENTAGE_REWARDS_TO_YYJOE: f64 = 0.15;

/// Decimals of `joePerSec`, LP amounts and boost factors.
pub const JOE_DECIMALS: u32 = 18;

pub const BOOSTED_MASTERCHEF_ABI: &[&str] = &[
    "function joePerSec() view returns (uint256 amount)",
    "function totalAllocPoint() view returns (uint256)",
    "function poolLength() view returns (uint256 pools)",
    "function poolInfo(uint256) view returns (address lpToken, uint96 allocPoint, uint256 accJoePerShare, uint256 accJoePerFactorPerShare, uint64 lastRewardTimestamp, address rewarder, uint32 veJoeShareBp, uint256 totalFactor, uint256 totalLpSupply)",
    "function userInfo(uint256, address) view returns (uint256 amount, uint256 rewardDebt, uint256 factor)",
];
