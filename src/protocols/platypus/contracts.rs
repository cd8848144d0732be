//! MasterPlatypusV3 contracts on Avalanche.

use alloy::primitives::{Address, address};

/// yyPTP token, the account staking in MasterPlatypusV3.
pub const YYPTP_ADDRESS: Address = address!("0x40089e90156fc6f994cc0ec86dbe84634a1c156f");

/// yyPTP staking contract.
pub const YYPTP_STAKING_ADDRESS: Address = address!("0x9bc36cc686800be1905bf7e10578ee6fbdd6f27a");

/// PTP/yyPTP pair on Pangolin.
pub const PTP_YYPTP_PAIR_ADDRESS: Address = address!("0x7a8ae10536d6920aa609d12775ffe6d73376668f");

pub const MASTER_PLATYPUSV3_ADDRESS: Address =
    address!("0x68c5f4374228beedfa078e77b5ed93c28a2f713e");

/// Share of PTP earned by yyPTP that goes to yyPTP stakers.
pub const PERCENTAGE_REWARDS_TO_YYPTP: f64 = 0.15;

/// Decimals of `ptpPerSec` and of the (adjusted) allocation points.
pub const PTP_DECIMALS: u32 = 18;

/// Platypus LP tokens.
pub const LP_DECIMALS: u32 = 6;

/// Boost factors are `sqrt(lp * vePTP)`, so (6 + 18) / 2.
pub const FACTOR_DECIMALS: u32 = 12;

pub const MASTER_PLATYPUSV3_ABI: &[&str] = &[
    "function ptpPerSec() view returns (uint256)",
    "function totalAdjustedAllocPoint() view returns (uint256)",
    "function poolLength() view returns (uint256)",
    "function dialutingRepartition() view returns (uint256)",
    "function nonDialutingRepartition() view returns (uint256)",
    "function poolInfo(uint256) view returns (address lpToken, uint256 baseAllocPoint, uint256 lastRewardTimestamp, uint256 accPtpPerShare, address rewarder, uint256 sumOfFactors, uint256 accPtpPerFactorShare, uint256 adjustedAllocPoint)",
    "function userInfo(uint256, address) view returns (uint256 amount, uint256 rewardDebt, uint256 factor)",
];
