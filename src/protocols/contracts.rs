//! ABI fragments shared by both wrappers.

/// Decimals of JOE, PTP, the wrappers and their pair reserves.
pub const WRAPPER_DECIMALS: u32 = 18;

/// Pair (and plain ERC-20) functions.
pub const LP_TOKEN_ABI: &[&str] = &[
    "function balanceOf(address account) view returns (uint256)",
    "function getReserves() view returns (uint112 _reserve0, uint112 _reserve1, uint32 _blockTimestampLast)",
];

/// Wrapper staking contract.
pub const STAKING_ABI: &[&str] = &["function internalBalance() view returns (uint256)"];
