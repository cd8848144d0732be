//! Turns an annual reward into APR figures.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive};
use serde::Serialize;
use serde_with::SerializeDisplay;

/// Caps the underlying/wrapper reserve ratio at 1.
///
/// The wrapper can always be minted 1:1, so a market ratio above 1 is never
/// the effective price. An empty wrapper side is such a case and caps to 1.
/// `None` when the pair holds neither token.
#[must_use]
pub fn peg_ratio(underlying_reserve: f64, wrapper_reserve: f64) -> Option<f64> {
    if underlying_reserve < 0.0 || wrapper_reserve < 0.0 {
        return None;
    }
    if wrapper_reserve > 0.0 {
        Some((underlying_reserve / wrapper_reserve).min(1.0))
    } else if underlying_reserve > 0.0 {
        Some(1.0)
    } else {
        None
    }
}

/// An annual rate, displayed as a percentage with two decimals.
///
/// Renders as `unavailable` when some input could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, SerializeDisplay)]
pub struct Apr(Option<f64>);

impl Apr {
    pub const UNAVAILABLE: Self = Self(None);

    /// `reward / principal`, unavailable for a non positive principal.
    #[must_use]
    pub fn new(reward: Option<f64>, principal: Option<f64>) -> Self {
        match (reward, principal) {
            (Some(reward), Some(principal)) if principal > 0.0 && reward.is_finite() => {
                Self(Some(reward / principal))
            }
            _ => Self::UNAVAILABLE,
        }
    }

    /// Rate as a fraction, `0.12` for 12%.
    #[must_use]
    pub const fn rate(&self) -> Option<f64> {
        self.0
    }

    /// Rate in percent, rounded half away from zero to two decimals.
    #[must_use]
    pub fn percent(&self) -> Option<Decimal> {
        let percent = Decimal::from_f64(self.0? * 100.0)?;
        Some(percent.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl fmt::Display for Apr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.percent(), self.0) {
            (Some(percent), _) => write!(f, "{percent:.2}%"),
            // beyond Decimal's range
            (None, Some(rate)) => write!(f, "{:.2}%", rate * 100.0),
            (None, None) => f.write_str("unavailable"),
        }
    }
}

/// APR figures of one wrapper, all from the same block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldResult {
    /// Wrapper token symbol, e.g. `yyJOE`.
    pub wrapper: &'static str,
    /// Assumes the wrapper trades 1:1 with the underlying.
    pub apr_pegged: Apr,
    /// Values the staked wrapper at the capped market ratio.
    pub apr_discounted: Apr,
    pub as_of_block: u64,
}

impl fmt::Display for YieldResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} APR {} (1:1), {} (market ratio) as of block {}",
            self.wrapper, self.apr_pegged, self.apr_discounted, self.as_of_block
        )
    }
}

/// Inputs of [`synthesize`]. `None` marks a value that could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AprInputs {
    /// Annual rewards paid to the wrapper's stakers, in underlying tokens.
    pub annual_reward: Option<f64>,
    /// Wrapper tokens staked.
    pub total_staked: Option<f64>,
    /// Pair reserve of the underlying token.
    pub underlying_reserve: Option<f64>,
    /// Pair reserve of the wrapper token.
    pub wrapper_reserve: Option<f64>,
}

/// Computes the pegged and discounted APR.
#[must_use]
pub fn synthesize(wrapper: &'static str, inputs: &AprInputs, as_of_block: u64) -> YieldResult {
    let ratio = inputs
        .underlying_reserve
        .zip(inputs.wrapper_reserve)
        .and_then(|(underlying, wrapper)| peg_ratio(underlying, wrapper));
    let staked_in_underlying = inputs.total_staked.zip(ratio).map(|(staked, ratio)| staked * ratio);

    YieldResult {
        wrapper,
        apr_pegged: Apr::new(inputs.annual_reward, inputs.total_staked),
        apr_discounted: Apr::new(inputs.annual_reward, staked_in_underlying),
        as_of_block,
    }
}
