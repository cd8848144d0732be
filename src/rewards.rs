//! Multi-pool reward weighting.
//!
//! Both reward programs split each pool's share of the emission into a base
//! stream, paid pro rata on deposits, and a boosted stream, paid pro rata on
//! the boost factor. The aggregators fill in a [`PoolSnapshot`] per pool and
//! this module turns them into an annual reward for the wrapper.

/// Seconds in a (non leap) year.
pub const SECONDS_PER_YEAR: f64 = 60.0 * 60.0 * 24.0 * 365.0;

/// Global reward rate of one program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProtocolEmission {
    /// Reward tokens emitted per second.
    pub rate_per_second: f64,
    /// Sum of all pools' allocation weights.
    pub total_allocation_weight: f64,
    /// Number of pools.
    pub pool_count: usize,
}

impl ProtocolEmission {
    /// Reward tokens emitted per year.
    #[must_use]
    pub fn per_year(&self) -> f64 {
        self.rate_per_second * SECONDS_PER_YEAR
    }
}

/// How a pool's emission is divided between the two streams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardSplit {
    pub base: f64,
    pub boosted: f64,
}

impl RewardSplit {
    /// Split given by the share of the boosted stream in basis points.
    #[must_use]
    pub fn from_boosted_bp(boosted_bp: f64) -> Self {
        let boosted = boosted_bp / 10_000.0;
        Self {
            base: 1.0 - boosted,
            boosted,
        }
    }

    /// Split given by both repartitions in parts per thousand.
    #[must_use]
    pub fn from_permille(base: f64, boosted: f64) -> Self {
        Self {
            base: base / 1_000.0,
            boosted: boosted / 1_000.0,
        }
    }
}

/// Per-pool state needed for reward math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolSnapshot {
    pub pool_index: usize,
    pub allocation_weight: f64,
    pub total_staked_base: f64,
    pub total_staked_boosted: f64,
    pub user_staked_base: f64,
    pub user_staked_boosted: f64,
    pub split: RewardSplit,
}

/// Annual rewards earned by the wrapper in one pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolReward {
    pub pool_index: usize,
    pub base: f64,
    pub boosted: f64,
}

impl PoolReward {
    /// Reward of a pool that contributes nothing.
    #[must_use]
    pub const fn zero(pool_index: usize) -> Self {
        Self {
            pool_index,
            base: 0.0,
            boosted: 0.0,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.base + self.boosted
    }
}

/// `share * user / total`, zero when the total is not positive.
fn pro_rata(share: f64, user: f64, total: f64) -> f64 {
    if total > 0.0 { share * user / total } else { 0.0 }
}

/// Computes the wrapper's annual reward in one pool.
///
/// A pool with zero allocation weight yields nothing, whatever its other
/// fields. Zero totals are checked before dividing.
#[must_use]
pub fn pool_reward(emission: &ProtocolEmission, pool: &PoolSnapshot) -> PoolReward {
    if pool.allocation_weight == 0.0 || emission.total_allocation_weight <= 0.0 {
        return PoolReward::zero(pool.pool_index);
    }

    let pool_share = emission.per_year() * pool.allocation_weight / emission.total_allocation_weight;
    PoolReward {
        pool_index: pool.pool_index,
        base: pro_rata(
            pool_share * pool.split.base,
            pool.user_staked_base,
            pool.total_staked_base,
        ),
        boosted: pro_rata(
            pool_share * pool.split.boosted,
            pool.user_staked_boosted,
            pool.total_staked_boosted,
        ),
    }
}

/// Sums the rewards over every pool.
///
/// `pools` may be in any order. A pool whose snapshot is unavailable
/// (`None`) contributes zero.
pub fn annual_reward<I>(emission: &ProtocolEmission, pools: I) -> (f64, Vec<PoolReward>)
where
    I: IntoIterator<Item = (usize, Option<PoolSnapshot>)>,
{
    let mut rewards: Vec<PoolReward> = pools
        .into_iter()
        .map(|(pool_index, snapshot)| match snapshot {
            Some(snapshot) => pool_reward(emission, &snapshot),
            None => {
                log::warn!("pool {pool_index} unavailable, counting it as zero");
                PoolReward::zero(pool_index)
            }
        })
        .collect();
    rewards.sort_by_key(|reward| reward.pool_index);

    let total = rewards.iter().map(PoolReward::total).sum();
    (total, rewards)
}
