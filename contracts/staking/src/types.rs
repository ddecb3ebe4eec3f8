use capital_shared::{EmissionConfig, LockTier, ReferrerTier, Strategy};
use soroban_sdk::{contracttype, Address, String, Vec};

// ============================================================================
// Configuration
// ============================================================================

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BridgeConfig {
    pub bridge: Address,
    pub destination_chain_id: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerConfig {
    pub admin: Address,
    pub reward_token: Address,
    pub lending_venue: Address,
    pub oracle: Address,
    pub min_rewards_distribute_period: u64,
    pub max_price_age: u64,
    pub lock_tiers: Vec<LockTier>,
    pub referrer_tiers: Vec<ReferrerTier>,
    pub paused: bool,
}

/// Everything `initialize` needs in one value, so a ledger is either fully
/// configured or not configured at all.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerSetup {
    pub admin: Address,
    pub reward_token: Address,
    pub lending_venue: Address,
    pub oracle: Address,
    pub reward_pools: Vec<EmissionConfig>,
    pub lock_tiers: Vec<LockTier>,
    pub referrer_tiers: Vec<ReferrerTier>,
    pub min_rewards_distribute_period: u64,
    pub max_price_age: u64,
}

// ============================================================================
// Reward Pools
// ============================================================================

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardPoolState {
    /// Emission is accounted for up to this time. Zero until an operator
    /// sets the starting point.
    pub last_calculated_timestamp: u64,
    pub total_emitted: i128,
    /// Reward no staker could receive, held for the admin.
    pub undistributed: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositPoolLink {
    pub reward_pool_id: u32,
    pub deposit_token: Address,
    pub price_feed_key: String,
    pub strategy: Strategy,
    pub last_recorded_principal: i128,
    pub weight: u32,
    pub min_stake: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolShare {
    pub deposit_pool_id: u32,
    pub amount: i128,
}

// ============================================================================
// Stake Ledger
// ============================================================================

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakePoolAccumulator {
    pub reward_per_share: i128, // Scaled by REWARD_PER_SHARE_SCALE
    pub total_staked: i128,
    pub total_staked_multiplied: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserStakeRecord {
    pub amount: i128,
    pub multiplied_amount: i128,
    pub lock_end: u64,
    pub locked_amount: i128,
    pub reward_debt: i128,
    pub pending_reward: i128,
    /// Total redirected from this user's accruals to their referrer.
    pub referral_reward_generated: i128,
    pub referrer: Option<Address>,
    /// Part of `amount` counted in the referrer's `total_referred_stake`.
    pub referred_amount: i128,
    pub last_stake: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReferrerRecord {
    pub total_referred_stake: i128,
    pub pending_reward: i128,
}

// Default implementations
impl Default for RewardPoolState {
    fn default() -> Self {
        Self {
            last_calculated_timestamp: 0,
            total_emitted: 0,
            undistributed: 0,
        }
    }
}

impl Default for StakePoolAccumulator {
    fn default() -> Self {
        Self {
            reward_per_share: 0,
            total_staked: 0,
            total_staked_multiplied: 0,
        }
    }
}

impl Default for UserStakeRecord {
    fn default() -> Self {
        Self {
            amount: 0,
            multiplied_amount: 0,
            lock_end: 0,
            locked_amount: 0,
            reward_debt: 0,
            pending_reward: 0,
            referral_reward_generated: 0,
            referrer: None,
            referred_amount: 0,
            last_stake: 0,
        }
    }
}

impl Default for ReferrerRecord {
    fn default() -> Self {
        Self {
            total_referred_stake: 0,
            pending_reward: 0,
        }
    }
}
