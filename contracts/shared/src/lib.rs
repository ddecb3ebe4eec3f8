//! Types, constants and pure math shared by the Capital contracts.
//! Nothing in this crate touches contract storage, so every helper can be
//! tested without registering a contract.
#![no_std]
use soroban_sdk::contracttype;

pub mod emission;
pub mod interfaces;
pub mod lock;
pub mod referral;

// ============================================================================
// Reward Pool Types
// ============================================================================

/// Emission schedule of a reward pool.
///
/// `initial_reward` is the amount emitted over one full `decrease_interval`
/// starting at `payout_start`; every following interval emits
/// `reward_decrease` less, down to zero.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmissionConfig {
    pub payout_start: u64,
    pub decrease_interval: u64,
    pub initial_reward: i128,
    pub reward_decrease: i128,
    pub is_public: bool,
}

impl EmissionConfig {
    pub fn is_valid(&self) -> bool {
        self.decrease_interval > 0 && self.initial_reward >= 0 && self.reward_decrease >= 0
    }
}

/// How a deposit pool's principal is held.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy {
    /// Principal stays on the ledger and earns nothing.
    Direct,
    /// Private pool principal, never deployed to the lending venue.
    NoYield,
    /// Principal is deposited into the lending venue.
    ExternalYield,
}

impl Strategy {
    pub fn earns_yield(&self) -> bool {
        matches!(self, Strategy::ExternalYield)
    }
}

// ============================================================================
// Multiplier & Referral Tiers
// ============================================================================

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LockTier {
    pub min_lock_period: u64,
    pub multiplier: i128, // Basis points (10000 = 1x)
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReferrerTier {
    pub min_referred_stake: i128,
    pub share: i128, // Basis points of the referred user's accrual
}

// ============================================================================
// Collaborator Types
// ============================================================================

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceData {
    pub price: i128,
    pub decimals: u32,
    pub updated_at: u64,
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: i128) -> bool {
    amount > 0
}

/// Validate that a share is within valid range (0-100%)
pub fn validate_basis_points(value: i128) -> bool {
    (0..=MAX_BASIS_POINTS).contains(&value)
}

/// `amount * bps / 10000`, truncated. `None` on overflow.
pub fn apply_basis_points(amount: i128, bps: i128) -> Option<i128> {
    amount.checked_mul(bps)?.checked_div(MAX_BASIS_POINTS)
}

// ============================================================================
// Constants
// ============================================================================

/// Basis points representing 100% (10000 basis points = 100%)
pub const MAX_BASIS_POINTS: i128 = 10000;

/// Multiplier of an unlocked stake (1x)
pub const BASE_MULTIPLIER: i128 = MAX_BASIS_POINTS;

/// Upper bound for any configured lock multiplier (10x)
pub const MAX_LOCK_MULTIPLIER: i128 = 10 * BASE_MULTIPLIER;

/// Seconds in a day
pub const SECONDS_PER_DAY: u64 = 86400;

/// Seconds in a year (365 days)
pub const SECONDS_PER_YEAR: u64 = 365 * SECONDS_PER_DAY;

/// Maximum lock duration accepted by a stake (5 years)
pub const MAX_LOCK_PERIOD: u64 = 5 * SECONDS_PER_YEAR;

/// Fixed-point scale of the reward-per-share accumulator
pub const REWARD_PER_SHARE_SCALE: i128 = 1_000_000_000_000_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emission_config_validity() {
        let mut config = EmissionConfig {
            payout_start: 10 * SECONDS_PER_DAY,
            decrease_interval: SECONDS_PER_DAY,
            initial_reward: 100,
            reward_decrease: 1,
            is_public: true,
        };
        assert!(config.is_valid());

        config.decrease_interval = 0;
        assert!(!config.is_valid());

        config.decrease_interval = SECONDS_PER_DAY;
        config.reward_decrease = -1;
        assert!(!config.is_valid());
    }

    #[test]
    fn test_apply_basis_points() {
        assert_eq!(apply_basis_points(1_000, 2_500), Some(250));
        assert_eq!(apply_basis_points(999, 5_000), Some(499));
        assert_eq!(apply_basis_points(i128::MAX, 2), None);
    }

    #[test]
    fn test_strategy_yield_flag() {
        assert!(Strategy::ExternalYield.earns_yield());
        assert!(!Strategy::Direct.earns_yield());
        assert!(!Strategy::NoYield.earns_yield());
    }
}
