//! Lock-duration reward multipliers.

use soroban_sdk::Vec;

use crate::{apply_basis_points, LockTier, BASE_MULTIPLIER, MAX_LOCK_MULTIPLIER};

/// Multiplier (basis points) earned by locking for `lock_duration` seconds.
///
/// An unlocked stake always gets `BASE_MULTIPLIER`. Otherwise the last tier
/// whose `min_lock_period` is reached applies; with validated tiers this is
/// non-decreasing in `lock_duration` and capped by the final tier.
pub fn lock_multiplier(tiers: &Vec<LockTier>, lock_duration: u64) -> i128 {
    if lock_duration == 0 {
        return BASE_MULTIPLIER;
    }

    let mut multiplier = BASE_MULTIPLIER;
    for tier in tiers.iter() {
        if lock_duration < tier.min_lock_period {
            break;
        }
        multiplier = tier.multiplier;
    }
    multiplier
}

/// Stake weight after applying `multiplier`, truncated.
pub fn multiplied_amount(amount: i128, multiplier: i128) -> Option<i128> {
    apply_basis_points(amount, multiplier)
}

/// Tiers must have strictly increasing periods and non-decreasing
/// multipliers inside `[BASE_MULTIPLIER, MAX_LOCK_MULTIPLIER]`.
pub fn validate_lock_tiers(tiers: &Vec<LockTier>) -> bool {
    let mut last_period = 0u64;
    let mut last_multiplier = BASE_MULTIPLIER;

    for tier in tiers.iter() {
        if tier.min_lock_period <= last_period {
            return false;
        }
        if tier.multiplier < last_multiplier || tier.multiplier > MAX_LOCK_MULTIPLIER {
            return false;
        }
        last_period = tier.min_lock_period;
        last_multiplier = tier.multiplier;
    }
    true
}
