//! Referrer reward tiers.

use soroban_sdk::Vec;

use crate::{apply_basis_points, validate_basis_points, ReferrerTier};

/// Share (basis points) of a referred user's accrual owed to a referrer who
/// has brought in `total_referred_stake`.
///
/// Zero below the lowest threshold. Above the highest threshold the highest
/// tier's share applies.
pub fn referral_share(tiers: &Vec<ReferrerTier>, total_referred_stake: i128) -> i128 {
    let mut share = 0;
    for tier in tiers.iter() {
        if total_referred_stake < tier.min_referred_stake {
            break;
        }
        share = tier.share;
    }
    share
}

/// Splits `delta` into `(user_part, referrer_part)`. Both parts come from the
/// same `delta`, so together they never exceed it.
pub fn split_referral(delta: i128, share: i128) -> Option<(i128, i128)> {
    if delta <= 0 || share <= 0 {
        return Some((delta, 0));
    }
    let referrer_part = apply_basis_points(delta, share)?;
    Some((delta.checked_sub(referrer_part)?, referrer_part))
}

/// Thresholds must be strictly increasing with non-decreasing shares, each
/// within 0-100%.
pub fn validate_referrer_tiers(tiers: &Vec<ReferrerTier>) -> bool {
    let mut previous: Option<ReferrerTier> = None;

    for tier in tiers.iter() {
        if tier.min_referred_stake < 0 || !validate_basis_points(tier.share) {
            return false;
        }
        if let Some(prev) = &previous {
            if tier.min_referred_stake <= prev.min_referred_stake || tier.share < prev.share {
                return false;
            }
        }
        previous = Some(tier);
    }
    true
}
