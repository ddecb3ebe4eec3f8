//! Linear interval-decrease emission curve.
//!
//! The emission rate is a step function: constant within each
//! `decrease_interval`-sized bucket after `payout_start`, dropping by
//! `reward_decrease` per bucket until it reaches zero. Totals are taken from
//! the cumulative curve, so `emitted_between` is exactly additive even where
//! partial buckets truncate.

use crate::EmissionConfig;

/// Per-interval rate in effect at `time`. Zero before `payout_start`.
pub fn rate_at(config: &EmissionConfig, time: u64) -> i128 {
    if time < config.payout_start || config.decrease_interval == 0 {
        return 0;
    }

    let bucket = i128::from((time - config.payout_start) / config.decrease_interval);
    bucket
        .checked_mul(config.reward_decrease)
        .map(|drop| config.initial_reward.saturating_sub(drop).max(0))
        .unwrap_or(0)
}

/// Total emitted from `payout_start` up to `time`.
///
/// Full buckets form an arithmetic series that stops at the first bucket
/// whose rate is zero; the bucket containing `time` contributes pro rata.
pub fn emitted_until(config: &EmissionConfig, time: u64) -> Option<i128> {
    if time <= config.payout_start || config.initial_reward <= 0 {
        return Some(0);
    }
    if config.decrease_interval == 0 {
        return None;
    }

    let interval = config.decrease_interval;
    let elapsed = time - config.payout_start;
    let full_buckets = i128::from(elapsed / interval);
    let remainder = i128::from(elapsed % interval);
    let initial = config.initial_reward;
    let decrease = config.reward_decrease;

    if decrease == 0 {
        let full = full_buckets.checked_mul(initial)?;
        let partial = initial.checked_mul(remainder)?.checked_div(i128::from(interval))?;
        return full.checked_add(partial);
    }

    // First bucket whose rate is <= 0
    let zero_bucket = (initial - 1) / decrease + 1;
    let paid_buckets = full_buckets.min(zero_bucket);

    // sum_{k=0}^{n-1} (initial - k * decrease)
    let series_drop = paid_buckets
        .checked_mul(paid_buckets - 1)?
        .checked_div(2)?
        .checked_mul(decrease)?;
    let mut total = paid_buckets.checked_mul(initial)?.checked_sub(series_drop)?;

    if full_buckets < zero_bucket {
        let current_rate = initial.checked_sub(full_buckets.checked_mul(decrease)?)?;
        let partial = current_rate
            .checked_mul(remainder)?
            .checked_div(i128::from(interval))?;
        total = total.checked_add(partial)?;
    }

    Some(total)
}

/// Reward emitted over `[from, to)`. Zero when `to <= from`.
pub fn emitted_between(config: &EmissionConfig, from: u64, to: u64) -> Option<i128> {
    if to <= from {
        return Some(0);
    }
    emitted_until(config, to)?.checked_sub(emitted_until(config, from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SECONDS_PER_DAY;

    const DAY: u64 = SECONDS_PER_DAY;

    fn reference_config() -> EmissionConfig {
        EmissionConfig {
            payout_start: 10 * DAY,
            decrease_interval: DAY,
            initial_reward: 100,
            reward_decrease: 1,
            is_public: true,
        }
    }

    #[test]
    fn test_rate_steps_down_each_interval() {
        let config = reference_config();
        assert_eq!(rate_at(&config, 9 * DAY), 0);
        assert_eq!(rate_at(&config, 10 * DAY), 100);
        assert_eq!(rate_at(&config, 11 * DAY - 1), 100);
        assert_eq!(rate_at(&config, 11 * DAY), 99);
        assert_eq!(rate_at(&config, 12 * DAY), 98);
        assert_eq!(rate_at(&config, 110 * DAY), 0);
        assert_eq!(rate_at(&config, 500 * DAY), 0);
    }

    #[test]
    fn test_nothing_before_payout_start() {
        let config = reference_config();
        assert_eq!(emitted_between(&config, 0, 10 * DAY), Some(0));
        assert_eq!(emitted_between(&config, 1, 11 * DAY), Some(100));
    }

    #[test]
    fn test_full_days() {
        let config = reference_config();
        assert_eq!(emitted_between(&config, 11 * DAY, 12 * DAY), Some(99));
        assert_eq!(emitted_between(&config, 12 * DAY, 13 * DAY), Some(98));
        assert_eq!(emitted_between(&config, 10 * DAY, 13 * DAY), Some(100 + 99 + 98));
    }

    #[test]
    fn test_partial_bucket_is_pro_rata() {
        let config = EmissionConfig {
            initial_reward: 100_0000000,
            reward_decrease: 1_0000000,
            ..reference_config()
        };
        let half_day = DAY / 2;
        assert_eq!(
            emitted_between(&config, 10 * DAY, 10 * DAY + half_day),
            Some(50_0000000)
        );
        assert_eq!(
            emitted_between(&config, 10 * DAY + half_day, 11 * DAY + half_day),
            Some(50_0000000 + 49_5000000)
        );
    }

    #[test]
    fn test_total_emission_is_bounded() {
        let config = reference_config();
        // 100 + 99 + ... + 1
        let lifetime = 5050;
        assert_eq!(emitted_until(&config, 110 * DAY), Some(lifetime));
        assert_eq!(emitted_until(&config, 10_000 * DAY), Some(lifetime));
        assert_eq!(emitted_between(&config, 200 * DAY, 300 * DAY), Some(0));
    }

    #[test]
    fn test_decrease_not_dividing_initial() {
        let config = EmissionConfig {
            initial_reward: 10,
            reward_decrease: 4,
            ..reference_config()
        };
        // 10, 6, 2, then clamped to zero
        assert_eq!(emitted_until(&config, 20 * DAY), Some(18));
    }

    #[test]
    fn test_constant_rate_without_decrease() {
        let config = EmissionConfig {
            reward_decrease: 0,
            ..reference_config()
        };
        assert_eq!(emitted_between(&config, 10 * DAY, 20 * DAY), Some(1000));
        assert_eq!(emitted_between(&config, 10 * DAY, 10 * DAY + DAY / 4), Some(25));
    }

    #[test]
    fn test_additivity_across_split_points() {
        let config = EmissionConfig {
            initial_reward: 7_777_777,
            reward_decrease: 33_333,
            decrease_interval: 3 * 3600 + 17,
            ..reference_config()
        };
        let from = 9 * DAY + 1234;
        let to = 40 * DAY + 999;
        let whole = emitted_between(&config, from, to).unwrap();

        let mut t1 = from;
        while t1 <= to {
            let left = emitted_between(&config, from, t1).unwrap();
            let right = emitted_between(&config, t1, to).unwrap();
            assert_eq!(left + right, whole);
            t1 += 7919;
        }
    }

    #[test]
    fn test_monotone_non_negative() {
        let config = EmissionConfig {
            initial_reward: 1_000_003,
            reward_decrease: 9_999,
            decrease_interval: 5_000,
            ..reference_config()
        };
        let from = 10 * DAY - 100;
        let mut previous = 0;
        let mut to = from;
        while to < from + 200 * 5_000 {
            let value = emitted_between(&config, from, to).unwrap();
            assert!(value >= 0);
            assert!(value >= previous);
            previous = value;
            to += 1_237;
        }
    }

    #[test]
    fn test_reversed_interval_is_zero() {
        let config = reference_config();
        assert_eq!(emitted_between(&config, 13 * DAY, 12 * DAY), Some(0));
    }
}
