//! Per deposit pool stake accounting.
//!
//! Rewards are tracked with a reward-per-share accumulator over the
//! multiplied stake: a user's accrual since their last interaction is
//! `multiplied_amount * (reward_per_share - reward_debt) / SCALE`.

use capital_shared::{
    lock, referral, validate_positive_amount, MAX_LOCK_PERIOD, REWARD_PER_SHARE_SCALE,
};
use soroban_sdk::{log, Address, Env};

use crate::aggregator::{self, Settlement};
use crate::collaborators;
use crate::error::LedgerError;
use crate::events::{self, ClaimedEvent, StakedEvent, WithdrawnEvent};
use crate::storage;
use crate::types::{LedgerConfig, ReferrerRecord, StakePoolAccumulator, UserStakeRecord};

/// Accrual of one user since their last sync.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Accrual {
    pub user_part: i128,
    pub referrer_part: i128,
}

// ============================================================================
// Accumulator
// ============================================================================

/// Increase of `reward_per_share` when `amount` is spread over the pool.
pub(crate) fn reward_per_share_increment(
    accumulator: &StakePoolAccumulator,
    amount: i128,
) -> Result<i128, LedgerError> {
    if accumulator.total_staked_multiplied == 0 {
        return Err(LedgerError::NoStakers);
    }
    amount
        .checked_mul(REWARD_PER_SHARE_SCALE)
        .and_then(|scaled| scaled.checked_div(accumulator.total_staked_multiplied))
        .ok_or(LedgerError::ArithmeticOverflow)
}

/// Folds a reward pool allocation into the deposit pool's accumulator.
///
/// Fails with `NoStakers` when nothing is staked; the caller decides where
/// the amount goes instead.
pub(crate) fn notify_reward_added(
    env: &Env,
    deposit_pool_id: u32,
    amount: i128,
) -> Result<(), LedgerError> {
    let mut accumulator = storage::get_accumulator(env, deposit_pool_id);
    let increment = reward_per_share_increment(&accumulator, amount)?;
    accumulator.reward_per_share = accumulator
        .reward_per_share
        .checked_add(increment)
        .ok_or(LedgerError::ArithmeticOverflow)?;
    storage::set_accumulator(env, deposit_pool_id, &accumulator);
    Ok(())
}

// ============================================================================
// User Sync
// ============================================================================

/// Accrual of `record` up to `reward_per_share`, split with its referrer.
pub(crate) fn accrue(
    config: &LedgerConfig,
    record: &UserStakeRecord,
    referrer: Option<&ReferrerRecord>,
    reward_per_share: i128,
) -> Result<Accrual, LedgerError> {
    let delta = reward_per_share
        .checked_sub(record.reward_debt)
        .and_then(|diff| record.multiplied_amount.checked_mul(diff))
        .map(|product| product / REWARD_PER_SHARE_SCALE)
        .ok_or(LedgerError::ArithmeticOverflow)?;

    let share = match referrer {
        Some(referrer) => {
            referral::referral_share(&config.referrer_tiers, referrer.total_referred_stake)
        }
        None => 0,
    };
    let (user_part, referrer_part) =
        referral::split_referral(delta, share).ok_or(LedgerError::ArithmeticOverflow)?;

    Ok(Accrual {
        user_part,
        referrer_part,
    })
}

/// Brings `record` up to the pool's current `reward_per_share` and credits
/// the referrer's cut to their record.
fn sync(
    env: &Env,
    config: &LedgerConfig,
    deposit_pool_id: u32,
    record: &mut UserStakeRecord,
    reward_per_share: i128,
) -> Result<(), LedgerError> {
    let mut referrer_record = record
        .referrer
        .as_ref()
        .map(|referrer| storage::get_referrer(env, deposit_pool_id, referrer).unwrap_or_default());

    let accrual = accrue(config, record, referrer_record.as_ref(), reward_per_share)?;

    record.pending_reward = checked_add(record.pending_reward, accrual.user_part)?;
    record.reward_debt = reward_per_share;

    if let (Some(referrer), Some(referrer_record)) = (record.referrer.as_ref(), referrer_record.as_mut()) {
        if accrual.referrer_part > 0 {
            record.referral_reward_generated =
                checked_add(record.referral_reward_generated, accrual.referrer_part)?;
            referrer_record.pending_reward =
                checked_add(referrer_record.pending_reward, accrual.referrer_part)?;
            storage::set_referrer(env, deposit_pool_id, referrer, referrer_record);
        }
    }

    Ok(())
}

/// Drops the lock bonus once `lock_end` has passed. Must run after `sync` so
/// the reward earned under the bonus is kept.
fn normalize_lock(
    record: &mut UserStakeRecord,
    accumulator: &mut StakePoolAccumulator,
    now: u64,
) -> Result<(), LedgerError> {
    if record.lock_end == 0 || now < record.lock_end {
        return Ok(());
    }

    let bonus = checked_sub(record.multiplied_amount, record.amount)?;
    accumulator.total_staked_multiplied = checked_sub(accumulator.total_staked_multiplied, bonus)?;
    record.multiplied_amount = record.amount;
    record.locked_amount = 0;
    record.lock_end = 0;
    Ok(())
}

// ============================================================================
// Operations
// ============================================================================

pub(crate) fn stake(
    env: &Env,
    user: &Address,
    deposit_pool_id: u32,
    amount: i128,
    lock_duration: u64,
    referrer: Option<Address>,
) -> Result<(), LedgerError> {
    let config = storage::get_config(env)?;
    if config.paused {
        return Err(LedgerError::ContractPaused);
    }
    if !validate_positive_amount(amount) {
        return Err(LedgerError::ZeroAmount);
    }

    let mut link = storage::get_deposit_pool(env, deposit_pool_id).ok_or(LedgerError::PoolNotFound)?;
    if amount < link.min_stake {
        return Err(LedgerError::BelowMinimumStake);
    }
    let reward_pool = storage::get_reward_pool(env, link.reward_pool_id)?;
    if !reward_pool.is_public && !storage::is_allowed_staker(env, deposit_pool_id, user) {
        return Err(LedgerError::PoolNotPublic);
    }
    if lock_duration > MAX_LOCK_PERIOD {
        return Err(LedgerError::InvalidLockPeriod);
    }
    if referrer.as_ref() == Some(user) {
        return Err(LedgerError::InvalidReferrer);
    }

    aggregator::settle(env, &config, link.reward_pool_id, Settlement::Lazy)?;
    // Settlement may have moved the recorded principal.
    link = storage::load_deposit_pool(env, deposit_pool_id)?;

    let now = env.ledger().timestamp();
    let mut accumulator = storage::get_accumulator(env, deposit_pool_id);
    let mut record = storage::get_user_stake(env, deposit_pool_id, user).unwrap_or_default();

    sync(env, &config, deposit_pool_id, &mut record, accumulator.reward_per_share)?;
    normalize_lock(&mut record, &mut accumulator, now)?;

    let multiplier = lock::lock_multiplier(&config.lock_tiers, lock_duration);
    let added = lock::multiplied_amount(amount, multiplier).ok_or(LedgerError::ArithmeticOverflow)?;

    record.amount = checked_add(record.amount, amount)?;
    record.multiplied_amount = checked_add(record.multiplied_amount, added)?;
    if lock_duration > 0 {
        record.lock_end = record.lock_end.max(now + lock_duration);
        record.locked_amount = checked_add(record.locked_amount, amount)?;
    }
    record.last_stake = now;

    if record.referrer.is_none() {
        record.referrer = referrer;
    }
    if let Some(referrer) = record.referrer.as_ref() {
        let mut referrer_record =
            storage::get_referrer(env, deposit_pool_id, referrer).unwrap_or_default();
        referrer_record.total_referred_stake =
            checked_add(referrer_record.total_referred_stake, amount)?;
        storage::set_referrer(env, deposit_pool_id, referrer, &referrer_record);
        record.referred_amount = checked_add(record.referred_amount, amount)?;
    }

    accumulator.total_staked = checked_add(accumulator.total_staked, amount)?;
    accumulator.total_staked_multiplied = checked_add(accumulator.total_staked_multiplied, added)?;

    storage::set_user_stake(env, deposit_pool_id, user, &record);
    storage::set_accumulator(env, deposit_pool_id, &accumulator);
    if link.strategy.earns_yield() {
        link.last_recorded_principal = checked_add(link.last_recorded_principal, amount)?;
        storage::set_deposit_pool(env, deposit_pool_id, &link);
    }

    collaborators::transfer(
        env,
        &link.deposit_token,
        user,
        &env.current_contract_address(),
        amount,
    )?;
    if link.strategy.earns_yield() {
        collaborators::venue_deposit(env, &config.lending_venue, &link.deposit_token, amount)?;
    }

    events::publish_staked(
        env,
        StakedEvent {
            user: user.clone(),
            deposit_pool_id,
            amount,
            lock_end: record.lock_end,
            timestamp: now,
        },
    );
    log!(env, "User {} staked {} in pool {}", user, amount, deposit_pool_id);

    Ok(())
}

pub(crate) fn withdraw(
    env: &Env,
    user: &Address,
    deposit_pool_id: u32,
    amount: i128,
) -> Result<(), LedgerError> {
    let config = storage::get_config(env)?;
    if !validate_positive_amount(amount) {
        return Err(LedgerError::ZeroAmount);
    }

    let link = storage::get_deposit_pool(env, deposit_pool_id).ok_or(LedgerError::PoolNotFound)?;
    let mut record = storage::get_user_stake(env, deposit_pool_id, user).unwrap_or_default();
    if amount > record.amount {
        return Err(LedgerError::InsufficientStake);
    }

    let now = env.ledger().timestamp();
    if now < record.lock_end && amount > record.amount - record.locked_amount {
        return Err(LedgerError::LockActive);
    }

    aggregator::settle(env, &config, link.reward_pool_id, Settlement::Lazy)?;
    let mut link = storage::load_deposit_pool(env, deposit_pool_id)?;

    let mut accumulator = storage::get_accumulator(env, deposit_pool_id);
    sync(env, &config, deposit_pool_id, &mut record, accumulator.reward_per_share)?;
    normalize_lock(&mut record, &mut accumulator, now)?;

    let remaining = record.amount - amount;
    let multiplied_remaining = record
        .multiplied_amount
        .checked_mul(remaining)
        .map(|product| product / record.amount)
        .ok_or(LedgerError::ArithmeticOverflow)?;
    let multiplied_removed = record.multiplied_amount - multiplied_remaining;

    record.amount = remaining;
    record.multiplied_amount = multiplied_remaining;
    if remaining == 0 {
        record.locked_amount = 0;
        record.lock_end = 0;
    }

    accumulator.total_staked = checked_sub(accumulator.total_staked, amount)?;
    accumulator.total_staked_multiplied =
        checked_sub(accumulator.total_staked_multiplied, multiplied_removed)?;

    // Stake made before the referrer was named never counted toward them.
    let referred_removed = amount.min(record.referred_amount);
    if let Some(referrer) = record.referrer.as_ref().filter(|_| referred_removed > 0) {
        let mut referrer_record =
            storage::get_referrer(env, deposit_pool_id, referrer).unwrap_or_default();
        referrer_record.total_referred_stake =
            checked_sub(referrer_record.total_referred_stake, referred_removed)?;
        storage::set_referrer(env, deposit_pool_id, referrer, &referrer_record);
    }
    record.referred_amount -= referred_removed;

    storage::set_user_stake(env, deposit_pool_id, user, &record);
    storage::set_accumulator(env, deposit_pool_id, &accumulator);

    if link.strategy.earns_yield() {
        link.last_recorded_principal = checked_sub(link.last_recorded_principal, amount)?;
        storage::set_deposit_pool(env, deposit_pool_id, &link);
        collaborators::venue_withdraw(env, &config.lending_venue, &link.deposit_token, amount, user)?;
    } else {
        collaborators::transfer(
            env,
            &link.deposit_token,
            &env.current_contract_address(),
            user,
            amount,
        )?;
    }

    events::publish_withdrawn(
        env,
        WithdrawnEvent {
            user: user.clone(),
            deposit_pool_id,
            amount,
            timestamp: now,
        },
    );
    log!(env, "User {} withdrew {} from pool {}", user, amount, deposit_pool_id);

    Ok(())
}

/// Pays out the user's pending reward together with whatever they earned
/// as a referrer in the same pool.
pub(crate) fn claim(
    env: &Env,
    user: &Address,
    deposit_pool_id: u32,
    receiver: &Address,
) -> Result<i128, LedgerError> {
    let config = storage::get_config(env)?;
    let link = storage::get_deposit_pool(env, deposit_pool_id).ok_or(LedgerError::PoolNotFound)?;

    aggregator::settle(env, &config, link.reward_pool_id, Settlement::Lazy)?;

    let now = env.ledger().timestamp();
    let mut accumulator = storage::get_accumulator(env, deposit_pool_id);
    let mut record = storage::get_user_stake(env, deposit_pool_id, user).unwrap_or_default();
    sync(env, &config, deposit_pool_id, &mut record, accumulator.reward_per_share)?;
    normalize_lock(&mut record, &mut accumulator, now)?;

    let mut as_referrer = storage::get_referrer(env, deposit_pool_id, user);
    let referral_earnings = as_referrer.as_ref().map_or(0, |r| r.pending_reward);
    let amount = checked_add(record.pending_reward, referral_earnings)?;
    if amount == 0 {
        return Err(LedgerError::NothingToClaim);
    }

    record.pending_reward = 0;
    storage::set_user_stake(env, deposit_pool_id, user, &record);
    storage::set_accumulator(env, deposit_pool_id, &accumulator);
    if let Some(as_referrer) = as_referrer.as_mut() {
        as_referrer.pending_reward = 0;
        storage::set_referrer(env, deposit_pool_id, user, as_referrer);
    }

    collaborators::transfer(
        env,
        &config.reward_token,
        &env.current_contract_address(),
        receiver,
        amount,
    )?;

    events::publish_claimed(
        env,
        ClaimedEvent {
            user: user.clone(),
            receiver: receiver.clone(),
            deposit_pool_id,
            amount,
        },
    );
    log!(env, "User {} claimed {} from pool {}", user, amount, deposit_pool_id);

    Ok(amount)
}

/// Reward `user` would receive from `claim` for their own stake, without
/// writing anything. Honors the distribution throttle the same way the
/// lazy settlement in `claim` does.
pub(crate) fn pending_reward(
    env: &Env,
    user: &Address,
    deposit_pool_id: u32,
) -> Result<i128, LedgerError> {
    let config = storage::get_config(env)?;
    let link = storage::get_deposit_pool(env, deposit_pool_id).ok_or(LedgerError::PoolNotFound)?;
    let record = match storage::get_user_stake(env, deposit_pool_id, user) {
        Some(record) => record,
        None => return Ok(0),
    };

    let accumulator = storage::get_accumulator(env, deposit_pool_id);
    let allocation = aggregator::preview_allocation(env, &config, link.reward_pool_id, deposit_pool_id)?;
    let reward_per_share = match reward_per_share_increment(&accumulator, allocation) {
        Ok(increment) => checked_add(accumulator.reward_per_share, increment)?,
        Err(LedgerError::NoStakers) => accumulator.reward_per_share,
        Err(e) => return Err(e),
    };

    let referrer_record = record
        .referrer
        .as_ref()
        .map(|referrer| storage::get_referrer(env, deposit_pool_id, referrer).unwrap_or_default());
    let accrual = accrue(&config, &record, referrer_record.as_ref(), reward_per_share)?;

    checked_add(record.pending_reward, accrual.user_part)
}

fn checked_add(a: i128, b: i128) -> Result<i128, LedgerError> {
    a.checked_add(b).ok_or(LedgerError::ArithmeticOverflow)
}

fn checked_sub(a: i128, b: i128) -> Result<i128, LedgerError> {
    a.checked_sub(b).ok_or(LedgerError::ArithmeticOverflow)
}
