//! Reward pool distribution.
//!
//! A distribution allocates everything a reward pool produced since its last
//! run (emission plus lending venue yield of its linked deposit pools) to
//! those deposit pools by allocation weight. Whatever cannot be credited to
//! a staker is parked in `RewardPoolState::undistributed`.

use capital_shared::{emission, Strategy};
use soroban_sdk::{log, Address, Env, String, Vec};

use crate::collaborators;
use crate::error::LedgerError;
use crate::events::{self, DistributedEvent};
use crate::ledger;
use crate::storage;
use crate::types::{DepositPoolLink, LedgerConfig, PoolShare, RewardPoolState};

/// How a settlement reacts to an uninitialized pool or an active throttle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Settlement {
    /// Public `distribute`: every condition is an error.
    Strict,
    /// Before a user operation: the throttle skips distribution quietly.
    Lazy,
    /// Before an admin reconfiguration: ignores the throttle and does
    /// nothing for a pool that has not started.
    Forced,
}

/// Outcome of a distribution before anything is written.
struct Distribution {
    emitted: i128,
    yield_amount: i128,
    shares: Vec<PoolShare>,
    dust: i128,
    /// Venue balances observed for yield-bearing pools.
    principals: Vec<PoolShare>,
}

// ============================================================================
// Settlement
// ============================================================================

/// Whether a distribution should run now. `Ok(None)` means skip silently.
fn due_state(
    env: &Env,
    config: &LedgerConfig,
    reward_pool_id: u32,
    mode: Settlement,
) -> Result<Option<RewardPoolState>, LedgerError> {
    storage::get_reward_pool(env, reward_pool_id)?;
    let state = storage::get_reward_pool_state(env, reward_pool_id);

    if state.last_calculated_timestamp == 0 {
        return match mode {
            Settlement::Forced => Ok(None),
            _ => Err(LedgerError::NotInitialized),
        };
    }

    let now = env.ledger().timestamp();
    let elapsed = now.saturating_sub(state.last_calculated_timestamp);
    if elapsed < config.min_rewards_distribute_period {
        return match mode {
            Settlement::Strict => Err(LedgerError::ThrottleActive),
            Settlement::Lazy => Ok(None),
            Settlement::Forced => Ok(Some(state)),
        };
    }

    Ok(Some(state))
}

pub(crate) fn settle(
    env: &Env,
    config: &LedgerConfig,
    reward_pool_id: u32,
    mode: Settlement,
) -> Result<(), LedgerError> {
    let mut state = match due_state(env, config, reward_pool_id, mode)? {
        Some(state) => state,
        None => return Ok(()),
    };

    let now = env.ledger().timestamp();
    let distribution = compute(env, config, reward_pool_id, &state, now)?;

    for principal in distribution.principals.iter() {
        let mut link = storage::load_deposit_pool(env, principal.deposit_pool_id)?;
        link.last_recorded_principal = principal.amount;
        storage::set_deposit_pool(env, principal.deposit_pool_id, &link);
    }

    let mut carried = distribution.dust;
    for share in distribution.shares.iter() {
        if share.amount == 0 {
            continue;
        }
        match ledger::notify_reward_added(env, share.deposit_pool_id, share.amount) {
            Ok(()) => {}
            Err(LedgerError::NoStakers) => {
                events::publish_carried(env, share.deposit_pool_id, share.amount);
                carried = carried
                    .checked_add(share.amount)
                    .ok_or(LedgerError::ArithmeticOverflow)?;
            }
            Err(e) => return Err(e),
        }
    }

    state.last_calculated_timestamp = now.max(state.last_calculated_timestamp);
    state.total_emitted = state
        .total_emitted
        .checked_add(distribution.emitted)
        .ok_or(LedgerError::ArithmeticOverflow)?;
    state.undistributed = state
        .undistributed
        .checked_add(carried)
        .ok_or(LedgerError::ArithmeticOverflow)?;
    storage::set_reward_pool_state(env, reward_pool_id, &state);

    events::publish_distributed(
        env,
        DistributedEvent {
            reward_pool_id,
            emitted: distribution.emitted,
            yield_amount: distribution.yield_amount,
            undistributed: carried,
            timestamp: now,
        },
    );
    log!(
        env,
        "Reward pool {} distributed: emitted={}, yield={}, carried={}",
        reward_pool_id,
        distribution.emitted,
        distribution.yield_amount,
        carried
    );

    Ok(())
}

fn compute(
    env: &Env,
    config: &LedgerConfig,
    reward_pool_id: u32,
    state: &RewardPoolState,
    now: u64,
) -> Result<Distribution, LedgerError> {
    let emission_config = storage::get_reward_pool(env, reward_pool_id)?;
    let emitted = emission::emitted_between(&emission_config, state.last_calculated_timestamp, now)
        .ok_or(LedgerError::ArithmeticOverflow)?;

    let mut links: Vec<(u32, DepositPoolLink)> = Vec::new(env);
    let mut principals = Vec::new(env);
    let mut yield_amount: i128 = 0;
    let mut weight_sum: i128 = 0;

    for deposit_pool_id in storage::get_linked_pools(env, reward_pool_id).iter() {
        let link = storage::load_deposit_pool(env, deposit_pool_id)?;
        if link.strategy.earns_yield() {
            let balance =
                collaborators::venue_balance(env, &config.lending_venue, &link.deposit_token)?;
            let delta = (balance - link.last_recorded_principal).max(0);
            yield_amount = yield_amount
                .checked_add(delta)
                .ok_or(LedgerError::ArithmeticOverflow)?;
            principals.push_back(PoolShare {
                deposit_pool_id,
                amount: balance,
            });
        }
        weight_sum += i128::from(link.weight);
        links.push_back((deposit_pool_id, link));
    }

    let total = emitted
        .checked_add(yield_amount)
        .ok_or(LedgerError::ArithmeticOverflow)?;

    let mut shares = Vec::new(env);
    let mut allocated: i128 = 0;
    if weight_sum > 0 {
        for (deposit_pool_id, link) in links.iter() {
            let amount = total
                .checked_mul(i128::from(link.weight))
                .map(|product| product / weight_sum)
                .ok_or(LedgerError::ArithmeticOverflow)?;
            allocated += amount;
            shares.push_back(PoolShare {
                deposit_pool_id,
                amount,
            });
        }
    }

    Ok(Distribution {
        emitted,
        yield_amount,
        shares,
        dust: total - allocated,
        principals,
    })
}

/// Amount the next lazy settlement would hand to `deposit_pool_id`, read
/// without writing anything.
pub(crate) fn preview_allocation(
    env: &Env,
    config: &LedgerConfig,
    reward_pool_id: u32,
    deposit_pool_id: u32,
) -> Result<i128, LedgerError> {
    let state = match due_state(env, config, reward_pool_id, Settlement::Lazy) {
        Ok(Some(state)) => state,
        Ok(None) | Err(LedgerError::NotInitialized) => return Ok(0),
        Err(e) => return Err(e),
    };

    let distribution = compute(env, config, reward_pool_id, &state, env.ledger().timestamp())?;
    Ok(distribution
        .shares
        .iter()
        .find(|share| share.deposit_pool_id == deposit_pool_id)
        .map_or(0, |share| share.amount))
}

// ============================================================================
// Deposit Pool Links
// ============================================================================

pub(crate) fn add_deposit_pool(
    env: &Env,
    config: &LedgerConfig,
    reward_pool_id: u32,
    deposit_pool_id: u32,
    deposit_token: Address,
    price_feed_key: String,
    strategy: Strategy,
) -> Result<(), LedgerError> {
    if storage::get_deposit_pool(env, deposit_pool_id).is_some() {
        return Err(LedgerError::AlreadyLinked);
    }
    storage::get_reward_pool(env, reward_pool_id)?;
    collaborators::fresh_price(env, config, &price_feed_key)?;

    settle(env, config, reward_pool_id, Settlement::Forced)?;

    let mut last_recorded_principal = 0;
    if strategy.earns_yield() {
        if storage::venue_asset_owner(env, &deposit_token).is_some() {
            return Err(LedgerError::InvalidConfiguration);
        }
        last_recorded_principal =
            collaborators::venue_balance(env, &config.lending_venue, &deposit_token)?;
        storage::set_venue_asset_owner(env, &deposit_token, Some(deposit_pool_id));
    }

    let link = DepositPoolLink {
        reward_pool_id,
        deposit_token,
        price_feed_key,
        strategy,
        last_recorded_principal,
        weight: 1,
        min_stake: 0,
    };
    storage::set_deposit_pool(env, deposit_pool_id, &link);

    let mut linked = storage::get_linked_pools(env, reward_pool_id);
    linked.push_back(deposit_pool_id);
    storage::set_linked_pools(env, reward_pool_id, &linked);

    events::publish_linked(env, reward_pool_id, deposit_pool_id, strategy);
    log!(
        env,
        "Deposit pool {} linked to reward pool {}",
        deposit_pool_id,
        reward_pool_id
    );

    Ok(())
}

/// Changes where a deposit pool's principal lives.
///
/// Emission and yield up to now are allocated under the old strategy first.
/// Afterwards the recorded principal is re-snapshotted so yield earned before
/// the move is never counted again. Leaving the venue bridges the surplus, so
/// the reward pool must already be distributing.
pub(crate) fn migrate(
    env: &Env,
    config: &LedgerConfig,
    deposit_pool_id: u32,
    strategy: Strategy,
) -> Result<(), LedgerError> {
    let link = storage::load_deposit_pool(env, deposit_pool_id)?;
    let from = link.strategy;
    if from == strategy || (from == Strategy::NoYield && strategy.earns_yield()) {
        return Err(LedgerError::InvalidConfiguration);
    }
    if strategy.earns_yield() && storage::venue_asset_owner(env, &link.deposit_token).is_some() {
        return Err(LedgerError::InvalidConfiguration);
    }
    if from.earns_yield() {
        require_started(env, link.reward_pool_id)?;
    }

    settle(env, config, link.reward_pool_id, Settlement::Forced)?;

    let mut link = storage::load_deposit_pool(env, deposit_pool_id)?;
    let principal = storage::get_accumulator(env, deposit_pool_id).total_staked;
    let venue = &config.lending_venue;
    let ledger_address = env.current_contract_address();

    link.strategy = strategy;
    if strategy.earns_yield() {
        link.last_recorded_principal = 0;
        storage::set_deposit_pool(env, deposit_pool_id, &link);
        storage::set_venue_asset_owner(env, &link.deposit_token, Some(deposit_pool_id));

        if principal > 0 {
            collaborators::venue_deposit(env, venue, &link.deposit_token, principal)?;
        }
        link.last_recorded_principal =
            collaborators::venue_balance(env, venue, &link.deposit_token)?;
        storage::set_deposit_pool(env, deposit_pool_id, &link);
    } else if from.earns_yield() {
        let balance = collaborators::venue_balance(env, venue, &link.deposit_token)?;
        let surplus = (balance - principal).max(0);

        link.last_recorded_principal = 0;
        storage::set_deposit_pool(env, deposit_pool_id, &link);
        storage::set_venue_asset_owner(env, &link.deposit_token, None);

        if surplus > 0 {
            let chain_id = send_yield(env, config, &link.deposit_token, surplus)?;
            events::publish_yield_withdrawn(env, deposit_pool_id, surplus, chain_id);
        }
        if principal > 0 {
            collaborators::venue_withdraw(env, venue, &link.deposit_token, principal, &ledger_address)?;
        }
    } else {
        storage::set_deposit_pool(env, deposit_pool_id, &link);
    }

    events::publish_migrated(env, deposit_pool_id, from, strategy);
    log!(env, "Deposit pool {} migrated, principal {}", deposit_pool_id, principal);

    Ok(())
}

// ============================================================================
// Yield & Carried Rewards
// ============================================================================

/// Sends the venue surplus above staked principal across the bridge. The
/// surplus has already been allocated as reward by earlier distributions,
/// which is why a reward pool that has not started is rejected.
pub(crate) fn withdraw_yield(
    env: &Env,
    config: &LedgerConfig,
    deposit_pool_id: u32,
) -> Result<i128, LedgerError> {
    let link = storage::load_deposit_pool(env, deposit_pool_id)?;
    if storage::get_bridge(env).is_none() || !link.strategy.earns_yield() {
        return Err(LedgerError::InvalidConfiguration);
    }
    require_started(env, link.reward_pool_id)?;

    settle(env, config, link.reward_pool_id, Settlement::Forced)?;

    let mut link = storage::load_deposit_pool(env, deposit_pool_id)?;
    let principal = storage::get_accumulator(env, deposit_pool_id).total_staked;
    let balance = collaborators::venue_balance(env, &config.lending_venue, &link.deposit_token)?;
    let surplus = balance - principal;
    if surplus <= 0 {
        return Err(LedgerError::NothingToWithdraw);
    }

    link.last_recorded_principal = principal;
    storage::set_deposit_pool(env, deposit_pool_id, &link);

    let chain_id = send_yield(env, config, &link.deposit_token, surplus)?;

    events::publish_yield_withdrawn(env, deposit_pool_id, surplus, chain_id);
    log!(env, "Yield {} of deposit pool {} bridged", surplus, deposit_pool_id);

    Ok(surplus)
}

/// Returns the destination chain the yield was sent to.
fn send_yield(
    env: &Env,
    config: &LedgerConfig,
    asset: &Address,
    amount: i128,
) -> Result<u32, LedgerError> {
    let bridge = storage::get_bridge(env).ok_or(LedgerError::InvalidConfiguration)?;
    collaborators::venue_withdraw(env, &config.lending_venue, asset, amount, &bridge.bridge)?;
    collaborators::bridge_send(env, &bridge, asset, amount)?;
    Ok(bridge.destination_chain_id)
}

fn require_started(env: &Env, reward_pool_id: u32) -> Result<(), LedgerError> {
    if storage::get_reward_pool_state(env, reward_pool_id).last_calculated_timestamp == 0 {
        return Err(LedgerError::NotInitialized);
    }
    Ok(())
}

pub(crate) fn withdraw_undistributed(
    env: &Env,
    config: &LedgerConfig,
    reward_pool_id: u32,
    to: &Address,
) -> Result<i128, LedgerError> {
    storage::get_reward_pool(env, reward_pool_id)?;
    let mut state = storage::get_reward_pool_state(env, reward_pool_id);
    let amount = state.undistributed;
    if amount <= 0 {
        return Err(LedgerError::NothingToWithdraw);
    }

    state.undistributed = 0;
    storage::set_reward_pool_state(env, reward_pool_id, &state);

    collaborators::transfer(
        env,
        &config.reward_token,
        &env.current_contract_address(),
        to,
        amount,
    )?;

    events::publish_undistributed_withdrawn(env, reward_pool_id, to.clone(), amount);
    log!(env, "Undistributed {} of reward pool {} withdrawn", amount, reward_pool_id);

    Ok(amount)
}
