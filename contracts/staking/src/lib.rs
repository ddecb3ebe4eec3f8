#![no_std]
use capital_shared::{
    emission, lock, referral, validate_positive_amount, EmissionConfig, LockTier, ReferrerTier,
    Strategy,
};
use soroban_sdk::{contract, contractimpl, log, symbol_short, Address, Env, String, Vec};

mod aggregator;
mod collaborators;
mod error;
mod events;
mod ledger;
mod storage;
mod types;

pub use error::LedgerError;
pub use types::{
    BridgeConfig, DepositPoolLink, LedgerConfig, LedgerSetup, PoolShare, ReferrerRecord,
    RewardPoolState, StakePoolAccumulator, UserStakeRecord,
};

use aggregator::Settlement;

#[contract]
pub struct LedgerContract;

#[contractimpl]
impl LedgerContract {
    /// Initialize the ledger with its collaborators and first reward pools
    pub fn initialize(env: Env, setup: LedgerSetup) -> Result<(), LedgerError> {
        if storage::has_config(&env) {
            return Err(LedgerError::AlreadyInitialized);
        }

        if setup.max_price_age == 0
            || !lock::validate_lock_tiers(&setup.lock_tiers)
            || !referral::validate_referrer_tiers(&setup.referrer_tiers)
            || setup.reward_pools.iter().any(|pool| !pool.is_valid())
        {
            return Err(LedgerError::InvalidConfiguration);
        }

        setup.admin.require_auth();

        for pool in setup.reward_pools.iter() {
            storage::push_reward_pool(&env, &pool);
        }

        let config = LedgerConfig {
            admin: setup.admin.clone(),
            reward_token: setup.reward_token,
            lending_venue: setup.lending_venue,
            oracle: setup.oracle,
            min_rewards_distribute_period: setup.min_rewards_distribute_period,
            max_price_age: setup.max_price_age,
            lock_tiers: setup.lock_tiers,
            referrer_tiers: setup.referrer_tiers,
            paused: false,
        };
        storage::set_config(&env, &config);
        storage::extend_instance(&env);

        events::publish_initialized(&env, setup.admin.clone(), setup.reward_pools.len());
        log!(&env, "Ledger initialized by admin: {}", setup.admin);

        Ok(())
    }

    // ========================================================================
    // Stake Ledger
    // ========================================================================

    /// Stake `amount` of the deposit pool's token, optionally locked for
    /// `lock_duration` seconds. The first referrer given is kept for good.
    pub fn stake(
        env: Env,
        user: Address,
        deposit_pool_id: u32,
        amount: i128,
        lock_duration: u64,
        referrer: Option<Address>,
    ) -> Result<(), LedgerError> {
        user.require_auth();
        storage::extend_instance(&env);
        ledger::stake(&env, &user, deposit_pool_id, amount, lock_duration, referrer)
    }

    /// Withdraw staked principal. Locked principal stays until the lock ends.
    pub fn withdraw(
        env: Env,
        user: Address,
        deposit_pool_id: u32,
        amount: i128,
    ) -> Result<(), LedgerError> {
        user.require_auth();
        storage::extend_instance(&env);
        ledger::withdraw(&env, &user, deposit_pool_id, amount)
    }

    /// Pay accrued rewards (own and as a referrer) to `receiver`
    pub fn claim(
        env: Env,
        user: Address,
        deposit_pool_id: u32,
        receiver: Address,
    ) -> Result<i128, LedgerError> {
        user.require_auth();
        storage::extend_instance(&env);
        ledger::claim(&env, &user, deposit_pool_id, &receiver)
    }

    // ========================================================================
    // Distribution
    // ========================================================================

    /// Allocate everything the reward pool produced since its last run
    pub fn distribute(env: Env, reward_pool_id: u32) -> Result<(), LedgerError> {
        let config = storage::get_config(&env)?;
        storage::extend_instance(&env);
        aggregator::settle(&env, &config, reward_pool_id, Settlement::Strict)
    }

    pub fn add_reward_pool(
        env: Env,
        admin: Address,
        config: EmissionConfig,
    ) -> Result<u32, LedgerError> {
        Self::require_admin(&env, &admin)?;
        if !config.is_valid() {
            return Err(LedgerError::InvalidConfiguration);
        }

        let id = storage::push_reward_pool(&env, &config);
        events::publish_config(&env, symbol_short!("rpool"));
        log!(&env, "Reward pool {} added", id);

        Ok(id)
    }

    /// Replace a reward pool's schedule. Emission up to now is settled under
    /// the old schedule.
    pub fn update_reward_pool(
        env: Env,
        admin: Address,
        reward_pool_id: u32,
        config: EmissionConfig,
    ) -> Result<(), LedgerError> {
        let ledger_config = Self::require_admin(&env, &admin)?;
        if !config.is_valid() {
            return Err(LedgerError::InvalidConfiguration);
        }
        storage::get_reward_pool(&env, reward_pool_id)?;

        aggregator::settle(&env, &ledger_config, reward_pool_id, Settlement::Forced)?;
        storage::set_reward_pool(&env, reward_pool_id, &config);

        events::publish_config(&env, symbol_short!("rpool"));
        log!(&env, "Reward pool {} updated", reward_pool_id);

        Ok(())
    }

    /// Set the point emission is counted from. Can only be done once.
    pub fn set_last_calculated_timestamp(
        env: Env,
        admin: Address,
        reward_pool_id: u32,
        timestamp: u64,
    ) -> Result<(), LedgerError> {
        Self::require_admin(&env, &admin)?;
        storage::get_reward_pool(&env, reward_pool_id)?;

        let mut state = storage::get_reward_pool_state(&env, reward_pool_id);
        if state.last_calculated_timestamp != 0 {
            return Err(LedgerError::AlreadyInitialized);
        }
        if timestamp == 0 || timestamp > env.ledger().timestamp() {
            return Err(LedgerError::InvalidConfiguration);
        }

        state.last_calculated_timestamp = timestamp;
        storage::set_reward_pool_state(&env, reward_pool_id, &state);

        events::publish_config(&env, symbol_short!("start"));
        log!(&env, "Reward pool {} starts at {}", reward_pool_id, timestamp);

        Ok(())
    }

    pub fn set_min_distribute_period(
        env: Env,
        admin: Address,
        period: u64,
    ) -> Result<(), LedgerError> {
        let mut config = Self::require_admin(&env, &admin)?;

        config.min_rewards_distribute_period = period;
        storage::set_config(&env, &config);

        events::publish_config(&env, symbol_short!("throttle"));
        log!(&env, "Minimum distribute period set to: {}", period);

        Ok(())
    }

    // ========================================================================
    // Deposit Pools
    // ========================================================================

    /// Link a new deposit pool to a reward pool
    pub fn add_deposit_pool(
        env: Env,
        admin: Address,
        reward_pool_id: u32,
        deposit_pool_id: u32,
        deposit_token: Address,
        price_feed_key: String,
        strategy: Strategy,
    ) -> Result<(), LedgerError> {
        let config = Self::require_admin(&env, &admin)?;
        aggregator::add_deposit_pool(
            &env,
            &config,
            reward_pool_id,
            deposit_pool_id,
            deposit_token,
            price_feed_key,
            strategy,
        )
    }

    /// Move a deposit pool to another strategy
    pub fn migrate(
        env: Env,
        admin: Address,
        deposit_pool_id: u32,
        strategy: Strategy,
    ) -> Result<(), LedgerError> {
        let config = Self::require_admin(&env, &admin)?;
        aggregator::migrate(&env, &config, deposit_pool_id, strategy)
    }

    pub fn set_allocation_weight(
        env: Env,
        admin: Address,
        deposit_pool_id: u32,
        weight: u32,
    ) -> Result<(), LedgerError> {
        let config = Self::require_admin(&env, &admin)?;
        let link = storage::load_deposit_pool(&env, deposit_pool_id)?;

        aggregator::settle(&env, &config, link.reward_pool_id, Settlement::Forced)?;

        let mut link = storage::load_deposit_pool(&env, deposit_pool_id)?;
        link.weight = weight;
        storage::set_deposit_pool(&env, deposit_pool_id, &link);

        events::publish_config(&env, symbol_short!("weight"));
        log!(&env, "Deposit pool {} weight set to: {}", deposit_pool_id, weight);

        Ok(())
    }

    pub fn set_pool_min_stake(
        env: Env,
        admin: Address,
        deposit_pool_id: u32,
        min_stake: i128,
    ) -> Result<(), LedgerError> {
        Self::require_admin(&env, &admin)?;
        if min_stake < 0 {
            return Err(LedgerError::InvalidConfiguration);
        }

        let mut link = storage::load_deposit_pool(&env, deposit_pool_id)?;
        link.min_stake = min_stake;
        storage::set_deposit_pool(&env, deposit_pool_id, &link);

        events::publish_config(&env, symbol_short!("minstake"));
        log!(&env, "Deposit pool {} minimum stake set to: {}", deposit_pool_id, min_stake);

        Ok(())
    }

    /// Allow or disallow `user` to stake into a pool of a private reward pool
    pub fn set_allowed_staker(
        env: Env,
        admin: Address,
        deposit_pool_id: u32,
        user: Address,
        allowed: bool,
    ) -> Result<(), LedgerError> {
        Self::require_admin(&env, &admin)?;
        storage::load_deposit_pool(&env, deposit_pool_id)?;

        storage::set_allowed_staker(&env, deposit_pool_id, &user, allowed);

        events::publish_config(&env, symbol_short!("allowed"));
        log!(&env, "Staker {} allowed in pool {}: {}", user, deposit_pool_id, allowed);

        Ok(())
    }

    // ========================================================================
    // Admin Settings
    // ========================================================================

    pub fn set_lock_tiers(
        env: Env,
        admin: Address,
        lock_tiers: Vec<LockTier>,
    ) -> Result<(), LedgerError> {
        let mut config = Self::require_admin(&env, &admin)?;
        if !lock::validate_lock_tiers(&lock_tiers) {
            return Err(LedgerError::InvalidConfiguration);
        }

        config.lock_tiers = lock_tiers;
        storage::set_config(&env, &config);

        events::publish_config(&env, symbol_short!("locks"));
        log!(&env, "Lock tiers updated");

        Ok(())
    }

    pub fn set_referrer_tiers(
        env: Env,
        admin: Address,
        referrer_tiers: Vec<ReferrerTier>,
    ) -> Result<(), LedgerError> {
        let mut config = Self::require_admin(&env, &admin)?;
        if !referral::validate_referrer_tiers(&referrer_tiers) {
            return Err(LedgerError::InvalidConfiguration);
        }

        config.referrer_tiers = referrer_tiers;
        storage::set_config(&env, &config);

        events::publish_config(&env, symbol_short!("referral"));
        log!(&env, "Referrer tiers updated");

        Ok(())
    }

    pub fn set_bridge(env: Env, admin: Address, bridge: BridgeConfig) -> Result<(), LedgerError> {
        Self::require_admin(&env, &admin)?;

        log!(&env, "Bridge set to: {}", bridge.bridge);
        storage::set_bridge(&env, &bridge);

        events::publish_config(&env, symbol_short!("bridge"));

        Ok(())
    }

    pub fn set_max_price_age(env: Env, admin: Address, max_age: u64) -> Result<(), LedgerError> {
        let mut config = Self::require_admin(&env, &admin)?;
        if max_age == 0 {
            return Err(LedgerError::InvalidConfiguration);
        }

        config.max_price_age = max_age;
        storage::set_config(&env, &config);

        events::publish_config(&env, symbol_short!("priceage"));
        log!(&env, "Max price age set to: {}", max_age);

        Ok(())
    }

    /// Admin function to pause/unpause staking
    pub fn set_emergency_pause(env: Env, admin: Address, paused: bool) -> Result<(), LedgerError> {
        let mut config = Self::require_admin(&env, &admin)?;

        config.paused = paused;
        storage::set_config(&env, &config);

        events::publish_config(&env, symbol_short!("pause"));
        log!(&env, "Emergency pause set to: {}", paused);

        Ok(())
    }

    /// Pay reward that could not be credited to any staker to `to`
    pub fn withdraw_undistributed_rewards(
        env: Env,
        admin: Address,
        reward_pool_id: u32,
        to: Address,
    ) -> Result<i128, LedgerError> {
        let config = Self::require_admin(&env, &admin)?;
        aggregator::withdraw_undistributed(&env, &config, reward_pool_id, &to)
    }

    /// Bridge the lending venue surplus of a yield-bearing deposit pool
    pub fn withdraw_yield(
        env: Env,
        admin: Address,
        deposit_pool_id: u32,
    ) -> Result<i128, LedgerError> {
        let config = Self::require_admin(&env, &admin)?;
        aggregator::withdraw_yield(&env, &config, deposit_pool_id)
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn get_config(env: Env) -> Result<LedgerConfig, LedgerError> {
        storage::get_config(&env)
    }

    pub fn get_bridge(env: Env) -> Option<BridgeConfig> {
        storage::get_bridge(&env)
    }

    pub fn get_reward_pool(env: Env, reward_pool_id: u32) -> Result<EmissionConfig, LedgerError> {
        storage::get_reward_pool(&env, reward_pool_id)
    }

    pub fn get_reward_pool_state(
        env: Env,
        reward_pool_id: u32,
    ) -> Result<RewardPoolState, LedgerError> {
        storage::get_reward_pool(&env, reward_pool_id)?;
        Ok(storage::get_reward_pool_state(&env, reward_pool_id))
    }

    pub fn get_reward_pool_count(env: Env) -> u32 {
        storage::reward_pool_count(&env)
    }

    pub fn get_linked_pools(env: Env, reward_pool_id: u32) -> Vec<u32> {
        storage::get_linked_pools(&env, reward_pool_id)
    }

    pub fn get_deposit_pool(env: Env, deposit_pool_id: u32) -> Option<DepositPoolLink> {
        storage::get_deposit_pool(&env, deposit_pool_id)
    }

    pub fn get_accumulator(env: Env, deposit_pool_id: u32) -> StakePoolAccumulator {
        storage::get_accumulator(&env, deposit_pool_id)
    }

    pub fn get_user_stake(env: Env, deposit_pool_id: u32, user: Address) -> Option<UserStakeRecord> {
        storage::get_user_stake(&env, deposit_pool_id, &user)
    }

    pub fn get_referrer(env: Env, deposit_pool_id: u32, referrer: Address) -> Option<ReferrerRecord> {
        storage::get_referrer(&env, deposit_pool_id, &referrer)
    }

    /// Reward `user` could claim for their own stake right now
    pub fn pending_reward(
        env: Env,
        user: Address,
        deposit_pool_id: u32,
    ) -> Result<i128, LedgerError> {
        ledger::pending_reward(&env, &user, deposit_pool_id)
    }

    pub fn emitted_between(
        env: Env,
        reward_pool_id: u32,
        from: u64,
        to: u64,
    ) -> Result<i128, LedgerError> {
        let config = storage::get_reward_pool(&env, reward_pool_id)?;
        emission::emitted_between(&config, from, to).ok_or(LedgerError::ArithmeticOverflow)
    }

    pub fn lock_multiplier(env: Env, lock_duration: u64) -> Result<i128, LedgerError> {
        let config = storage::get_config(&env)?;
        Ok(lock::lock_multiplier(&config.lock_tiers, lock_duration))
    }

    /// Value of a deposit pool's staked principal at the oracle price
    pub fn deposit_pool_value(env: Env, deposit_pool_id: u32) -> Result<i128, LedgerError> {
        let config = storage::get_config(&env)?;
        let link = storage::load_deposit_pool(&env, deposit_pool_id)?;
        let price = collaborators::fresh_price(&env, &config, &link.price_feed_key)?;
        let total_staked = storage::get_accumulator(&env, deposit_pool_id).total_staked;

        if !validate_positive_amount(total_staked) {
            return Ok(0);
        }
        10i128
            .checked_pow(price.decimals)
            .and_then(|unit| total_staked.checked_mul(price.price)?.checked_div(unit))
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    // Internal helper functions
    fn require_admin(env: &Env, admin: &Address) -> Result<LedgerConfig, LedgerError> {
        admin.require_auth();

        let config = storage::get_config(env)?;
        if config.admin != *admin {
            return Err(LedgerError::Unauthorized);
        }

        storage::extend_instance(env);
        Ok(config)
    }
}

mod testutils;
