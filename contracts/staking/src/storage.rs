use capital_shared::EmissionConfig;
use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::error::LedgerError;
use crate::types::{
    BridgeConfig, DepositPoolLink, LedgerConfig, ReferrerRecord, RewardPoolState, StakePoolAccumulator,
    UserStakeRecord,
};

// ~30 days at 5s per ledger
pub(crate) const DAY_IN_LEDGERS: u32 = 17280;
pub(crate) const INSTANCE_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
pub(crate) const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;
pub(crate) const PERSISTENT_BUMP_AMOUNT: u32 = 90 * DAY_IN_LEDGERS;
pub(crate) const PERSISTENT_LIFETIME_THRESHOLD: u32 = PERSISTENT_BUMP_AMOUNT - DAY_IN_LEDGERS;

// Storage Keys
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Config,
    Bridge,
    RewardPoolCount,
    RewardPool(u32),
    RewardPoolState(u32),
    LinkedPools(u32),
    DepositPool(u32),
    Accumulator(u32),
    VenueAsset(Address),
    UserStake(u32, Address),
    Referrer(u32, Address),
    AllowedStaker(u32, Address),
}

pub fn extend_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

fn extend_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

// ============================================================================
// Configuration
// ============================================================================

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn get_config(env: &Env) -> Result<LedgerConfig, LedgerError> {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(LedgerError::NotInitialized)
}

pub fn set_config(env: &Env, config: &LedgerConfig) {
    env.storage().instance().set(&DataKey::Config, config);
}

pub fn get_bridge(env: &Env) -> Option<BridgeConfig> {
    env.storage().instance().get(&DataKey::Bridge)
}

pub fn set_bridge(env: &Env, bridge: &BridgeConfig) {
    env.storage().instance().set(&DataKey::Bridge, bridge);
}

// ============================================================================
// Reward Pools
// ============================================================================

pub fn reward_pool_count(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::RewardPoolCount)
        .unwrap_or(0)
}

/// Stores a new reward pool under the next free id and returns that id.
pub fn push_reward_pool(env: &Env, config: &EmissionConfig) -> u32 {
    let id = reward_pool_count(env);
    env.storage().instance().set(&DataKey::RewardPool(id), config);
    env.storage()
        .instance()
        .set(&DataKey::RewardPoolState(id), &RewardPoolState::default());
    env.storage()
        .instance()
        .set(&DataKey::RewardPoolCount, &(id + 1));
    id
}

pub fn get_reward_pool(env: &Env, id: u32) -> Result<EmissionConfig, LedgerError> {
    env.storage()
        .instance()
        .get(&DataKey::RewardPool(id))
        .ok_or(LedgerError::PoolNotFound)
}

pub fn set_reward_pool(env: &Env, id: u32, config: &EmissionConfig) {
    env.storage().instance().set(&DataKey::RewardPool(id), config);
}

pub fn get_reward_pool_state(env: &Env, id: u32) -> RewardPoolState {
    env.storage()
        .instance()
        .get(&DataKey::RewardPoolState(id))
        .unwrap_or_default()
}

pub fn set_reward_pool_state(env: &Env, id: u32, state: &RewardPoolState) {
    env.storage()
        .instance()
        .set(&DataKey::RewardPoolState(id), state);
}

pub fn get_linked_pools(env: &Env, reward_pool_id: u32) -> Vec<u32> {
    env.storage()
        .instance()
        .get(&DataKey::LinkedPools(reward_pool_id))
        .unwrap_or_else(|| Vec::new(env))
}

pub fn set_linked_pools(env: &Env, reward_pool_id: u32, pools: &Vec<u32>) {
    env.storage()
        .instance()
        .set(&DataKey::LinkedPools(reward_pool_id), pools);
}

// ============================================================================
// Deposit Pools
// ============================================================================

pub fn get_deposit_pool(env: &Env, id: u32) -> Option<DepositPoolLink> {
    env.storage().instance().get(&DataKey::DepositPool(id))
}

pub fn load_deposit_pool(env: &Env, id: u32) -> Result<DepositPoolLink, LedgerError> {
    get_deposit_pool(env, id).ok_or(LedgerError::NotLinked)
}

pub fn set_deposit_pool(env: &Env, id: u32, link: &DepositPoolLink) {
    env.storage().instance().set(&DataKey::DepositPool(id), link);
}

pub fn get_accumulator(env: &Env, id: u32) -> StakePoolAccumulator {
    env.storage()
        .instance()
        .get(&DataKey::Accumulator(id))
        .unwrap_or_default()
}

pub fn set_accumulator(env: &Env, id: u32, accumulator: &StakePoolAccumulator) {
    env.storage()
        .instance()
        .set(&DataKey::Accumulator(id), accumulator);
}

/// The venue reports one balance per asset, so at most one deposit pool may
/// keep a given asset on the venue at a time.
pub fn venue_asset_owner(env: &Env, asset: &Address) -> Option<u32> {
    env.storage()
        .instance()
        .get(&DataKey::VenueAsset(asset.clone()))
}

pub fn set_venue_asset_owner(env: &Env, asset: &Address, deposit_pool_id: Option<u32>) {
    let key = DataKey::VenueAsset(asset.clone());
    match deposit_pool_id {
        Some(id) => env.storage().instance().set(&key, &id),
        None => env.storage().instance().remove(&key),
    }
}

// ============================================================================
// Per-user Records
// ============================================================================

pub fn get_user_stake(env: &Env, pool: u32, user: &Address) -> Option<UserStakeRecord> {
    let key = DataKey::UserStake(pool, user.clone());
    let record = env.storage().persistent().get(&key);
    if record.is_some() {
        extend_persistent(env, &key);
    }
    record
}

pub fn set_user_stake(env: &Env, pool: u32, user: &Address, record: &UserStakeRecord) {
    let key = DataKey::UserStake(pool, user.clone());
    env.storage().persistent().set(&key, record);
    extend_persistent(env, &key);
}

pub fn get_referrer(env: &Env, pool: u32, referrer: &Address) -> Option<ReferrerRecord> {
    env.storage()
        .persistent()
        .get(&DataKey::Referrer(pool, referrer.clone()))
}

pub fn set_referrer(env: &Env, pool: u32, referrer: &Address, record: &ReferrerRecord) {
    let key = DataKey::Referrer(pool, referrer.clone());
    env.storage().persistent().set(&key, record);
    extend_persistent(env, &key);
}

pub fn is_allowed_staker(env: &Env, pool: u32, user: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::AllowedStaker(pool, user.clone()))
        .unwrap_or(false)
}

pub fn set_allowed_staker(env: &Env, pool: u32, user: &Address, allowed: bool) {
    let key = DataKey::AllowedStaker(pool, user.clone());
    if allowed {
        env.storage().persistent().set(&key, &true);
        extend_persistent(env, &key);
    } else {
        env.storage().persistent().remove(&key);
    }
}
