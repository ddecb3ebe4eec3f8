use capital_shared::Strategy;
use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakedEvent {
    pub user: Address,
    pub deposit_pool_id: u32,
    pub amount: i128,
    pub lock_end: u64,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawnEvent {
    pub user: Address,
    pub deposit_pool_id: u32,
    pub amount: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimedEvent {
    pub user: Address,
    pub receiver: Address,
    pub deposit_pool_id: u32,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributedEvent {
    pub reward_pool_id: u32,
    pub emitted: i128,
    pub yield_amount: i128,
    pub undistributed: i128,
    pub timestamp: u64,
}

pub fn publish_initialized(env: &Env, admin: Address, reward_pools: u32) {
    env.events()
        .publish((symbol_short!("init"),), (admin, reward_pools));
}

pub fn publish_staked(env: &Env, event: StakedEvent) {
    env.events().publish((symbol_short!("staked"),), event);
}

pub fn publish_withdrawn(env: &Env, event: WithdrawnEvent) {
    env.events().publish((symbol_short!("withdrawn"),), event);
}

pub fn publish_claimed(env: &Env, event: ClaimedEvent) {
    env.events().publish((symbol_short!("claimed"),), event);
}

pub fn publish_distributed(env: &Env, event: DistributedEvent) {
    env.events().publish((symbol_short!("distrib"),), event);
}

/// A deposit pool's allocation could not be credited and was parked.
pub fn publish_carried(env: &Env, deposit_pool_id: u32, amount: i128) {
    env.events()
        .publish((symbol_short!("carried"), deposit_pool_id), amount);
}

pub fn publish_linked(env: &Env, reward_pool_id: u32, deposit_pool_id: u32, strategy: Strategy) {
    env.events().publish(
        (symbol_short!("linked"), reward_pool_id),
        (deposit_pool_id, strategy),
    );
}

pub fn publish_migrated(env: &Env, deposit_pool_id: u32, from: Strategy, to: Strategy) {
    env.events()
        .publish((symbol_short!("migrated"), deposit_pool_id), (from, to));
}

pub fn publish_yield_withdrawn(env: &Env, deposit_pool_id: u32, amount: i128, chain_id: u32) {
    env.events().publish(
        (symbol_short!("yield"), deposit_pool_id),
        (amount, chain_id),
    );
}

pub fn publish_undistributed_withdrawn(env: &Env, reward_pool_id: u32, to: Address, amount: i128) {
    env.events()
        .publish((symbol_short!("undistrib"), reward_pool_id), (to, amount));
}

pub fn publish_config(env: &Env, setting: Symbol) {
    env.events().publish((symbol_short!("config"), setting), ());
}
