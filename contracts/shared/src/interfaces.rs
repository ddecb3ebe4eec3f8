//! Interfaces of the external collaborators the ledger consumes.
//!
//! Each trait generates a typed client. Callers are expected to use the
//! `try_` variants and treat every failure as the collaborator being
//! unavailable.

use soroban_sdk::{contractclient, Address, Bytes, Env, String};

use crate::PriceData;

/// Read-only price source. Prices never feed reward arithmetic.
#[contractclient(name = "PriceOracleClient")]
pub trait PriceOracle {
    fn price_of(env: Env, feed_key: String) -> PriceData;
}

/// Lending venue holding principal of yield-bearing deposit pools.
///
/// Yield is inferred from balance deltas only; the venue's own interest
/// reporting is never consulted.
#[contractclient(name = "LendingVenueClient")]
pub trait LendingVenue {
    fn principal_balance_of(env: Env, asset: Address) -> i128;

    /// Credits `amount` that the caller already transferred to the venue.
    fn deposit(env: Env, asset: Address, amount: i128);

    fn withdraw(env: Env, asset: Address, amount: i128, to: Address);
}

/// Fire-and-forget cross-chain sender.
#[contractclient(name = "BridgeClient")]
pub trait Bridge {
    fn send(env: Env, destination_chain_id: u32, payload: Bytes);
}
