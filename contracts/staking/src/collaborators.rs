//! Calls into contracts the ledger does not control.
//!
//! Every call goes through a `try_` client. Any failure (an error result, a
//! value that does not decode, a trap, or a re-entry rejected by the host)
//! is logged and reported as `CollaboratorUnavailable`, which rolls the
//! whole invocation back.

use capital_shared::interfaces::{BridgeClient, LendingVenueClient, PriceOracleClient};
use capital_shared::PriceData;
use soroban_sdk::{log, token, xdr::ToXdr, Address, Env, String};

use crate::error::LedgerError;
use crate::types::{BridgeConfig, LedgerConfig};

pub fn transfer(
    env: &Env,
    token: &Address,
    from: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), LedgerError> {
    match token::Client::new(env, token).try_transfer(from, to, &amount) {
        Ok(Ok(())) => Ok(()),
        _ => {
            log!(env, "Token transfer of {} via {} failed", amount, token);
            Err(LedgerError::CollaboratorUnavailable)
        }
    }
}

pub fn venue_balance(env: &Env, venue: &Address, asset: &Address) -> Result<i128, LedgerError> {
    match LendingVenueClient::new(env, venue).try_principal_balance_of(asset) {
        Ok(Ok(balance)) if balance >= 0 => Ok(balance),
        _ => {
            log!(env, "Lending venue {} balance read failed", venue);
            Err(LedgerError::CollaboratorUnavailable)
        }
    }
}

/// Moves `amount` of the ledger's own `asset` into the venue.
pub fn venue_deposit(
    env: &Env,
    venue: &Address,
    asset: &Address,
    amount: i128,
) -> Result<(), LedgerError> {
    transfer(env, asset, &env.current_contract_address(), venue, amount)?;
    match LendingVenueClient::new(env, venue).try_deposit(asset, &amount) {
        Ok(Ok(())) => Ok(()),
        _ => {
            log!(env, "Lending venue {} deposit of {} failed", venue, amount);
            Err(LedgerError::CollaboratorUnavailable)
        }
    }
}

pub fn venue_withdraw(
    env: &Env,
    venue: &Address,
    asset: &Address,
    amount: i128,
    to: &Address,
) -> Result<(), LedgerError> {
    match LendingVenueClient::new(env, venue).try_withdraw(asset, &amount, to) {
        Ok(Ok(())) => Ok(()),
        _ => {
            log!(env, "Lending venue {} withdrawal of {} failed", venue, amount);
            Err(LedgerError::CollaboratorUnavailable)
        }
    }
}

/// Current price for `feed_key`, rejected when older than `max_price_age`.
pub fn fresh_price(
    env: &Env,
    config: &LedgerConfig,
    feed_key: &String,
) -> Result<PriceData, LedgerError> {
    let data = match PriceOracleClient::new(env, &config.oracle).try_price_of(feed_key) {
        Ok(Ok(data)) => data,
        _ => {
            log!(env, "Oracle {} has no price for {}", config.oracle, feed_key.clone());
            return Err(LedgerError::CollaboratorUnavailable);
        }
    };

    let now = env.ledger().timestamp();
    let stale = now.saturating_sub(data.updated_at) > config.max_price_age;
    if data.price <= 0 || stale {
        log!(env, "Oracle price for {} is stale or invalid", feed_key.clone());
        return Err(LedgerError::CollaboratorUnavailable);
    }

    Ok(data)
}

pub fn bridge_send(
    env: &Env,
    bridge: &BridgeConfig,
    asset: &Address,
    amount: i128,
) -> Result<(), LedgerError> {
    let payload = (asset.clone(), amount).to_xdr(env);
    match BridgeClient::new(env, &bridge.bridge).try_send(&bridge.destination_chain_id, &payload) {
        Ok(Ok(())) => Ok(()),
        _ => {
            log!(env, "Bridge {} send failed", bridge.bridge);
            Err(LedgerError::CollaboratorUnavailable)
        }
    }
}
