#![cfg(test)]
//! Contract doubles for the ledger's collaborators.

use capital_shared::PriceData;
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, Address, Bytes, Env, String, Vec,
};

use crate::LedgerContractClient;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum MockError {
    InsufficientBalance = 1,
    Unavailable = 2,
    Reentered = 3,
}

#[contracttype]
#[derive(Clone)]
enum MockKey {
    Balance(Address),
    Failing,
    Reentry,
    Price(String),
    Sent,
}

fn is_failing(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&MockKey::Failing)
        .unwrap_or(false)
}

// ============================================================================
// Token
// ============================================================================

#[contract]
pub struct MockToken;

#[contractimpl]
impl MockToken {
    pub fn mint(env: Env, to: Address, amount: i128) {
        let balance = Self::balance(env.clone(), to.clone());
        env.storage()
            .instance()
            .set(&MockKey::Balance(to), &(balance + amount));
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        env.storage()
            .instance()
            .get(&MockKey::Balance(id))
            .unwrap_or(0)
    }

    pub fn set_failing(env: Env, failing: bool) {
        env.storage().instance().set(&MockKey::Failing, &failing);
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), MockError> {
        from.require_auth();
        if is_failing(&env) {
            return Err(MockError::Unavailable);
        }

        let from_balance = Self::balance(env.clone(), from.clone());
        if from_balance < amount {
            return Err(MockError::InsufficientBalance);
        }
        let to_balance = Self::balance(env.clone(), to.clone());

        env.storage()
            .instance()
            .set(&MockKey::Balance(from), &(from_balance - amount));
        env.storage()
            .instance()
            .set(&MockKey::Balance(to), &(to_balance + amount));
        Ok(())
    }
}

// ============================================================================
// Lending Venue
// ============================================================================

/// Books principal per asset. Tokens are expected to arrive before
/// `deposit` is called, as the ledger does.
#[contract]
pub struct MockVenue;

#[contractimpl]
impl MockVenue {
    pub fn principal_balance_of(env: Env, asset: Address) -> Result<i128, MockError> {
        if is_failing(&env) {
            return Err(MockError::Unavailable);
        }
        Ok(Self::booked(&env, &asset))
    }

    pub fn deposit(env: Env, asset: Address, amount: i128) -> Result<(), MockError> {
        if is_failing(&env) {
            return Err(MockError::Unavailable);
        }
        if let Some(ledger) = env
            .storage()
            .instance()
            .get::<_, Address>(&MockKey::Reentry)
        {
            let reentered = LedgerContractClient::new(&env, &ledger).try_distribute(&0);
            if !matches!(reentered, Ok(Ok(()))) {
                return Err(MockError::Reentered);
            }
        }

        let booked = Self::booked(&env, &asset);
        env.storage()
            .instance()
            .set(&MockKey::Balance(asset), &(booked + amount));
        Ok(())
    }

    pub fn withdraw(env: Env, asset: Address, amount: i128, to: Address) -> Result<(), MockError> {
        if is_failing(&env) {
            return Err(MockError::Unavailable);
        }
        let booked = Self::booked(&env, &asset);
        if booked < amount {
            return Err(MockError::InsufficientBalance);
        }

        env.storage()
            .instance()
            .set(&MockKey::Balance(asset.clone()), &(booked - amount));
        MockTokenClient::new(&env, &asset).transfer(&env.current_contract_address(), &to, &amount);
        Ok(())
    }

    /// Simulates interest: the venue's holdings of `asset` grow by `amount`.
    pub fn accrue(env: Env, asset: Address, amount: i128) {
        let booked = Self::booked(&env, &asset);
        env.storage()
            .instance()
            .set(&MockKey::Balance(asset.clone()), &(booked + amount));
        MockTokenClient::new(&env, &asset).mint(&env.current_contract_address(), &amount);
    }

    pub fn set_unavailable(env: Env, unavailable: bool) {
        env.storage().instance().set(&MockKey::Failing, &unavailable);
    }

    /// Makes `deposit` call back into `ledger`.
    pub fn set_reentry(env: Env, ledger: Address) {
        env.storage().instance().set(&MockKey::Reentry, &ledger);
    }

    fn booked(env: &Env, asset: &Address) -> i128 {
        env.storage()
            .instance()
            .get(&MockKey::Balance(asset.clone()))
            .unwrap_or(0)
    }
}

// ============================================================================
// Oracle & Bridge
// ============================================================================

#[contract]
pub struct MockOracle;

#[contractimpl]
impl MockOracle {
    pub fn set_price(env: Env, feed_key: String, price: i128, decimals: u32, updated_at: u64) {
        let data = PriceData {
            price,
            decimals,
            updated_at,
        };
        env.storage().instance().set(&MockKey::Price(feed_key), &data);
    }

    pub fn price_of(env: Env, feed_key: String) -> Result<PriceData, MockError> {
        env.storage()
            .instance()
            .get(&MockKey::Price(feed_key))
            .ok_or(MockError::Unavailable)
    }
}

#[contract]
pub struct MockBridge;

#[contractimpl]
impl MockBridge {
    pub fn send(env: Env, destination_chain_id: u32, payload: Bytes) {
        let mut sent = Self::sent(env.clone());
        sent.push_back((destination_chain_id, payload));
        env.storage().instance().set(&MockKey::Sent, &sent);
    }

    pub fn sent(env: Env) -> Vec<(u32, Bytes)> {
        env.storage()
            .instance()
            .get(&MockKey::Sent)
            .unwrap_or_else(|| Vec::new(&env))
    }
}
