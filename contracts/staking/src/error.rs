use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum LedgerError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    InvalidConfiguration = 4,
    ContractPaused = 5,

    // Preconditions
    ZeroAmount = 6,
    BelowMinimumStake = 7,
    InsufficientStake = 8,
    LockActive = 9,
    InvalidLockPeriod = 10,
    PoolNotFound = 11,
    PoolNotPublic = 12,
    AlreadyLinked = 13,
    NotLinked = 14,
    InvalidReferrer = 15,
    NothingToClaim = 16,
    NoStakers = 17,
    NothingToWithdraw = 18,

    // Retryable
    ThrottleActive = 19,

    ArithmeticOverflow = 20,
    CollaboratorUnavailable = 21,
}
