//! Error taxonomy for the client SDK
//!
//! Pure-computation failures (arithmetic, decode, sequence checks) are
//! always surfaced to the caller. Failures that only the ledger can
//! detect (a rejected post-only order, for example) have their own
//! variants so callers can distinguish them from local bugs.

use solana_sdk::pubkey::Pubkey;
use tenor_math::MathError;
use thiserror::Error;

use crate::state::RecordKind;

/// Library-wide error type
#[derive(Debug, Error)]
pub enum TenorError {
    /// Checked fixed-point math exceeded the target width
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// Checked subtraction went below zero
    #[error("arithmetic underflow")]
    ArithmeticUnderflow,

    /// Division by zero (zero tenor, or zero price where division occurs)
    #[error("division by zero")]
    ZeroDivision,

    /// Snapshot buffer does not match the fixed layout for its kind
    #[error("malformed {kind:?} snapshot: expected {expected} bytes, got {actual}")]
    DecodeError {
        kind: RecordKind,
        expected: usize,
        actual: usize,
    },

    /// Record version tag is not one this client understands
    #[error("unsupported {kind:?} version {version}")]
    UnsupportedVersion { kind: RecordKind, version: u8 },

    /// Caller required a price that the supplied price set lacks
    #[error("no price available for token {0}")]
    MissingPrice(Pubkey),

    /// Repayment attempted out of FIFO order
    #[error("obligation sequence violation: expected {expected}, got {actual}")]
    SequenceViolation { expected: u64, actual: u64 },

    /// Closing repayment with further unpaid obligations needs the next
    /// one presented as witness
    #[error("repayment requires obligation {expected} as witness")]
    MissingWitness { expected: u64 },

    /// Order parameter combination has no defined semantics
    #[error("invalid order parameters: {0}")]
    InvalidOrderParams(&'static str),

    /// Ticket redeemed before its maturation timestamp
    #[error("ticket matures at {matures_at}, now is {now}")]
    ImmatureTicket { matures_at: i64, now: i64 },

    /// Order id not present in the resting book
    #[error("order {0} not found in the book")]
    OrderNotFound(u128),

    /// Market snapshot shows the orderbook paused
    #[error("orderbook is paused")]
    MarketPaused,

    /// Market snapshot shows ticket redemption paused
    #[error("tickets are paused")]
    TicketsPaused,

    /// The ledger rejected the order (e.g. post-only would cross)
    #[error("order rejected by the ledger: {0}")]
    OrderRejected(String),

    /// Account missing on the ledger
    #[error("account {0} does not exist")]
    AccountNotFound(Pubkey),

    /// RPC transport failure while reading ledger state
    #[error("rpc error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),
}

impl From<MathError> for TenorError {
    fn from(e: MathError) -> Self {
        match e {
            MathError::Overflow => TenorError::ArithmeticOverflow,
            MathError::Underflow => TenorError::ArithmeticUnderflow,
            MathError::ZeroDivision => TenorError::ZeroDivision,
        }
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, TenorError>;
