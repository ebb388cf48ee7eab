//! Typed account records
//!
//! Mirrors of the on-chain fixed-layout accounts. Every record starts
//! with a one-byte version tag; layouts are fixed-width, fixed-order,
//! little-endian, and any layout change is a breaking, versioned
//! change. Byte offsets live in [`crate::decode`].

use solana_sdk::pubkey::Pubkey;

/// Version tag this client understands for every record kind
pub const SUPPORTED_VERSION: u8 = 1;

/// Discriminates which on-chain record a raw buffer claims to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Market,
    MarginUser,
    Obligation,
    ClaimTicket,
    SplitTicket,
    OrderbookSide,
}

/// Decoded record, tagged by kind
///
/// Single sum type so callers dispatch on the record kind once instead
/// of asserting shapes field by field.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountRecord {
    Market(MarketState),
    MarginUser(MarginUser),
    Obligation(Obligation),
    ClaimTicket(ClaimTicket),
    SplitTicket(SplitTicket),
    OrderbookSide(OrderbookSide),
}

/// Global market account, one per tenor
///
/// Immutable once initialized except for the pause flags and the
/// monotonic order nonce.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketState {
    pub version: u8,
    pub program_authority: Pubkey,
    pub orderbook_market_state: Pubkey,
    pub event_queue: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub underlying_token_mint: Pubkey,
    pub underlying_token_vault: Pubkey,
    pub ticket_mint: Pubkey,
    pub claims_mint: Pubkey,
    pub collateral_mint: Pubkey,
    pub underlying_oracle: Pubkey,
    pub ticket_oracle: Pubkey,
    /// Seed the market itself was derived from
    pub seed: [u8; 32],
    pub orderbook_paused: bool,
    pub tickets_paused: bool,
    /// Time from fill to maturity, in seconds
    pub tenor: i64,
    /// Monotonic counter used to tag orders
    pub nonce: u64,
}

/// Borrower ledger, one per (market, margin account) pair
#[derive(Debug, Clone, PartialEq)]
pub struct MarginUser {
    pub version: u8,
    pub margin_account: Pubkey,
    pub market: Pubkey,
    pub claims: Pubkey,
    pub collateral: Pubkey,
    pub underlying_settlement: Pubkey,
    pub ticket_settlement: Pubkey,
    pub debt: Debt,
    pub assets: Assets,
}

/// Debt bookkeeping for a borrower ledger
///
/// `next_new_obligation_seqno` / `next_unpaid_obligation_seqno` form
/// the strictly increasing pair that enforces FIFO repayment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Debt {
    /// Sequence number the next matched borrow will be assigned
    pub next_new_obligation_seqno: u64,
    /// Lowest sequence number still carrying unpaid balance
    pub next_unpaid_obligation_seqno: u64,
    /// Maturity of the next unpaid obligation
    pub next_obligation_maturity: i64,
    /// Debt reserved by resting orders, not yet matched
    pub pending: u64,
    /// Matched debt owed at maturity
    pub committed: u64,
}

/// Asset entitlements accrued from fills, pending settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Assets {
    pub entitled_tokens: u64,
    pub entitled_tickets: u64,
}

/// Flags carried by an obligation record
pub mod obligation_flags {
    /// Obligation has passed maturity and was marked due
    pub const MARKED_DUE: u8 = 1;
}

/// Sequence-numbered debt created by a matched borrow order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obligation {
    pub version: u8,
    /// Assigned from the borrower ledger counter, strictly increasing
    pub sequence_number: u64,
    pub borrower_account: Pubkey,
    pub market: Pubkey,
    /// Tag linking this obligation back to the order that created it
    pub order_tag: [u8; 16],
    pub maturation_timestamp: i64,
    /// Remaining balance owed
    pub balance: u64,
    pub flags: u8,
}

/// Flat redeemable claim created by staking tickets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimTicket {
    pub version: u8,
    pub owner: Pubkey,
    pub market: Pubkey,
    pub maturation_timestamp: i64,
    pub redeemable: u64,
}

/// Auto-staked lend fill, principal and interest tracked separately
///
/// The redeemable total is `principal + interest`; the split exists
/// for accounting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitTicket {
    pub version: u8,
    pub owner: Pubkey,
    pub market: Pubkey,
    pub order_tag: [u8; 16],
    /// Timestamp of the fill that struck this ticket
    pub struck_timestamp: i64,
    pub maturation_timestamp: i64,
    pub principal: u64,
    pub interest: u64,
}

/// Which side of the book a slab stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

/// Raw resting order as stored in a slab entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlabEntry {
    /// Book-wide order id; the upper 64 bits are the fp32 price
    pub order_id: u128,
    pub owner: Pubkey,
    /// Remaining base (ticket) quantity
    pub base_size: u64,
    /// Unix timestamp the order entered the book
    pub timestamp: i64,
}

impl SlabEntry {
    /// fp32 limit price recovered from the order id layout
    pub fn price(&self) -> u64 {
        (self.order_id >> 64) as u64
    }
}

/// One decoded side of the resting-order storage
#[derive(Debug, Clone, PartialEq)]
pub struct OrderbookSide {
    pub version: u8,
    pub side: Side,
    pub entries: Vec<SlabEntry>,
}
