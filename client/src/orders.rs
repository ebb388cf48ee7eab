//! Order parameters and the debt/ticket lifecycle
//!
//! Order parameter sets are value objects built fresh per instruction
//! and never mutated after construction. The obligation model enforces
//! the ledger's strict FIFO repayment rule, including the witness
//! account quirk: repaying obligation N requires presenting the next
//! unpaid obligation as bookkeeping even though no funds move against
//! it.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::{Result, TenorError};
use crate::state::{obligation_flags, ClaimTicket, Debt, Obligation, SplitTicket, SUPPORTED_VERSION};
use tenor_math::rate_to_price;

/// Sentinel limit price meaning "no price limit"
///
/// Combined with `post_allowed = false` this denotes an unconditional
/// fill-at-any-price order that never rests (market-order semantics).
/// It is a sentinel, not a real zero price; orders that may rest must
/// carry a real limit price.
pub const LIMIT_PRICE_UNSET: u64 = 0;

/// Parameters for a borrow or lend order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderParams {
    /// Maximum quantity of tickets to trade
    pub max_ticket_qty: u64,
    /// Maximum quantity of underlying token to trade
    pub max_underlying_token_qty: u64,
    /// fp32 limit price, or [`LIMIT_PRICE_UNSET`]
    pub limit_price: u64,
    /// Maximum number of book levels to cross
    pub match_limit: u64,
    /// Post without matching; the ledger fails the order if the price
    /// would immediately cross the book
    pub post_only: bool,
    /// Rest the unfilled remainder on the book
    pub post_allowed: bool,
    /// Auto-stake matched tickets into a split ticket
    pub auto_stake: bool,
}

impl OrderParams {
    /// Limit order at an annualized rate, resting remainder allowed
    pub fn limit(amount: u64, rate_bps: u64, tenor_seconds: u64) -> Result<Self> {
        let limit_price = rate_to_price(rate_bps, tenor_seconds)?;
        Ok(Self {
            max_ticket_qty: u64::MAX,
            max_underlying_token_qty: amount,
            limit_price,
            match_limit: u64::MAX,
            post_only: false,
            post_allowed: true,
            auto_stake: true,
        })
    }

    /// Unconditional fill-now order; never rests
    pub fn fill_now(amount: u64) -> Self {
        Self {
            max_ticket_qty: u64::MAX,
            max_underlying_token_qty: amount,
            limit_price: LIMIT_PRICE_UNSET,
            match_limit: u64::MAX,
            post_only: false,
            post_allowed: false,
            auto_stake: true,
        }
    }

    /// Reject parameter combinations with no defined semantics before
    /// an instruction is built, saving the round trip
    pub fn validate(&self) -> Result<()> {
        if self.max_ticket_qty == 0 && self.max_underlying_token_qty == 0 {
            return Err(TenorError::InvalidOrderParams("zero quantity caps"));
        }
        if (self.post_only || self.post_allowed) && self.limit_price == LIMIT_PRICE_UNSET {
            return Err(TenorError::InvalidOrderParams(
                "an order that may rest needs a limit price",
            ));
        }
        if self.match_limit == 0 && !self.post_allowed {
            return Err(TenorError::InvalidOrderParams(
                "order can neither match nor post",
            ));
        }
        Ok(())
    }
}

/// Lifecycle of a submitted order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Posted to the book, nothing filled yet
    Resting,
    /// Some base filled, remainder still resting
    PartiallyFilled,
    /// Fully filled; terminal
    Filled,
    /// Explicitly cancelled; terminal
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    /// Transition after a fill leaves `remaining_base` on the book
    pub fn after_fill(self, remaining_base: u64) -> Result<OrderStatus> {
        if self.is_terminal() {
            return Err(TenorError::InvalidOrderParams(
                "fill applied to a terminal order",
            ));
        }
        Ok(if remaining_base == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        })
    }

    /// Transition after an explicit cancel instruction
    pub fn after_cancel(self) -> Result<OrderStatus> {
        if self.is_terminal() {
            return Err(TenorError::InvalidOrderParams(
                "cancel applied to a terminal order",
            ));
        }
        Ok(OrderStatus::Cancelled)
    }
}

/// Whether an obligation still carries balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObligationStatus {
    Open,
    Repaid,
}

impl Debt {
    /// Total outstanding debt, pending plus committed
    pub fn total(&self) -> Result<u64> {
        self.pending
            .checked_add(self.committed)
            .ok_or(TenorError::ArithmeticOverflow)
    }

    /// Reserve pending debt when a borrow order is posted
    pub fn post_borrow_order(&mut self, base: u64) -> Result<()> {
        self.pending = self
            .pending
            .checked_add(base)
            .ok_or(TenorError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Release pending debt when a resting borrow order leaves the book
    pub fn process_out(&mut self, base: u64) -> Result<()> {
        self.pending = self
            .pending
            .checked_sub(base)
            .ok_or(TenorError::ArithmeticUnderflow)?;
        Ok(())
    }

    /// Assign the next sequence number to a matched borrow and move the
    /// filled base from pending to committed. Returns the assigned
    /// sequence number.
    pub fn new_obligation_from_fill(&mut self, base: u64, maturity: i64) -> Result<u64> {
        let sequence_number = self.next_new_obligation_seqno;
        self.next_new_obligation_seqno = self
            .next_new_obligation_seqno
            .checked_add(1)
            .ok_or(TenorError::ArithmeticOverflow)?;
        self.pending = self
            .pending
            .checked_sub(base)
            .ok_or(TenorError::ArithmeticUnderflow)?;
        if self.committed == 0 {
            self.next_obligation_maturity = maturity;
        }
        self.committed = self
            .committed
            .checked_add(base)
            .ok_or(TenorError::ArithmeticOverflow)?;
        Ok(sequence_number)
    }

    /// True when unpaid obligations remain after `through_seqno`
    fn has_unpaid_after(&self, through_seqno: u64) -> bool {
        through_seqno + 1 < self.next_new_obligation_seqno
    }
}

impl Obligation {
    /// Build the obligation a matched borrow fill creates, consuming a
    /// sequence number from the borrower ledger
    pub fn from_fill(
        debt: &mut Debt,
        borrower_account: Pubkey,
        market: Pubkey,
        order_tag: [u8; 16],
        base: u64,
        maturation_timestamp: i64,
    ) -> Result<Self> {
        let sequence_number = debt.new_obligation_from_fill(base, maturation_timestamp)?;
        Ok(Self {
            version: SUPPORTED_VERSION,
            sequence_number,
            borrower_account,
            market,
            order_tag,
            maturation_timestamp,
            balance: base,
            flags: 0,
        })
    }

    pub fn status(&self) -> ObligationStatus {
        if self.balance == 0 {
            ObligationStatus::Repaid
        } else {
            ObligationStatus::Open
        }
    }

    /// True once the ledger has marked this obligation past due
    pub fn marked_due(&self) -> bool {
        self.flags & obligation_flags::MARKED_DUE != 0
    }

    /// Repay `amount` against this obligation under strict FIFO order
    ///
    /// The obligation must be the next unpaid one in the ledger. When
    /// repayment closes it and further unpaid obligations exist, the
    /// caller must supply the next one as a witness; its maturity is
    /// recorded but no funds move against it.
    pub fn repay(
        &mut self,
        debt: &mut Debt,
        amount: u64,
        next_witness: Option<&Obligation>,
    ) -> Result<ObligationStatus> {
        if self.sequence_number != debt.next_unpaid_obligation_seqno {
            return Err(TenorError::SequenceViolation {
                expected: debt.next_unpaid_obligation_seqno,
                actual: self.sequence_number,
            });
        }
        let new_balance = self
            .balance
            .checked_sub(amount)
            .ok_or(TenorError::ArithmeticUnderflow)?;
        let new_committed = debt
            .committed
            .checked_sub(amount)
            .ok_or(TenorError::ArithmeticUnderflow)?;

        if new_balance > 0 {
            self.balance = new_balance;
            debt.committed = new_committed;
            return Ok(ObligationStatus::Open);
        }

        // closing this obligation; validate the witness before mutating
        let next_seqno = self
            .sequence_number
            .checked_add(1)
            .ok_or(TenorError::ArithmeticOverflow)?;
        if debt.has_unpaid_after(self.sequence_number) {
            let witness = next_witness.ok_or(TenorError::MissingWitness {
                expected: next_seqno,
            })?;
            if witness.sequence_number != next_seqno {
                return Err(TenorError::SequenceViolation {
                    expected: next_seqno,
                    actual: witness.sequence_number,
                });
            }
            debt.next_obligation_maturity = witness.maturation_timestamp;
        }

        self.balance = new_balance;
        debt.committed = new_committed;
        debt.next_unpaid_obligation_seqno = next_seqno;
        Ok(ObligationStatus::Repaid)
    }
}

impl SplitTicket {
    /// Build the split ticket an auto-staked lend fill creates
    ///
    /// `quote` is what the lender paid now, `base` the face value they
    /// receive at maturity; the difference is the interest component.
    pub fn from_fill(
        owner: Pubkey,
        market: Pubkey,
        order_tag: [u8; 16],
        quote: u64,
        base: u64,
        fill_timestamp: i64,
        tenor_seconds: i64,
    ) -> Result<Self> {
        let interest = base
            .checked_sub(quote)
            .ok_or(TenorError::ArithmeticUnderflow)?;
        let maturation_timestamp = fill_timestamp
            .checked_add(tenor_seconds)
            .ok_or(TenorError::ArithmeticOverflow)?;
        Ok(Self {
            version: SUPPORTED_VERSION,
            owner,
            market,
            order_tag,
            struck_timestamp: fill_timestamp,
            maturation_timestamp,
            principal: quote,
            interest,
        })
    }

    /// Total redeemable at maturity
    pub fn redeemable(&self) -> Result<u64> {
        self.principal
            .checked_add(self.interest)
            .ok_or(TenorError::ArithmeticOverflow)
    }

    /// Amount released by redeeming at `now`; fails before maturity
    pub fn redeem(&self, now: i64) -> Result<u64> {
        if now < self.maturation_timestamp {
            return Err(TenorError::ImmatureTicket {
                matures_at: self.maturation_timestamp,
                now,
            });
        }
        self.redeemable()
    }
}

impl ClaimTicket {
    /// Amount released by redeeming at `now`; fails before maturity
    pub fn redeem(&self, now: i64) -> Result<u64> {
        if now < self.maturation_timestamp {
            return Err(TenorError::ImmatureTicket {
                matures_at: self.maturation_timestamp,
                now,
            });
        }
        Ok(self.redeemable)
    }
}
