//! Fixed-layout snapshot decoding
//!
//! Provides a bounds-checked byte reader and one decoder per record
//! kind, plus the single [`decode_record`] dispatch point. Decoding is
//! pure and total over well-formed input; truncated or malformed
//! buffers fail with [`TenorError::DecodeError`] and never yield a
//! partially populated structure.

use solana_sdk::pubkey::Pubkey;

use crate::error::{Result, TenorError};
use crate::state::{
    AccountRecord, Assets, ClaimTicket, Debt, MarginUser, MarketState, Obligation, OrderbookSide,
    RecordKind, Side, SlabEntry, SplitTicket, SUPPORTED_VERSION,
};

impl MarketState {
    /// Serialized length of the market record
    pub const LEN: usize = 1 + 12 * 32 + 32 + 1 + 1 + 8 + 8;
}

impl MarginUser {
    /// Serialized length of the borrower ledger record
    pub const LEN: usize = 1 + 6 * 32 + Debt::LEN + Assets::LEN;
}

impl Debt {
    pub const LEN: usize = 8 + 8 + 8 + 8 + 8;
}

impl Assets {
    pub const LEN: usize = 8 + 8;
}

impl Obligation {
    pub const LEN: usize = 1 + 8 + 32 + 32 + 16 + 8 + 8 + 1;
}

impl ClaimTicket {
    pub const LEN: usize = 1 + 32 + 32 + 8 + 8;
}

impl SplitTicket {
    pub const LEN: usize = 1 + 32 + 32 + 16 + 8 + 8 + 8 + 8;
}

impl OrderbookSide {
    /// Fixed header ahead of the entry array
    pub const HEADER_LEN: usize = 1 + 1 + 4;
    /// Serialized length of one slab entry
    pub const ENTRY_LEN: usize = 16 + 32 + 8 + 8;
}

/// Sequential reader over a record buffer with tracked offset
///
/// Construction validates the minimum length once; individual reads
/// still bounds-check so a decoder bug cannot read past the buffer.
pub struct RecordReader<'a> {
    kind: RecordKind,
    expected: usize,
    data: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    /// Create a reader, rejecting buffers shorter than `expected`
    pub fn new(kind: RecordKind, data: &'a [u8], expected: usize) -> Result<Self> {
        if data.len() < expected {
            return Err(TenorError::DecodeError {
                kind,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            kind,
            expected,
            data,
            offset: 0,
        })
    }

    fn truncated(&self) -> TenorError {
        TenorError::DecodeError {
            kind: self.kind,
            expected: self.expected,
            actual: self.data.len(),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.offset.checked_add(len).ok_or_else(|| self.truncated())?;
        if end > self.data.len() {
            return Err(self.truncated());
        }
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(i64::from_le_bytes(bytes))
    }

    pub fn read_u128(&mut self) -> Result<u128> {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(self.take(16)?);
        Ok(u128::from_le_bytes(bytes))
    }

    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.take(N)?);
        Ok(bytes)
    }

    pub fn read_pubkey(&mut self) -> Result<Pubkey> {
        Ok(Pubkey::new_from_array(self.read_bytes::<32>()?))
    }

    /// Version tag check; callers must not trust later fields otherwise
    fn read_version(&mut self) -> Result<u8> {
        let version = self.read_u8()?;
        if version != SUPPORTED_VERSION {
            return Err(TenorError::UnsupportedVersion {
                kind: self.kind,
                version,
            });
        }
        Ok(version)
    }
}

/// Decode a raw buffer as the given record kind
///
/// The single dispatch point for snapshot decoding: callers match on
/// the returned [`AccountRecord`] instead of asserting shapes ad hoc.
pub fn decode_record(kind: RecordKind, data: &[u8]) -> Result<AccountRecord> {
    match kind {
        RecordKind::Market => decode_market(data).map(AccountRecord::Market),
        RecordKind::MarginUser => decode_margin_user(data).map(AccountRecord::MarginUser),
        RecordKind::Obligation => decode_obligation(data).map(AccountRecord::Obligation),
        RecordKind::ClaimTicket => decode_claim_ticket(data).map(AccountRecord::ClaimTicket),
        RecordKind::SplitTicket => decode_split_ticket(data).map(AccountRecord::SplitTicket),
        RecordKind::OrderbookSide => decode_orderbook_side(data).map(AccountRecord::OrderbookSide),
    }
}

pub fn decode_market(data: &[u8]) -> Result<MarketState> {
    let mut r = RecordReader::new(RecordKind::Market, data, MarketState::LEN)?;
    Ok(MarketState {
        version: r.read_version()?,
        program_authority: r.read_pubkey()?,
        orderbook_market_state: r.read_pubkey()?,
        event_queue: r.read_pubkey()?,
        bids: r.read_pubkey()?,
        asks: r.read_pubkey()?,
        underlying_token_mint: r.read_pubkey()?,
        underlying_token_vault: r.read_pubkey()?,
        ticket_mint: r.read_pubkey()?,
        claims_mint: r.read_pubkey()?,
        collateral_mint: r.read_pubkey()?,
        underlying_oracle: r.read_pubkey()?,
        ticket_oracle: r.read_pubkey()?,
        seed: r.read_bytes::<32>()?,
        orderbook_paused: r.read_bool()?,
        tickets_paused: r.read_bool()?,
        tenor: r.read_i64()?,
        nonce: r.read_u64()?,
    })
}

pub fn decode_margin_user(data: &[u8]) -> Result<MarginUser> {
    let mut r = RecordReader::new(RecordKind::MarginUser, data, MarginUser::LEN)?;
    Ok(MarginUser {
        version: r.read_version()?,
        margin_account: r.read_pubkey()?,
        market: r.read_pubkey()?,
        claims: r.read_pubkey()?,
        collateral: r.read_pubkey()?,
        underlying_settlement: r.read_pubkey()?,
        ticket_settlement: r.read_pubkey()?,
        debt: Debt {
            next_new_obligation_seqno: r.read_u64()?,
            next_unpaid_obligation_seqno: r.read_u64()?,
            next_obligation_maturity: r.read_i64()?,
            pending: r.read_u64()?,
            committed: r.read_u64()?,
        },
        assets: Assets {
            entitled_tokens: r.read_u64()?,
            entitled_tickets: r.read_u64()?,
        },
    })
}

pub fn decode_obligation(data: &[u8]) -> Result<Obligation> {
    let mut r = RecordReader::new(RecordKind::Obligation, data, Obligation::LEN)?;
    Ok(Obligation {
        version: r.read_version()?,
        sequence_number: r.read_u64()?,
        borrower_account: r.read_pubkey()?,
        market: r.read_pubkey()?,
        order_tag: r.read_bytes::<16>()?,
        maturation_timestamp: r.read_i64()?,
        balance: r.read_u64()?,
        flags: r.read_u8()?,
    })
}

pub fn decode_claim_ticket(data: &[u8]) -> Result<ClaimTicket> {
    let mut r = RecordReader::new(RecordKind::ClaimTicket, data, ClaimTicket::LEN)?;
    Ok(ClaimTicket {
        version: r.read_version()?,
        owner: r.read_pubkey()?,
        market: r.read_pubkey()?,
        maturation_timestamp: r.read_i64()?,
        redeemable: r.read_u64()?,
    })
}

pub fn decode_split_ticket(data: &[u8]) -> Result<SplitTicket> {
    let mut r = RecordReader::new(RecordKind::SplitTicket, data, SplitTicket::LEN)?;
    Ok(SplitTicket {
        version: r.read_version()?,
        owner: r.read_pubkey()?,
        market: r.read_pubkey()?,
        order_tag: r.read_bytes::<16>()?,
        struck_timestamp: r.read_i64()?,
        maturation_timestamp: r.read_i64()?,
        principal: r.read_u64()?,
        interest: r.read_u64()?,
    })
}

/// Decode one side of the resting-order slab
///
/// The entry count in the header must account for the buffer exactly;
/// a count pointing past the end is malformed, not partially decodable.
pub fn decode_orderbook_side(data: &[u8]) -> Result<OrderbookSide> {
    let mut r = RecordReader::new(RecordKind::OrderbookSide, data, OrderbookSide::HEADER_LEN)?;
    let version = r.read_version()?;
    let side = match r.read_u8()? {
        0 => Side::Bid,
        1 => Side::Ask,
        other => {
            log::warn!("orderbook slab with unknown side tag {}", other);
            return Err(TenorError::DecodeError {
                kind: RecordKind::OrderbookSide,
                expected: OrderbookSide::HEADER_LEN,
                actual: data.len(),
            });
        }
    };
    let count = r.read_u32()? as usize;
    let expected = OrderbookSide::HEADER_LEN
        .checked_add(count.checked_mul(OrderbookSide::ENTRY_LEN).ok_or(
            TenorError::ArithmeticOverflow,
        )?)
        .ok_or(TenorError::ArithmeticOverflow)?;
    if data.len() != expected {
        return Err(TenorError::DecodeError {
            kind: RecordKind::OrderbookSide,
            expected,
            actual: data.len(),
        });
    }

    let mut entries = Vec::with_capacity(count);
    let mut r = RecordReader::new(RecordKind::OrderbookSide, data, expected)?;
    r.take(OrderbookSide::HEADER_LEN)?;
    for _ in 0..count {
        entries.push(SlabEntry {
            order_id: r.read_u128()?,
            owner: r.read_pubkey()?,
            base_size: r.read_u64()?,
            timestamp: r.read_i64()?,
        });
    }
    Ok(OrderbookSide {
        version,
        side,
        entries,
    })
}
