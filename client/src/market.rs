//! Market client: snapshot reads and unsigned instruction assembly
//!
//! All ledger reads go through the caller's RPC client and may suspend
//! on network I/O; no retry or timeout policy is applied here. Builders
//! return unsigned instructions for the external signing layer, after
//! rejecting whatever can be pre-validated from the cached snapshot
//! (pause flags, parameter combinations, FIFO order) to avoid a wasted
//! round trip.

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use crate::decode::{decode_margin_user, decode_market, decode_obligation, decode_orderbook_side};
use crate::derive;
use crate::error::{Result, TenorError};
use crate::orderbook::OrderbookView;
use crate::orders::OrderParams;
use crate::state::{MarginUser, MarketState, Obligation};

/// Instruction discriminators understood by the ledger program
mod ix_tag {
    pub const REGISTER_MARGIN_USER: u8 = 0;
    pub const MARGIN_BORROW_ORDER: u8 = 1;
    pub const LEND_ORDER: u8 = 2;
    pub const CANCEL_ORDER: u8 = 3;
    pub const REPAY: u8 = 4;
    pub const REFRESH_POSITION: u8 = 5;
    pub const REDEEM_TICKET: u8 = 6;
}

/// Client handle for one market (one tenor)
///
/// Holds the decoded manager snapshot; refresh by calling [`Market::load`]
/// again. Two instructions built from the same stale snapshot may race
/// if submitted concurrently; serialization is the caller's job.
#[derive(Debug, Clone)]
pub struct Market {
    program_id: Pubkey,
    address: Pubkey,
    state: MarketState,
}

impl Market {
    /// Load and decode the market account
    pub async fn load(client: &RpcClient, program_id: Pubkey, address: Pubkey) -> Result<Self> {
        let data = fetch_account_data(client, &address).await?;
        let state = decode_market(&data)?;
        log::debug!(
            "loaded market {} (tenor {}s, nonce {})",
            address,
            state.tenor,
            state.nonce
        );
        Ok(Self {
            program_id,
            address,
            state,
        })
    }

    /// Build a handle from an already-decoded snapshot
    pub fn from_state(program_id: Pubkey, address: Pubkey, state: MarketState) -> Self {
        Self {
            program_id,
            address,
            state,
        }
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn state(&self) -> &MarketState {
        &self.state
    }

    /// Market tenor in seconds, as an unsigned quantity
    pub fn tenor_seconds(&self) -> Result<u64> {
        u64::try_from(self.state.tenor)
            .map_err(|_| TenorError::InvalidOrderParams("market tenor is not positive"))
    }

    /// Borrower ledger address for a margin account in this market
    pub fn margin_user_address(&self, margin_account: &Pubkey) -> Pubkey {
        derive::margin_user(&self.program_id, &self.address, margin_account).0
    }

    /// Fetch and decode the borrower ledger for a margin account
    pub async fn fetch_margin_user(
        &self,
        client: &RpcClient,
        margin_account: &Pubkey,
    ) -> Result<MarginUser> {
        let address = self.margin_user_address(margin_account);
        let data = fetch_account_data(client, &address).await?;
        decode_margin_user(&data)
    }

    /// Fetch and decode one obligation account
    pub async fn fetch_obligation(
        &self,
        client: &RpcClient,
        address: &Pubkey,
    ) -> Result<Obligation> {
        let data = fetch_account_data(client, address).await?;
        decode_obligation(&data)
    }

    /// Fetch both slabs and build the price-time-ordered book view
    pub async fn fetch_orderbook(&self, client: &RpcClient) -> Result<OrderbookView> {
        let accounts = client
            .get_multiple_accounts(&[self.state.bids, self.state.asks])
            .await?;
        let mut sides = accounts.into_iter();
        let bids_data = sides
            .next()
            .flatten()
            .ok_or(TenorError::AccountNotFound(self.state.bids))?;
        let asks_data = sides
            .next()
            .flatten()
            .ok_or(TenorError::AccountNotFound(self.state.asks))?;
        let bids = decode_orderbook_side(&bids_data.data)?;
        let asks = decode_orderbook_side(&asks_data.data)?;
        OrderbookView::from_slabs(&bids, &asks)
    }

    /// Register a margin account with this market
    pub fn register_margin_user_ix(&self, margin_account: &Pubkey, payer: &Pubkey) -> Instruction {
        let margin_user = self.margin_user_address(margin_account);
        let (claims, _) = derive::user_claims(&self.program_id, &margin_user);
        let (collateral, _) = derive::user_collateral(&self.program_id, &margin_user);

        let accounts = vec![
            AccountMeta::new(margin_user, false),
            AccountMeta::new_readonly(*margin_account, true),
            AccountMeta::new_readonly(self.address, false),
            AccountMeta::new(claims, false),
            AccountMeta::new(collateral, false),
            AccountMeta::new_readonly(self.state.claims_mint, false),
            AccountMeta::new_readonly(self.state.collateral_mint, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ];

        Instruction {
            program_id: self.program_id,
            accounts,
            data: vec![ix_tag::REGISTER_MARGIN_USER],
        }
    }

    /// Borrow at an annualized rate; remainder rests on the book
    pub fn request_borrow_ix(
        &self,
        margin_account: &Pubkey,
        payer: &Pubkey,
        amount: u64,
        rate_bps: u64,
        seed: &[u8],
    ) -> Result<Instruction> {
        let params = OrderParams::limit(amount, rate_bps, self.tenor_seconds()?)?;
        self.margin_borrow_order_ix(margin_account, payer, &params, seed)
    }

    /// Borrow whatever the book offers right now; never rests
    pub fn borrow_now_ix(
        &self,
        margin_account: &Pubkey,
        payer: &Pubkey,
        amount: u64,
        seed: &[u8],
    ) -> Result<Instruction> {
        let params = OrderParams::fill_now(amount);
        self.margin_borrow_order_ix(margin_account, payer, &params, seed)
    }

    /// Build a margin borrow order instruction from explicit parameters
    pub fn margin_borrow_order_ix(
        &self,
        margin_account: &Pubkey,
        payer: &Pubkey,
        params: &OrderParams,
        seed: &[u8],
    ) -> Result<Instruction> {
        self.check_orderbook_open()?;
        params.validate()?;

        let margin_user = self.margin_user_address(margin_account);
        let (obligation, _) = derive::obligation(&self.program_id, &margin_user, seed);
        let (claims, _) = derive::user_claims(&self.program_id, &margin_user);

        let mut accounts = self.orderbook_accounts();
        accounts.extend([
            AccountMeta::new(margin_user, false),
            AccountMeta::new_readonly(*margin_account, true),
            AccountMeta::new(obligation, false),
            AccountMeta::new(claims, false),
            AccountMeta::new_readonly(self.state.claims_mint, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ]);

        let mut data = vec![ix_tag::MARGIN_BORROW_ORDER];
        encode_order_params(&mut data, params);
        data.extend_from_slice(seed);

        Ok(Instruction {
            program_id: self.program_id,
            accounts,
            data,
        })
    }

    /// Lend at an annualized rate; remainder rests on the book
    pub fn offer_loan_ix(
        &self,
        user: &Pubkey,
        payer: &Pubkey,
        amount: u64,
        rate_bps: u64,
        seed: &[u8],
    ) -> Result<Instruction> {
        let params = OrderParams::limit(amount, rate_bps, self.tenor_seconds()?)?;
        self.lend_order_ix(user, payer, &params, seed)
    }

    /// Lend into whatever the book offers right now; never rests
    pub fn lend_now_ix(
        &self,
        user: &Pubkey,
        payer: &Pubkey,
        amount: u64,
        seed: &[u8],
    ) -> Result<Instruction> {
        let params = OrderParams::fill_now(amount);
        self.lend_order_ix(user, payer, &params, seed)
    }

    /// Build a lend order instruction from explicit parameters
    pub fn lend_order_ix(
        &self,
        user: &Pubkey,
        payer: &Pubkey,
        params: &OrderParams,
        seed: &[u8],
    ) -> Result<Instruction> {
        self.check_orderbook_open()?;
        if params.auto_stake && self.state.tickets_paused {
            return Err(TenorError::TicketsPaused);
        }
        params.validate()?;

        let (split_ticket, _) = derive::split_ticket(&self.program_id, user, seed);

        let mut accounts = self.orderbook_accounts();
        accounts.extend([
            AccountMeta::new_readonly(*user, true),
            AccountMeta::new(split_ticket, false),
            AccountMeta::new(self.state.underlying_token_vault, false),
            AccountMeta::new(self.state.ticket_mint, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ]);

        let mut data = vec![ix_tag::LEND_ORDER];
        encode_order_params(&mut data, params);
        data.extend_from_slice(seed);

        Ok(Instruction {
            program_id: self.program_id,
            accounts,
            data,
        })
    }

    /// Cancel a resting order by id
    ///
    /// The ledger rejects the cancel if the id is no longer on the
    /// book; use a fresh [`OrderbookView`] to pre-check when staleness
    /// matters.
    pub fn cancel_order_ix(&self, user: &Pubkey, order_id: u128) -> Result<Instruction> {
        self.check_orderbook_open()?;

        let mut accounts = self.orderbook_accounts();
        accounts.push(AccountMeta::new_readonly(*user, true));

        let mut data = vec![ix_tag::CANCEL_ORDER];
        data.extend_from_slice(&order_id.to_le_bytes());

        Ok(Instruction {
            program_id: self.program_id,
            accounts,
            data,
        })
    }

    /// Repay an obligation, presenting the next unpaid one as witness
    ///
    /// FIFO order is pre-validated against the borrower ledger snapshot
    /// so an out-of-sequence repayment never reaches the wire. The
    /// witness account is bookkeeping only; no funds move against it.
    pub fn repay_ix(
        &self,
        margin_account: &Pubkey,
        user: &MarginUser,
        obligation: &Obligation,
        obligation_address: &Pubkey,
        next_witness: Option<&Pubkey>,
        amount: u64,
    ) -> Result<Instruction> {
        if obligation.sequence_number != user.debt.next_unpaid_obligation_seqno {
            return Err(TenorError::SequenceViolation {
                expected: user.debt.next_unpaid_obligation_seqno,
                actual: obligation.sequence_number,
            });
        }
        let closes = amount >= obligation.balance;
        let next_seqno = obligation
            .sequence_number
            .checked_add(1)
            .ok_or(TenorError::ArithmeticOverflow)?;
        let more_unpaid = next_seqno < user.debt.next_new_obligation_seqno;
        if closes && more_unpaid && next_witness.is_none() {
            return Err(TenorError::MissingWitness {
                expected: next_seqno,
            });
        }

        let margin_user = self.margin_user_address(margin_account);
        let mut accounts = vec![
            AccountMeta::new(margin_user, false),
            AccountMeta::new_readonly(*margin_account, true),
            AccountMeta::new_readonly(self.address, false),
            AccountMeta::new(*obligation_address, false),
            AccountMeta::new(self.state.underlying_token_vault, false),
            AccountMeta::new(user.underlying_settlement, false),
        ];
        if let Some(witness) = next_witness {
            accounts.push(AccountMeta::new_readonly(*witness, false));
        }

        let mut data = vec![ix_tag::REPAY];
        data.extend_from_slice(&amount.to_le_bytes());

        Ok(Instruction {
            program_id: self.program_id,
            accounts,
            data,
        })
    }

    /// Refresh the margin positions backed by this market
    ///
    /// `expect_price = false` is the escape hatch for refreshing an
    /// account whose oracle is broken; valuation degrades instead of
    /// failing.
    pub fn refresh_position_ix(&self, margin_account: &Pubkey, expect_price: bool) -> Instruction {
        let margin_user = self.margin_user_address(margin_account);
        let accounts = vec![
            AccountMeta::new(margin_user, false),
            AccountMeta::new_readonly(*margin_account, false),
            AccountMeta::new_readonly(self.address, false),
            AccountMeta::new_readonly(self.state.underlying_oracle, false),
            AccountMeta::new_readonly(self.state.ticket_oracle, false),
        ];

        Instruction {
            program_id: self.program_id,
            accounts,
            data: vec![ix_tag::REFRESH_POSITION, expect_price as u8],
        }
    }

    /// Redeem a matured claim or split ticket into the holder's vault
    pub fn redeem_ticket_ix(
        &self,
        ticket_address: &Pubkey,
        holder: &Pubkey,
        token_vault: &Pubkey,
    ) -> Result<Instruction> {
        if self.state.tickets_paused {
            return Err(TenorError::TicketsPaused);
        }

        let accounts = vec![
            AccountMeta::new(*ticket_address, false),
            AccountMeta::new_readonly(*holder, true),
            AccountMeta::new_readonly(self.address, false),
            AccountMeta::new(self.state.underlying_token_vault, false),
            AccountMeta::new(*token_vault, false),
        ];

        Ok(Instruction {
            program_id: self.program_id,
            accounts,
            data: vec![ix_tag::REDEEM_TICKET],
        })
    }

    /// Accounts every orderbook-mutating instruction starts with
    fn orderbook_accounts(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.address, false),
            AccountMeta::new(self.state.orderbook_market_state, false),
            AccountMeta::new(self.state.event_queue, false),
            AccountMeta::new(self.state.bids, false),
            AccountMeta::new(self.state.asks, false),
        ]
    }

    fn check_orderbook_open(&self) -> Result<()> {
        if self.state.orderbook_paused {
            return Err(TenorError::MarketPaused);
        }
        Ok(())
    }
}

/// Fixed-width little-endian encoding of order parameters
fn encode_order_params(data: &mut Vec<u8>, params: &OrderParams) {
    data.extend_from_slice(&params.max_ticket_qty.to_le_bytes());
    data.extend_from_slice(&params.max_underlying_token_qty.to_le_bytes());
    data.extend_from_slice(&params.limit_price.to_le_bytes());
    data.extend_from_slice(&params.match_limit.to_le_bytes());
    data.push(params.post_only as u8);
    data.push(params.post_allowed as u8);
    data.push(params.auto_stake as u8);
}

async fn fetch_account_data(client: &RpcClient, address: &Pubkey) -> Result<Vec<u8>> {
    let response = client
        .get_account_with_commitment(address, client.commitment())
        .await?;
    let account = response
        .value
        .ok_or(TenorError::AccountNotFound(*address))?;
    Ok(account.data)
}
