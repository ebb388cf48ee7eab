//! End-to-end borrow scenarios against an in-memory market snapshot
//!
//! Exercises the full client-side path: value the account, project the
//! borrow, build the order instruction, walk the debt bookkeeping
//! through fill and FIFO repayment.

use std::collections::HashMap;

use solana_sdk::pubkey::Pubkey;
use tenor_client::market::Market;
use tenor_client::orders::ObligationStatus;
use tenor_client::risk::{self, PoolConfig, Position, PositionKind};
use tenor_client::state::{Debt, MarketState, Obligation, SUPPORTED_VERSION};
use tenor_client::{Action, OrderParams, RiskBand, TenorError};

const ONE_DAY: i64 = 86_400;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn market() -> Market {
    let state = MarketState {
        version: SUPPORTED_VERSION,
        program_authority: Pubkey::new_unique(),
        orderbook_market_state: Pubkey::new_unique(),
        event_queue: Pubkey::new_unique(),
        bids: Pubkey::new_unique(),
        asks: Pubkey::new_unique(),
        underlying_token_mint: Pubkey::new_unique(),
        underlying_token_vault: Pubkey::new_unique(),
        ticket_mint: Pubkey::new_unique(),
        claims_mint: Pubkey::new_unique(),
        collateral_mint: Pubkey::new_unique(),
        underlying_oracle: Pubkey::new_unique(),
        ticket_oracle: Pubkey::new_unique(),
        seed: [7u8; 32],
        orderbook_paused: false,
        tickets_paused: false,
        tenor: ONE_DAY,
        nonce: 0,
    };
    Market::from_state(Pubkey::new_unique(), Pubkey::new_unique(), state)
}

fn usdc() -> Pubkey {
    Pubkey::new_from_array([1u8; 32])
}

fn sol() -> Pubkey {
    Pubkey::new_from_array([2u8; 32])
}

fn configs() -> HashMap<Pubkey, PoolConfig> {
    let mut configs = HashMap::new();
    configs.insert(
        usdc(),
        PoolConfig {
            collateral_weight_bps: 10_000,
            max_leverage_bps: 40_000,
        },
    );
    configs.insert(
        sol(),
        PoolConfig {
            collateral_weight_bps: 9_500,
            max_leverage_bps: 40_000,
        },
    );
    configs
}

fn prices() -> HashMap<Pubkey, u64> {
    let mut prices = HashMap::new();
    prices.insert(usdc(), 1_000_000);
    prices.insert(sol(), 100_000_000);
    prices
}

fn deposits() -> Vec<Position> {
    vec![
        Position {
            token: usdc(),
            kind: PositionKind::Deposit,
            balance: 500_000,
        },
        Position {
            token: sol(),
            kind: PositionKind::Deposit,
            balance: 50,
        },
    ]
}

/// Value the account, check the borrow leaves it healthy, then build
/// the instruction the signing layer would submit.
#[test]
fn test_borrow_projection_then_instruction() {
    init_logs();
    let market = market();
    let margin_account = Pubkey::new_unique();
    let payer = Pubkey::new_unique();

    let before = risk::valuate(&deposits(), &configs(), &prices()).unwrap();
    assert_eq!(before.weighted_collateral, 504_750);
    assert_eq!(before.band(), RiskBand::Healthy);

    let after = risk::project_after_action(
        &deposits(),
        &configs(),
        &prices(),
        sol(),
        10,
        Action::Borrow,
    )
    .unwrap();
    assert_eq!(after.weighted_collateral, 505_700);
    assert_eq!(after.required_collateral, 250);
    assert_eq!(after.band(), RiskBand::Healthy);

    let ix = market
        .request_borrow_ix(&margin_account, &payer, 1_000, 500, &[0u8; 8])
        .unwrap();
    assert_eq!(ix.program_id, market.program_id());
    assert!(!ix.data.is_empty());
}

/// Two fills, strict FIFO repayment: the first obligation must be paid
/// off before the second, and closing it requires the second as
/// witness.
#[test]
fn test_fill_and_fifo_repayment() {
    init_logs();
    let borrower = Pubkey::new_unique();
    let market_address = Pubkey::new_unique();
    let mut debt = Debt::default();

    debt.post_borrow_order(1_000).unwrap();
    let mut first = Obligation::from_fill(
        &mut debt,
        borrower,
        market_address,
        [1u8; 16],
        400,
        1_700_000_000 + ONE_DAY,
    )
    .unwrap();
    let second = Obligation::from_fill(
        &mut debt,
        borrower,
        market_address,
        [2u8; 16],
        600,
        1_700_000_000 + 2 * ONE_DAY,
    )
    .unwrap();

    assert_eq!(first.sequence_number, 0);
    assert_eq!(second.sequence_number, 1);
    assert_eq!(debt.pending, 0);
    assert_eq!(debt.committed, 1_000);

    // second cannot be repaid first
    let mut out_of_order = second;
    assert!(matches!(
        out_of_order.repay(&mut debt, 600, None),
        Err(TenorError::SequenceViolation { expected: 0, actual: 1 })
    ));

    // partial repayment keeps the first open, no witness needed
    assert_eq!(
        first.repay(&mut debt, 150, None).unwrap(),
        ObligationStatus::Open
    );
    assert_eq!(first.balance, 250);

    // closing it without presenting the second is rejected
    assert!(matches!(
        first.repay(&mut debt, 250, None),
        Err(TenorError::MissingWitness { expected: 1 })
    ));

    // with the witness the cursor and maturity advance
    assert_eq!(
        first.repay(&mut debt, 250, Some(&second)).unwrap(),
        ObligationStatus::Repaid
    );
    assert_eq!(debt.next_unpaid_obligation_seqno, 1);
    assert_eq!(debt.next_obligation_maturity, second.maturation_timestamp);
    assert_eq!(debt.committed, 600);

    // the last obligation closes with no witness
    let mut last = second;
    assert_eq!(
        last.repay(&mut debt, 600, None).unwrap(),
        ObligationStatus::Repaid
    );
    assert_eq!(debt.total().unwrap(), 0);
}

/// A paused market refuses to build order instructions but still
/// serves reads and repayments.
#[test]
fn test_paused_market_blocks_new_orders_only() {
    init_logs();
    let mut state = market().state().clone();
    state.orderbook_paused = true;
    let market = Market::from_state(Pubkey::new_unique(), Pubkey::new_unique(), state);

    let margin_account = Pubkey::new_unique();
    let payer = Pubkey::new_unique();

    assert!(matches!(
        market.request_borrow_ix(&margin_account, &payer, 1_000, 500, &[0u8; 8]),
        Err(TenorError::MarketPaused)
    ));
    assert!(matches!(
        market.cancel_order_ix(&payer, 1),
        Err(TenorError::MarketPaused)
    ));

    // refresh carries no order and is always buildable
    let ix = market.refresh_position_ix(&margin_account, true);
    assert_eq!(ix.program_id, market.program_id());
}

/// Withdrawing collateral until the account crosses the liquidation
/// threshold, checked through projection only.
#[test]
fn test_projection_finds_liquidation_boundary() {
    init_logs();
    let mut positions = deposits();
    positions.push(Position {
        token: usdc(),
        kind: PositionKind::Claim,
        balance: 350_000,
    });

    let current = risk::valuate(&positions, &configs(), &prices()).unwrap();
    assert_eq!(current.band(), RiskBand::Warning);

    let drained = risk::project_after_action(
        &positions,
        &configs(),
        &prices(),
        usdc(),
        150_000,
        Action::Withdraw,
    )
    .unwrap();
    assert_eq!(drained.band(), RiskBand::Liquidatable);

    // the projection never touched the inputs
    let recheck = risk::valuate(&positions, &configs(), &prices()).unwrap();
    assert_eq!(recheck, current);
}

/// Fill-now borrow uses the sentinel price and builds against the same
/// account set as a limit borrow.
#[test]
fn test_fill_now_and_limit_share_account_shape() {
    init_logs();
    let market = market();
    let margin_account = Pubkey::new_unique();
    let payer = Pubkey::new_unique();

    let limit = market
        .request_borrow_ix(&margin_account, &payer, 1_000, 500, &[0u8; 8])
        .unwrap();
    let fill_now = market
        .borrow_now_ix(&margin_account, &payer, 1_000, &[0u8; 8])
        .unwrap();

    let limit_keys: Vec<_> = limit.accounts.iter().map(|m| m.pubkey).collect();
    let fill_keys: Vec<_> = fill_now.accounts.iter().map(|m| m.pubkey).collect();
    assert_eq!(limit_keys, fill_keys);
    assert_ne!(limit.data, fill_now.data);

    // the fill-now params themselves validate
    OrderParams::fill_now(1_000).validate().unwrap();
}
