//! Deterministic account derivation
//!
//! Reproduces the ledger program's PDA seed construction: literal seed
//! tags, byte ordering, and fixed-width encodings. The hash itself is
//! the ledger's native `find_program_address`; if a seed set does not
//! correspond to a valid derivation the ledger rejects the address at
//! execution time, and nothing here can detect that locally.

use solana_sdk::pubkey::Pubkey;

/// Seed tag for the borrower ledger account
pub const MARGIN_USER_SEED: &[u8] = b"margin_borrower";
/// Seed tag for the borrower's claim note account
pub const USER_CLAIMS_SEED: &[u8] = b"user_claims";
/// Seed tag for the borrower's collateral note account
pub const USER_COLLATERAL_SEED: &[u8] = b"deposit_notes";
/// Seed tag for obligation accounts
pub const OBLIGATION_SEED: &[u8] = b"obligation";
/// Seed tag for claim tickets
pub const CLAIM_TICKET_SEED: &[u8] = b"claim_ticket";
/// Seed tag for split tickets
pub const SPLIT_TICKET_SEED: &[u8] = b"split_ticket";

/// Derive the borrower ledger address for a margin account in a market
pub fn margin_user(program: &Pubkey, market: &Pubkey, margin_account: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[MARGIN_USER_SEED, market.as_ref(), margin_account.as_ref()],
        program,
    )
}

/// Derive the claims note account owned by a borrower ledger
pub fn user_claims(program: &Pubkey, margin_user: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[USER_CLAIMS_SEED, margin_user.as_ref()], program)
}

/// Derive the collateral note account owned by a borrower ledger
pub fn user_collateral(program: &Pubkey, margin_user: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[USER_COLLATERAL_SEED, margin_user.as_ref()], program)
}

/// Derive the obligation account for a borrow order seed
pub fn obligation(program: &Pubkey, margin_user: &Pubkey, seed: &[u8]) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[OBLIGATION_SEED, margin_user.as_ref(), seed], program)
}

/// Derive a claim ticket for a holder in a market
pub fn claim_ticket(
    program: &Pubkey,
    market: &Pubkey,
    holder: &Pubkey,
    seed: &[u8],
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[CLAIM_TICKET_SEED, market.as_ref(), holder.as_ref(), seed],
        program,
    )
}

/// Derive a split ticket for an auto-staked lend order seed
pub fn split_ticket(program: &Pubkey, user: &Pubkey, seed: &[u8]) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SPLIT_TICKET_SEED, user.as_ref(), seed], program)
}
