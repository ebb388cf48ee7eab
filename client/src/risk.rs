//! Margin valuation and risk projection
//!
//! Pull-based recomputation: callers hold immutable position snapshots
//! and call [`valuate`] or [`project_after_action`] on demand. Nothing
//! here caches, subscribes, or mutates caller state.
//!
//! Value scales: oracle prices are 1e6, collateral weights and leverage
//! are basis points, the risk indicator is 1e6. The risk thresholds are
//! shared with the ledger program's enforcement and must match it
//! bit-for-bit.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;

use crate::error::{Result, TenorError};
use tenor_math::BPS;

/// Oracle price scale (1e6)
pub const PRICE_SCALE: u128 = 1_000_000;

/// Risk indicator scale (1e6)
pub const RISK_SCALE: u128 = 1_000_000;

/// Risk at or above this level shows a warning (0.80)
pub const RISK_WARNING_LEVEL: u64 = 800_000;
/// Risk at or above this level is critical (0.90)
pub const RISK_CRITICAL_LEVEL: u64 = 900_000;
/// Risk at or above this level is subject to liquidation (1.00)
pub const RISK_LIQUIDATION_LEVEL: u64 = 1_000_000;

/// What a position represents in the margin account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionKind {
    /// Placeholder registered but unused position
    None,
    /// Deposited collateral
    Deposit,
    /// Borrowed balance owed back to a pool
    Claim,
}

/// One token balance in a margin account
///
/// A margin account holds at most one position per (token, kind) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub token: Pubkey,
    pub kind: PositionKind,
    /// Balance in token-native units
    pub balance: u64,
}

/// Caller-supplied risk parameters for one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Haircut applied to deposit value, in basis points (<= 10_000)
    pub collateral_weight_bps: u64,
    /// Maximum leverage for claims against this pool, in basis points
    /// (40_000 = 4x)
    pub max_leverage_bps: u64,
}

impl Default for PoolConfig {
    /// Conservative fallback when a pool has no supplied config:
    /// deposits count for nothing, claims demand full collateral
    fn default() -> Self {
        Self {
            collateral_weight_bps: 0,
            max_leverage_bps: BPS,
        }
    }
}

/// Hypothetical action applied by [`project_after_action`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Deposit,
    Withdraw,
    Borrow,
    Repay,
}

/// Risk band derived from the shared thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskBand {
    Healthy,
    Warning,
    Critical,
    Liquidatable,
}

/// Derived account summary; recomputed on every call, never stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    /// Sum of deposit values before haircuts (1e6 scale)
    pub deposited_value: u128,
    /// Sum of claim values (1e6 scale)
    pub borrowed_value: u128,
    /// Deposit value after collateral weights (1e6 scale)
    pub weighted_collateral: u128,
    /// `weighted_collateral - borrowed_value`, reported even negative
    pub effective_collateral: i128,
    /// Minimum collateral demanded by open claims and leverage limits
    pub required_collateral: u128,
    /// `(borrowed + required) / weighted`, 1e6 scale, saturating
    pub risk_indicator: u64,
    /// Tokens skipped because the price set had no entry for them;
    /// non-empty means the valuation is degraded, not wrong
    pub missing_prices: Vec<Pubkey>,
}

impl Valuation {
    /// Band the risk indicator falls in
    pub fn band(&self) -> RiskBand {
        if self.risk_indicator >= RISK_LIQUIDATION_LEVEL {
            RiskBand::Liquidatable
        } else if self.risk_indicator >= RISK_CRITICAL_LEVEL {
            RiskBand::Critical
        } else if self.risk_indicator >= RISK_WARNING_LEVEL {
            RiskBand::Warning
        } else {
            RiskBand::Healthy
        }
    }

    /// True when at least one position had no price
    pub fn is_degraded(&self) -> bool {
        !self.missing_prices.is_empty()
    }
}

fn position_value(balance: u64, price: u64) -> Result<u128> {
    (balance as u128)
        .checked_mul(price as u128)
        .map(|v| v / PRICE_SCALE)
        .ok_or(TenorError::ArithmeticOverflow)
}

/// Value a position set against caller-supplied prices and pool configs
///
/// A position with no price is never silently valued at zero: it is
/// skipped from every sum and reported in `missing_prices` so callers
/// can treat the result as degraded (the `expect_price = false` escape
/// hatch for broken oracles).
pub fn valuate(
    positions: &[Position],
    configs: &HashMap<Pubkey, PoolConfig>,
    prices: &HashMap<Pubkey, u64>,
) -> Result<Valuation> {
    let mut deposited_value: u128 = 0;
    let mut borrowed_value: u128 = 0;
    let mut weighted_collateral: u128 = 0;
    let mut required_collateral: u128 = 0;
    let mut missing_prices = Vec::new();

    for position in positions {
        if position.kind == PositionKind::None || position.balance == 0 {
            continue;
        }
        let price = match prices.get(&position.token) {
            Some(price) => *price,
            None => {
                log::debug!("no price for token {}, degrading valuation", position.token);
                missing_prices.push(position.token);
                continue;
            }
        };
        let config = configs.get(&position.token).copied().unwrap_or_else(|| {
            log::debug!("no pool config for token {}, using conservative default", position.token);
            PoolConfig::default()
        });

        let value = position_value(position.balance, price)?;
        match position.kind {
            PositionKind::Deposit => {
                deposited_value = deposited_value
                    .checked_add(value)
                    .ok_or(TenorError::ArithmeticOverflow)?;
                let weighted = value
                    .checked_mul(config.collateral_weight_bps as u128)
                    .ok_or(TenorError::ArithmeticOverflow)?
                    / BPS as u128;
                weighted_collateral = weighted_collateral
                    .checked_add(weighted)
                    .ok_or(TenorError::ArithmeticOverflow)?;
            }
            PositionKind::Claim => {
                borrowed_value = borrowed_value
                    .checked_add(value)
                    .ok_or(TenorError::ArithmeticOverflow)?;
                if config.max_leverage_bps == 0 {
                    return Err(TenorError::ZeroDivision);
                }
                let required = value
                    .checked_mul(BPS as u128)
                    .ok_or(TenorError::ArithmeticOverflow)?
                    / config.max_leverage_bps as u128;
                required_collateral = required_collateral
                    .checked_add(required)
                    .ok_or(TenorError::ArithmeticOverflow)?;
            }
            PositionKind::None => {}
        }
    }

    let effective_collateral = weighted_collateral as i128 - borrowed_value as i128;
    let risk_indicator = risk_indicator(borrowed_value, required_collateral, weighted_collateral)?;

    Ok(Valuation {
        deposited_value,
        borrowed_value,
        weighted_collateral,
        effective_collateral,
        required_collateral,
        risk_indicator,
        missing_prices,
    })
}

/// Normalized risk scalar: non-decreasing in liabilities, non-increasing
/// in weighted collateral. Zero liabilities are always risk zero; any
/// liability against zero collateral saturates.
fn risk_indicator(borrowed: u128, required: u128, weighted: u128) -> Result<u64> {
    let liabilities = borrowed
        .checked_add(required)
        .ok_or(TenorError::ArithmeticOverflow)?;
    if liabilities == 0 {
        return Ok(0);
    }
    if weighted == 0 {
        return Ok(u64::MAX);
    }
    let scaled = liabilities
        .checked_mul(RISK_SCALE)
        .ok_or(TenorError::ArithmeticOverflow)?
        / weighted;
    Ok(u64::try_from(scaled).unwrap_or(u64::MAX))
}

/// Re-value after a hypothetical action, without touching the input
///
/// Applies a single balance delta to the position selected by `token`
/// and `action`, then reruns [`valuate`] on the copy. A borrow credits
/// the borrowed token to deposits as well as claims (matched funds land
/// in the account); a repay debits both.
pub fn project_after_action(
    positions: &[Position],
    configs: &HashMap<Pubkey, PoolConfig>,
    prices: &HashMap<Pubkey, u64>,
    token: Pubkey,
    amount: u64,
    action: Action,
) -> Result<Valuation> {
    let mut projected = positions.to_vec();

    match action {
        Action::Deposit => adjust(&mut projected, token, PositionKind::Deposit, amount as i128)?,
        Action::Withdraw => {
            adjust(&mut projected, token, PositionKind::Deposit, -(amount as i128))?
        }
        Action::Borrow => {
            adjust(&mut projected, token, PositionKind::Claim, amount as i128)?;
            adjust(&mut projected, token, PositionKind::Deposit, amount as i128)?;
        }
        Action::Repay => {
            adjust(&mut projected, token, PositionKind::Claim, -(amount as i128))?;
            adjust(&mut projected, token, PositionKind::Deposit, -(amount as i128))?;
        }
    }

    valuate(&projected, configs, prices)
}

fn adjust(
    positions: &mut Vec<Position>,
    token: Pubkey,
    kind: PositionKind,
    delta: i128,
) -> Result<()> {
    let index = match positions
        .iter()
        .position(|p| p.token == token && p.kind == kind)
    {
        Some(i) => i,
        None => {
            positions.push(Position {
                token,
                kind,
                balance: 0,
            });
            positions.len() - 1
        }
    };
    let position = &mut positions[index];

    let next = position.balance as i128 + delta;
    if next < 0 {
        return Err(TenorError::ArithmeticUnderflow);
    }
    position.balance = u64::try_from(next).map_err(|_| TenorError::ArithmeticOverflow)?;
    Ok(())
}
