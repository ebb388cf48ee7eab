//! Tenor client SDK
//!
//! Client-side computation layer for fixed-term margin markets: values
//! collateral/debt positions, derives program addresses, converts
//! between rates and fp32 limit prices, and assembles unsigned
//! instructions for an external signing layer. It never mutates ledger
//! state; snapshots come in as raw bytes and instructions go out
//! unsigned.

pub mod decode;
pub mod derive;
pub mod error;
pub mod market;
pub mod orderbook;
pub mod orders;
pub mod risk;
pub mod state;

pub use error::{Result, TenorError};
pub use market::Market;
pub use orderbook::{BookOrder, BookSide, OrderbookView};
pub use orders::{OrderParams, OrderStatus, LIMIT_PRICE_UNSET};
pub use risk::{Action, PoolConfig, Position, PositionKind, RiskBand, Valuation};
pub use state::{AccountRecord, RecordKind};

pub use tenor_math::{fp32_div, fp32_mul, price_to_rate, rate_to_price, BPS, FP32_ONE};
