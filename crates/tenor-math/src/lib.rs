//! Pure fixed-point math for fixed-term markets
//! No Solana dependencies, no unwrap/panic, all functions total

#![no_std]

pub mod price;
pub mod rate;

pub use price::*;
pub use rate::*;

/// Errors from checked fixed-point arithmetic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    /// Result does not fit the target width
    Overflow,
    /// Subtraction below zero
    Underflow,
    /// Division by zero (zero tenor or zero price)
    ZeroDivision,
}
