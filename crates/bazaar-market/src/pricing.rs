//! Purchase price computation.
//!
//! # Precision
//!
//! The payment for a purchase is `unitary_price × quantity / 10^decimals`.
//! The product of two `u64` values always fits in a `u128`, so the multiply
//! never overflows; only the final quotient is checked against `u64`.
//!
//! ## Rounding
//!
//! The divide truncates toward zero. A buyer purchasing a quantity whose
//! exact price has a fractional part pays the integer part only, e.g.
//! price 3 per whole unit, 1 smallest unit of a 1-decimal asset costs 0.

use bazaar_token::MAX_ASSET_DECIMALS;

/// Computes the payment for `quantity` smallest units at `unitary_price`
/// per whole unit of an asset with `decimals` decimals.
///
/// Returns `None` when the result does not fit in a `u64` or `decimals`
/// exceeds the supported maximum.
///
/// # Examples
/// ```
/// use bazaar_market::pricing::payment_for;
///
/// assert_eq!(payment_for(100, 50, 2), Some(50));
/// // truncation favours the buyer
/// assert_eq!(payment_for(3, 1, 1), Some(0));
/// // no decimals: plain multiplication
/// assert_eq!(payment_for(7, 6, 0), Some(42));
/// ```
#[must_use]
pub const fn payment_for(unitary_price: u64, quantity: u64, decimals: u8) -> Option<u64> {
    if decimals > MAX_ASSET_DECIMALS {
        return None;
    }

    let numerator = unitary_price as u128 * quantity as u128;
    let payment = numerator / 10u128.pow(decimals as u32);

    if payment > u64::MAX as u128 {
        None
    } else {
        Some(payment as u64)
    }
}
