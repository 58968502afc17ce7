//! Fixed-point amounts
//!
//! All monetary values use `rust_decimal::Decimal` for deterministic
//! arithmetic. Amounts that enter a hash preimage are normalized first so
//! that `1.0` and `1` commit to the same bytes.

use rust_decimal::Decimal;

/// Monetary amount in bridge units.
pub type Amount = Decimal;

/// Canonical 16-byte encoding of an amount for hashing.
///
/// Trailing zeros are stripped before serialization, so numerically equal
/// amounts always encode identically.
pub fn canonical_amount_bytes(amount: Amount) -> [u8; 16] {
    amount.normalize().serialize()
}

/// Build an amount from whole units and a fractional scale, e.g. `units(5, 1)` = 0.5.
pub fn units(mantissa: i64, scale: u32) -> Amount {
    Decimal::new(mantissa, scale)
}
