//! Bounds for stored quantities and prices.
//!
//! Every quantity, price and stock figure is persisted as `NUMERIC(18, 4)`, so
//! the domain accepts only values that column can hold exactly. Both stores
//! then agree: nothing is rounded on the way in and nothing overflows on the
//! way out.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Maximum number of fractional digits.
pub const AMOUNT_SCALE: u32 = 4;

/// Maximum number of integer digits.
pub const AMOUNT_INTEGER_DIGITS: u32 = 14;

fn limit() -> Decimal {
    Decimal::from(10i64.pow(AMOUNT_INTEGER_DIGITS))
}

/// Accept `value` if it fits the storage bounds; `field` names it in the error.
pub fn checked_amount(field: &str, value: Decimal) -> DomainResult<Decimal> {
    if value.normalize().scale() > AMOUNT_SCALE {
        return Err(DomainError::invalid_argument(format!(
            "{field} allows at most {AMOUNT_SCALE} decimal places"
        )));
    }
    if value.abs() >= limit() {
        return Err(DomainError::invalid_argument(format!(
            "{field} must be smaller than 10^{AMOUNT_INTEGER_DIGITS} in magnitude"
        )));
    }
    Ok(value)
}
