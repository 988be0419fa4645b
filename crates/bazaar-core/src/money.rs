//! Money arithmetic helpers.
//!
//! Amounts are `rust_decimal::Decimal` values in the marketplace currency's
//! major unit. Rounding is always half away from zero to two places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept for every monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Rounds an amount to two decimal places, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Multiplies a unit price by a quantity without rounding.
#[must_use]
pub fn line_total(unit_price: Decimal, qty: u32) -> Decimal {
    unit_price * Decimal::from(qty)
}

/// A flat-rate VAT split of a VAT-inclusive amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VatBreakdown {
    /// Amount excluding VAT.
    pub net: Decimal,
    /// VAT portion.
    pub vat: Decimal,
    /// The VAT-inclusive amount that was split.
    pub gross: Decimal,
    /// Rate applied, in percent.
    pub rate_percent: Decimal,
}

impl VatBreakdown {
    /// Splits a VAT-inclusive `gross` amount at `rate_percent`.
    ///
    /// The net part is rounded and the VAT is the remainder, so
    /// `net + vat == gross` always holds.
    #[must_use]
    pub fn split(gross: Decimal, rate_percent: Decimal) -> Self {
        let divisor = Decimal::ONE + rate_percent / Decimal::ONE_HUNDRED;
        let net = if divisor.is_zero() {
            gross
        } else {
            round_money(gross / divisor)
        };
        Self {
            net,
            vat: gross - net,
            gross,
            rate_percent,
        }
    }
}
