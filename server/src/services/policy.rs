use chrono::Duration;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::{ReservationError, Result};
use crate::models::StayDates;

/// Fixed commercial rules of the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    pub tax_rate: Decimal,
    /// How long after booking a guest may still cancel on their own.
    pub self_service_cancellation: Duration,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),
            self_service_cancellation: Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pricing {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub nights: i64,
    pub nightly_rate: Decimal,
    pub pricing: Pricing,
}

impl BookingPolicy {
    /// Tax is rounded half away from zero to whole cents.
    pub fn quote(&self, nightly_rate: Decimal, stay: &StayDates) -> Result<Quote> {
        let nights = stay.nights();
        let too_large = || {
            ReservationError::Validation(format!(
                "price of {nights} nights at {nightly_rate} is out of range"
            ))
        };
        let subtotal = nightly_rate
            .checked_mul(Decimal::from(nights))
            .ok_or_else(too_large)?;
        let tax = subtotal
            .checked_mul(self.tax_rate)
            .ok_or_else(too_large)?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let total = subtotal.checked_add(tax).ok_or_else(too_large)?;
        Ok(Quote {
            nights,
            nightly_rate,
            pricing: Pricing {
                subtotal,
                tax,
                total,
            },
        })
    }
}
