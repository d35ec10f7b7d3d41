//! Currency conversion against a rates snapshot.
//!
//! All rates are expressed as units of a currency per one unit of the
//! snapshot's base, so a conversion goes through the base:
//! `amount / rates[from] * rates[to]`. No rounding is applied here.

use super::currency::RatesSnapshot;
use super::error::ConvertError;
use std::collections::HashMap;

/// Converts `amount` from one currency to another using `rates`.
///
/// Converting a currency to itself returns `amount` without looking at
/// `rates` at all.
pub fn convert_amount(
    amount: f64,
    from: &str,
    to: &str,
    rates: &HashMap<String, f64>,
) -> Result<f64, ConvertError> {
    convert_with(amount, from, to, |code| rates.get(code).copied())
}

pub(crate) fn convert_with(
    amount: f64,
    from: &str,
    to: &str,
    lookup: impl Fn(&str) -> Option<f64>,
) -> Result<f64, ConvertError> {
    if from == to {
        return Ok(amount);
    }

    let rate_from = finite_rate(from, &lookup)?;
    let rate_to = finite_rate(to, &lookup)?;

    let amount_in_base = amount / rate_from;
    Ok(amount_in_base * rate_to)
}

fn finite_rate(code: &str, lookup: &impl Fn(&str) -> Option<f64>) -> Result<f64, ConvertError> {
    lookup(code)
        .filter(|rate| rate.is_finite())
        .ok_or_else(|| ConvertError::UnknownCurrency(code.to_string()))
}

/// An amount to convert together with the currency pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

impl ConversionRequest {
    pub fn new(amount: f64, from: &str, to: &str) -> Self {
        Self {
            amount,
            from: from.to_uppercase(),
            to: to.to_uppercase(),
        }
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
    }
}

/// Outcome of evaluating a request against whatever rates are loaded.
///
/// `NotReady` and `Invalid` are both shown as a blank value; only fetch
/// failures are reported to the user as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    NotReady,
    Ready(f64),
    Invalid(ConvertError),
}

impl Conversion {
    pub fn value(&self) -> Option<f64> {
        match self {
            Conversion::Ready(value) => Some(*value),
            _ => None,
        }
    }
}

pub fn evaluate(request: &ConversionRequest, snapshot: Option<&RatesSnapshot>) -> Conversion {
    if !request.amount.is_finite() || request.amount < 0.0 {
        return Conversion::Invalid(ConvertError::InvalidAmount(request.amount));
    }

    if request.from == request.to {
        return Conversion::Ready(request.amount);
    }

    let Some(snapshot) = snapshot else {
        return Conversion::NotReady;
    };

    match snapshot.convert(request.amount, &request.from, &request.to) {
        Ok(value) if value.is_finite() => Conversion::Ready(value),
        Ok(_) => Conversion::Invalid(ConvertError::OutOfRange {
            amount: request.amount,
            from: request.from.clone(),
            to: request.to.clone(),
        }),
        Err(e) => Conversion::Invalid(e),
    }
}
