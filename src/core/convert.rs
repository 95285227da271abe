//! Converts amounts between currencies by pivoting through the base currency.
use crate::core::currency::CurrencySet;
use crate::core::error::ConversionError;
use crate::core::rates::RateTable;
use tracing::debug;

/// Rejects negative and non-finite amounts. Zero is a valid amount.
pub fn validate_amount(amount: f64) -> Result<f64, ConversionError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ConversionError::InvalidAmount(amount));
    }
    Ok(amount)
}

/// Converts `amount` from `source` to `target` using `table`.
///
/// Non-base pairs always go through the base currency; no direct cross rate
/// is ever consulted. Identity conversions never look at the table. The
/// result is not rounded.
pub fn convert(
    amount: f64,
    source: &str,
    target: &str,
    table: &RateTable,
    currencies: &CurrencySet,
) -> Result<f64, ConversionError> {
    let amount = validate_amount(amount)?;
    let source = currencies.resolve(source)?;
    let target = currencies.resolve(target)?;

    if source == target {
        return Ok(amount);
    }

    let base = table.base();
    let rate_of = |code: &str| {
        table
            .rate(code)
            .ok_or_else(|| ConversionError::MissingRate(code.to_string()))
    };

    let converted = if source == base {
        amount * rate_of(&target)?
    } else if target == base {
        amount / rate_of(&source)?
    } else {
        let in_base = amount / rate_of(&source)?;
        in_base * rate_of(&target)?
    };

    debug!("Converted {amount} {source} to {converted} {target} via {base}");
    Ok(converted)
}
