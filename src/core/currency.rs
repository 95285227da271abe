//! Supported currencies and display helpers

use crate::core::error::ConversionError;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
}

impl Currency {
    pub fn new(code: &str, name: &str, symbol: &str) -> Self {
        Currency {
            code: code.to_uppercase(),
            name: name.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

/// Built-in currency set used when the config does not list one.
pub fn default_currencies() -> Vec<Currency> {
    vec![
        Currency::new("ARS", "Peso Argentino", "$"),
        Currency::new("USD", "Dólar", "$"),
        Currency::new("EUR", "Euro", "€"),
        Currency::new("GBP", "Libra", "£"),
        Currency::new("JPY", "Yen", "¥"),
    ]
}

/// The fixed set of currencies a session can convert between.
#[derive(Debug, Clone)]
pub struct CurrencySet {
    base: String,
    currencies: Vec<Currency>,
}

impl CurrencySet {
    pub fn new(base: &str, currencies: Vec<Currency>) -> Result<Self> {
        let base = base.to_uppercase();
        let mut normalized: Vec<Currency> = Vec::with_capacity(currencies.len());
        for currency in currencies {
            let currency = Currency {
                code: currency.code.to_uppercase(),
                ..currency
            };
            if normalized.iter().any(|c| c.code == currency.code) {
                bail!("Duplicate currency code in configuration: {}", currency.code);
            }
            normalized.push(currency);
        }
        if !normalized.iter().any(|c| c.code == base) {
            bail!("Base currency {base} is not in the supported currency set");
        }
        Ok(CurrencySet {
            base,
            currencies: normalized,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn iter(&self) -> impl Iterator<Item = &Currency> {
        self.currencies.iter()
    }

    pub fn get(&self, code: &str) -> Option<&Currency> {
        self.currencies
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Resolves user input to the canonical code of a supported currency.
    pub fn resolve(&self, code: &str) -> Result<String, ConversionError> {
        self.get(code)
            .map(|c| c.code.clone())
            .ok_or_else(|| ConversionError::UnknownCurrency(code.to_string()))
    }

    pub fn symbol(&self, code: &str) -> &str {
        self.get(code).map_or("", |c| c.symbol.as_str())
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}

/// Formats an amount with two decimals, `.` thousands and `,` decimal separators.
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}{grouped},{frac_part}")
}
