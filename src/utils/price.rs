use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price is empty")]
    Empty,
    #[error("price is not a number: {0}")]
    Malformed(String),
    #[error("price cannot be negative")]
    Negative,
    #[error("price has more than two decimal places")]
    TooPrecise,
}

/// Parses `199.90`, `199,90` or the legacy display form `R$ 3.999,90`.
/// When a comma is present it is the decimal separator and dots are
/// thousands separators.
pub fn parse_price(input: &str) -> Result<Decimal, PriceError> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix("R$").unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        return Err(PriceError::Empty);
    }

    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };

    let price = Decimal::from_str(&normalized)
        .map_err(|_| PriceError::Malformed(input.trim().to_string()))?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(PriceError::Negative);
    }
    if price.normalize().scale() > 2 {
        return Err(PriceError::TooPrecise);
    }
    Ok(price)
}

/// Display form used by the storefront, e.g. `R$ 199,90`.
pub fn format_brl(price: Decimal) -> String {
    format!("R$ {:.2}", price.round_dp(2)).replace('.', ",")
}
