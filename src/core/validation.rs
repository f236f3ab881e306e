//! Request validation for new positions.
//!
//! Numeric fields arrive either as decimal strings (the canonical form, since
//! that is how rows are serialized back) or as plain JSON numbers. Every
//! problem found is reported as a [`FieldError`] so a client sees all of them
//! at once.
use crate::core::models::{AMOUNT_SCALE, NewPosition, RATE_SCALE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

const MAX_ASSET_LEN: usize = 16;
/// Amount columns hold 20 digits, 8 of them fractional.
const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);
/// Rate columns hold 5 digits, 2 of them fractional.
const MAX_RATE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: &str, message: impl Into<String>) -> Self {
        FieldError {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Body of `POST /api/lending` and `POST /api/borrowing`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRequest {
    #[serde(default)]
    pub asset: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub apy: Option<Value>,
    #[serde(default)]
    pub health_factor: Option<Value>,
}

impl PositionRequest {
    /// Validates a supply request. A health factor is ignored if present.
    pub fn into_lending(self) -> Result<NewPosition, Vec<FieldError>> {
        self.validate(false)
    }

    pub fn into_borrowing(self) -> Result<NewPosition, Vec<FieldError>> {
        self.validate(true)
    }

    fn validate(self, with_health_factor: bool) -> Result<NewPosition, Vec<FieldError>> {
        let mut errors = Vec::new();

        let asset = parse_asset(self.asset.as_ref(), &mut errors);
        let amount = parse_decimal(self.amount.as_ref(), "amount", &mut errors)
            .and_then(|d| check_amount(d, &mut errors));
        let apy = parse_decimal(self.apy.as_ref(), "apy", &mut errors)
            .and_then(|d| check_rate(d, "apy", &mut errors));
        let health_factor = match self.health_factor.as_ref() {
            Some(value) if with_health_factor && !value.is_null() => {
                parse_decimal(Some(value), "healthFactor", &mut errors)
                    .and_then(|d| check_rate(d, "healthFactor", &mut errors))
            }
            _ => None,
        };

        match (asset, amount, apy) {
            (Some(asset), Some(amount), Some(apy)) if errors.is_empty() => Ok(NewPosition {
                asset,
                amount,
                apy,
                health_factor,
            }),
            _ => Err(errors),
        }
    }
}

fn parse_asset(value: Option<&Value>, errors: &mut Vec<FieldError>) -> Option<String> {
    match value {
        None | Some(Value::Null) => {
            errors.push(FieldError::new("asset", "Required"));
            None
        }
        Some(Value::String(s)) => {
            let symbol = s.trim();
            if symbol.is_empty() {
                errors.push(FieldError::new("asset", "Asset symbol must not be empty"));
                None
            } else if symbol.chars().count() > MAX_ASSET_LEN {
                errors.push(FieldError::new(
                    "asset",
                    format!("Asset symbol must be at most {MAX_ASSET_LEN} characters"),
                ));
                None
            } else {
                Some(symbol.to_uppercase())
            }
        }
        Some(_) => {
            errors.push(FieldError::new("asset", "Expected a string"));
            None
        }
    }
}

fn parse_decimal(value: Option<&Value>, path: &str, errors: &mut Vec<FieldError>) -> Option<Decimal> {
    let text = match value {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(path, "Required"));
            return None;
        }
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            errors.push(FieldError::new(path, "Expected a decimal string or number"));
            return None;
        }
    };

    // Digit separators are accepted by the parser but not by the API
    let parsed = if text.contains('_') {
        None
    } else {
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .ok()
    };
    match parsed {
        Some(d) => Some(d),
        None => {
            errors.push(FieldError::new(path, format!("Invalid decimal value: {text}")));
            None
        }
    }
}

fn check_amount(amount: Decimal, errors: &mut Vec<FieldError>) -> Option<Decimal> {
    if amount <= Decimal::ZERO {
        errors.push(FieldError::new("amount", "Amount must be greater than zero"));
        return None;
    }
    with_scale(amount, AMOUNT_SCALE, MAX_AMOUNT, "amount", errors)
}

fn check_rate(rate: Decimal, path: &str, errors: &mut Vec<FieldError>) -> Option<Decimal> {
    with_scale(rate, RATE_SCALE, MAX_RATE, path, errors)
}

fn with_scale(
    value: Decimal,
    scale: u32,
    limit: Decimal,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Decimal> {
    if value.normalize().scale() > scale {
        errors.push(FieldError::new(
            path,
            format!("At most {scale} decimal places are allowed"),
        ));
        return None;
    }
    if value.abs() >= limit {
        errors.push(FieldError::new(path, format!("Value must be below {limit}")));
        return None;
    }
    let mut scaled = value;
    scaled.rescale(scale);
    Some(scaled)
}
