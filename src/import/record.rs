use crate::core::{Side, TradeEvent};
use audcgt_derive::CsvSchema;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One column of the canonical trade CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumn {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// Why a row was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("{field} '{value}' is not a number")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field} '{value}' is not a date")]
    InvalidDate { field: &'static str, value: String },
    #[error("unknown side '{0}'")]
    UnknownSide(String),
    #[error("units must be positive, got {0}")]
    NonPositiveUnits(Decimal),
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: Decimal },
    #[error("invalid AUD rate {}", .0.map_or("(missing)".to_string(), |r| r.to_string()))]
    InvalidCurrencyRate(Option<Decimal>),
    #[error("{field} is too large")]
    OutOfRange { field: &'static str },
    #[error("unreadable row: {0}")]
    Malformed(String),
}

/// Canonical trade row, using the Stake "Wall St Equities" column names
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, CsvSchema)]
pub struct TradeRecord {
    /// Date the trade was executed (YYYY-MM-DD or DD/MM/YYYY)
    #[serde(rename = "Trade Date")]
    pub trade_date: String,
    /// Date the trade settled
    #[serde(rename = "Settlement Date")]
    pub settlement_date: String,
    /// Ticker of the security
    #[serde(rename = "Symbol")]
    pub symbol: String,
    /// Buy or Sell, any casing
    #[serde(rename = "Side")]
    pub side: String,
    /// Broker reference for the trade
    #[serde(rename = "Trade Identifier", default)]
    pub trade_id: Option<String>,
    /// Number of units; sign is ignored
    #[serde(rename = "Units")]
    pub units: String,
    /// Average price per unit in trade currency
    #[serde(rename = "Avg. Price")]
    pub avg_price: String,
    /// Gross value in trade currency, sign ignored; units x price when absent
    #[serde(rename = "Value", default)]
    pub value: Option<String>,
    /// Brokerage in trade currency
    #[serde(rename = "Fees", default)]
    pub fees: Option<String>,
    /// GST on brokerage in trade currency
    #[serde(rename = "GST", default)]
    pub gst: Option<String>,
    /// Value after fees as reported by the broker (informational)
    #[serde(rename = "Total Value", default)]
    pub total_value: Option<String>,
    /// Trade currency code (e.g. USD)
    #[serde(rename = "Currency")]
    pub currency: String,
    /// Multiplier from trade currency to AUD at the trade date
    #[serde(rename = "AUD/USD rate", default)]
    pub aud_rate: Option<String>,
}

/// JSON input root
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TradeInput {
    pub trades: Vec<TradeRecord>,
}

impl TradeRecord {
    /// Validate the row and build a trade event from it
    pub fn to_event(&self) -> Result<TradeEvent, RowError> {
        let symbol = self.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(RowError::Missing("Symbol"));
        }
        let side = Side::parse(&self.side).ok_or_else(|| RowError::UnknownSide(self.side.clone()))?;
        let trade_date = parse_date("Trade Date", &self.trade_date)?;
        let settlement_date = parse_date("Settlement Date", &self.settlement_date)?;

        let units = parse_amount("Units", &self.units)?.abs();
        if units <= Decimal::ZERO {
            return Err(RowError::NonPositiveUnits(units));
        }
        let unit_price = non_negative("Avg. Price", parse_amount("Avg. Price", &self.avg_price)?)?;
        let fees = non_negative("Fees", optional_amount("Fees", &self.fees)?.unwrap_or_default())?;
        let gst = non_negative("GST", optional_amount("GST", &self.gst)?.unwrap_or_default())?;

        let currency = self.currency.trim().to_uppercase();
        if currency.is_empty() {
            return Err(RowError::Missing("Currency"));
        }
        let aud_rate = match optional_amount("AUD/USD rate", &self.aud_rate)? {
            Some(rate) if rate > Decimal::ZERO => rate,
            // AUD trades convert at par; nothing else gets a default
            None if currency == "AUD" => Decimal::ONE,
            other => return Err(RowError::InvalidCurrencyRate(other)),
        };

        let computed = units
            .checked_mul(unit_price)
            .ok_or(RowError::OutOfRange { field: "Value" })?;
        let value = match optional_amount("Value", &self.value)? {
            Some(reported) => {
                let reported = reported.abs();
                if (reported - computed).abs() > Decimal::new(1, 2) {
                    log::warn!(
                        "{} on {}: reported value {} differs from units x price {}",
                        symbol,
                        trade_date,
                        reported,
                        computed
                    );
                }
                reported
            }
            None => computed,
        };

        let event = TradeEvent {
            id: non_blank(&self.trade_id).map(str::to_string),
            symbol,
            side,
            trade_date,
            settlement_date,
            units,
            unit_price,
            value,
            fees,
            gst,
            currency,
            aud_rate,
        };
        if event.aud_amount().is_none() {
            return Err(RowError::OutOfRange { field: "AUD amount" });
        }
        Ok(event)
    }
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn non_negative(field: &'static str, value: Decimal) -> Result<Decimal, RowError> {
    if value < Decimal::ZERO {
        Err(RowError::Negative { field, value })
    } else {
        Ok(value)
    }
}

fn optional_amount(field: &'static str, value: &Option<String>) -> Result<Option<Decimal>, RowError> {
    non_blank(value).map(|v| parse_amount(field, v)).transpose()
}

/// Parse a money or quantity cell: "$1,234.50", "-3", "(12.00)"
pub fn parse_amount(field: &'static str, value: &str) -> Result<Decimal, RowError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RowError::Missing(field));
    }
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    let parsed = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| RowError::InvalidNumber {
            field,
            value: value.to_string(),
        })?;
    Ok(if negative { -parsed } else { parsed })
}

/// ISO dates first, then day-first Australian dates
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, RowError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RowError::Missing(field));
    }
    const FORMATS: &[&str] = &["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y"];
    FORMATS
        .iter()
        .find_map(|format| {
            NaiveDate::parse_from_str(trimmed, format).ok().or_else(|| {
                chrono::NaiveDateTime::parse_from_str(trimmed, format)
                    .ok()
                    .map(|dt| dt.date())
            })
        })
        .ok_or_else(|| RowError::InvalidDate {
            field,
            value: value.to_string(),
        })
}
