use super::au::FinancialYear;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Failures of the CGT engine. Each one is fatal to the security it names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "type")]
pub enum CgtError {
    #[error(
        "{symbol}: sell of {requested} units on {sell_date} exceeds holdings of {available} (short {shortfall})"
    )]
    InsufficientLots {
        symbol: String,
        sell_date: NaiveDate,
        requested: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },
    #[error("{symbol}: trade on {trade_date} has invalid AUD rate {}", display_rate(.rate))]
    InvalidCurrencyRate {
        symbol: String,
        trade_date: NaiveDate,
        rate: Option<Decimal>,
    },
    #[error("{symbol}: trade date {date} is outside any recognised financial year")]
    UnsupportedYearBoundary { symbol: String, date: NaiveDate },
    #[error("{symbol}: AUD amount of trade on {trade_date} is out of range")]
    AmountOutOfRange { symbol: String, trade_date: NaiveDate },
    #[error("opening carried loss must not be negative, got {0}")]
    NegativeOpeningLoss(Decimal),
    #[error("financial year {next} processed after {previous}")]
    YearOutOfOrder {
        previous: FinancialYear,
        next: FinancialYear,
    },
}

impl CgtError {
    /// Security the failure belongs to, if any
    pub fn symbol(&self) -> Option<&str> {
        match self {
            CgtError::InsufficientLots { symbol, .. }
            | CgtError::InvalidCurrencyRate { symbol, .. }
            | CgtError::UnsupportedYearBoundary { symbol, .. }
            | CgtError::AmountOutOfRange { symbol, .. } => Some(symbol),
            CgtError::NegativeOpeningLoss(_) | CgtError::YearOutOfOrder { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CgtError::InsufficientLots { .. } => "InsufficientLots",
            CgtError::InvalidCurrencyRate { .. } => "InvalidCurrencyRate",
            CgtError::UnsupportedYearBoundary { .. } => "UnsupportedYearBoundary",
            CgtError::AmountOutOfRange { .. } => "AmountOutOfRange",
            CgtError::NegativeOpeningLoss(_) => "NegativeOpeningLoss",
            CgtError::YearOutOfOrder { .. } => "YearOutOfOrder",
        }
    }
}

fn display_rate(rate: &Option<Decimal>) -> String {
    rate.map_or("(missing)".to_string(), |r| r.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn insufficient_lots_message_names_shortfall() {
        let err = CgtError::InsufficientLots {
            symbol: "TSLA".to_string(),
            sell_date: NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
            requested: dec!(10),
            available: dec!(4),
            shortfall: dec!(6),
        };
        assert_eq!(
            err.to_string(),
            "TSLA: sell of 10 units on 2023-02-01 exceeds holdings of 4 (short 6)"
        );
        assert_eq!(err.symbol(), Some("TSLA"));
    }

    #[test]
    fn missing_rate_message() {
        let err = CgtError::InvalidCurrencyRate {
            symbol: "MSFT".to_string(),
            trade_date: NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
            rate: None,
        };
        assert!(err.to_string().ends_with("invalid AUD rate (missing)"));
        assert_eq!(err.kind(), "InvalidCurrencyRate");
    }
}
