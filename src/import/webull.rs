//! Webull end of financial year statements (Windows-1252 CSV, day-first dates).

use super::{ImportError, ImportOutcome, RowError, TradeRecord};
use encoding_rs::WINDOWS_1252;
use serde::Deserialize;
use std::io::Read;

const REQUIRED_COLUMNS: &[&str] = &[
    "Symbol&Name",
    "Trade Date",
    "Settlement Date",
    "Buy/Sell",
    "Quantity",
    "Trade Price",
    "Gross Amount",
    "Net Amount",
    "Comm/Fee/Tax",
    "GST",
];

#[derive(Debug, Deserialize)]
struct WebullRecord {
    #[serde(rename = "Symbol&Name")]
    symbol_and_name: String,
    #[serde(rename = "Trade Date")]
    trade_date: String,
    #[serde(rename = "Settlement Date")]
    settlement_date: String,
    #[serde(rename = "Buy/Sell")]
    side: String,
    #[serde(rename = "Quantity")]
    quantity: String,
    #[serde(rename = "Trade Price")]
    price: String,
    #[serde(rename = "Gross Amount")]
    gross_amount: Option<String>,
    #[serde(rename = "Net Amount")]
    net_amount: Option<String>,
    #[serde(rename = "Comm/Fee/Tax")]
    fees: Option<String>,
    #[serde(rename = "GST")]
    gst: Option<String>,
    #[serde(rename = "Currency", default)]
    currency: Option<String>,
    #[serde(rename = "AUD/USD rate", default)]
    aud_rate: Option<String>,
}

impl WebullRecord {
    /// Map onto the canonical layout. Statement amounts carry their sign as
    /// cash flow, so only magnitudes are kept.
    fn into_record(self, row: usize) -> TradeRecord {
        let symbol = self
            .symbol_and_name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        TradeRecord {
            trade_date: self.trade_date,
            settlement_date: self.settlement_date,
            symbol,
            side: self.side,
            trade_id: Some(format!("webull-{}", row)),
            units: self.quantity,
            avg_price: magnitude(&self.price),
            value: self.gross_amount.as_deref().map(magnitude),
            fees: self.fees.as_deref().map(magnitude),
            gst: self.gst.as_deref().map(magnitude),
            total_value: self.net_amount.as_deref().map(magnitude),
            currency: self
                .currency
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "USD".to_string()),
            aud_rate: self.aud_rate,
        }
    }
}

fn magnitude(value: &str) -> String {
    value
        .trim()
        .trim_start_matches('-')
        .trim_start_matches('(')
        .trim_end_matches(')')
        .to_string()
}

pub fn read_csv<R: Read>(mut reader: R, source: &str) -> Result<ImportOutcome, ImportError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| ImportError::Csv(e.into()))?;
    let (text, _, had_errors) = WINDOWS_1252.decode(&bytes);
    if had_errors {
        log::warn!("{}: some characters could not be decoded", source);
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = rdr.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(ImportError::Empty(source.to_string()));
    }
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !headers.iter().any(|h| h == **c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }

    let mut outcome = ImportOutcome::default();
    for (index, result) in rdr.deserialize::<WebullRecord>().enumerate() {
        let row = index + 2;
        let result = result
            .map_err(|e| RowError::Malformed(e.to_string()))
            .and_then(|record| record.into_record(row).to_event());
        outcome.push(source, row, result);
    }
    Ok(outcome)
}
