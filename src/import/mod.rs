//! Reading broker trade exports into trade events.
//!
//! Every source is first mapped onto [`TradeRecord`], the canonical Stake
//! layout, and then validated row by row. Rows that fail validation are
//! reported in [`ImportOutcome::rejected`] and never reach the engine.

mod record;
pub mod stake;
pub mod webull;

pub use record::{parse_amount, parse_date, CsvColumn, RowError, TradeInput, TradeRecord};

use crate::core::{FinancialYear, TradeEvent};
use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Failure to read a file as a whole
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to open workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),
    #[error("sheet '{sheet}' not found (available: {})", .available.join(", "))]
    MissingSheet {
        sheet: String,
        available: Vec<String>,
    },
    #[error("{0} is empty")]
    Empty(String),
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("unsupported file type for {broker}: {}", .path.display())]
    UnsupportedFormat { broker: Broker, path: PathBuf },
}

/// Broker export layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Broker {
    /// Stake "Wall St Equities" export, or the canonical layout
    #[default]
    Stake,
    Webull,
}

impl fmt::Display for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Broker::Stake => write!(f, "Stake"),
            Broker::Webull => write!(f, "Webull"),
        }
    }
}

/// A row left out of the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// File the row came from
    pub source: String,
    /// Row number as shown in a spreadsheet, header being row 1
    pub row: usize,
    pub reason: String,
}

/// Trades read from one or more files, with the rows that were rejected
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub trades: Vec<TradeEvent>,
    pub rejected: Vec<RejectedRow>,
}

impl ImportOutcome {
    pub fn extend(&mut self, other: ImportOutcome) {
        self.trades.extend(other.trades);
        self.rejected.extend(other.rejected);
    }

    pub(crate) fn push(&mut self, source: &str, row: usize, result: Result<TradeEvent, RowError>) {
        match result {
            Ok(trade) => self.trades.push(trade),
            Err(reason) => {
                log::warn!("{} row {}: {}", source, row, reason);
                self.rejected.push(RejectedRow {
                    source: source.to_string(),
                    row,
                    reason: reason.to_string(),
                });
            }
        }
    }
}

/// Read a trade file, picking the reader from the broker and extension
pub fn read_trades(path: &Path, broker: Broker) -> Result<ImportOutcome, ImportError> {
    let source = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let outcome = match (broker, extension.as_str()) {
        (Broker::Stake, "csv") => stake::read_csv(open(path)?, &source)?,
        (Broker::Stake, "xlsx") => stake::read_xlsx(path)?,
        (Broker::Stake, "json") => read_json(open(path)?, &source)?,
        (Broker::Webull, "csv") => webull::read_csv(open(path)?, &source)?,
        _ => {
            return Err(ImportError::UnsupportedFormat {
                broker,
                path: path.to_path_buf(),
            })
        }
    };

    log::info!(
        "Read {} trades from {} ({} rows rejected)",
        outcome.trades.len(),
        source,
        outcome.rejected.len()
    );
    if let Some(year) = FinancialYear::from_file_name(path) {
        let outside = outcome
            .trades
            .iter()
            .filter(|t| !year.contains(t.trade_date))
            .count();
        if outside > 0 {
            log::warn!("{} trades in {} fall outside {}", outside, source, year);
        }
    }
    Ok(outcome)
}

/// Canonical JSON input: `{ "trades": [ ... ] }`
pub fn read_json<R: Read>(reader: R, source: &str) -> Result<ImportOutcome, ImportError> {
    let input: TradeInput = serde_json::from_reader(reader)?;
    let mut outcome = ImportOutcome::default();
    for (index, record) in input.trades.iter().enumerate() {
        outcome.push(source, index + 1, record.to_event());
    }
    Ok(outcome)
}

fn open(path: &Path) -> Result<std::fs::File, ImportError> {
    std::fs::File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Fail unless every required canonical column is present
pub(crate) fn check_columns<'a, I>(headers: I, source: &str) -> Result<(), ImportError>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = headers.into_iter().map(str::trim).collect();
    if present.iter().all(|h| h.is_empty()) {
        return Err(ImportError::Empty(source.to_string()));
    }
    let missing: Vec<String> = TradeRecord::csv_columns()
        .iter()
        .filter(|c| c.required && !present.contains(&c.name))
        .map(|c| c.name.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::MissingColumns(missing))
    }
}
