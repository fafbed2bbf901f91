//! Stake exports: the CSV download and the "Wall St Equities" workbook sheet.

use super::{check_columns, ImportError, ImportOutcome, RowError, TradeRecord};
use calamine::{open_workbook, Data, DataType, Reader, Xlsx};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;

/// Sheet holding US share trades in a Stake workbook
pub const EQUITIES_SHEET: &str = "Wall St Equities";

pub fn read_csv<R: Read>(reader: R, source: &str) -> Result<ImportOutcome, ImportError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    check_columns(headers.iter(), source)?;

    let mut outcome = ImportOutcome::default();
    for (index, result) in rdr.records().enumerate() {
        let row = index + 2;
        let result = result
            .map_err(|e| RowError::Malformed(e.to_string()))
            .and_then(|record| to_event(&record, &headers));
        outcome.push(source, row, result);
    }
    Ok(outcome)
}

pub fn read_xlsx(path: &Path) -> Result<ImportOutcome, ImportError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheets = workbook.sheet_names();
    if !sheets.iter().any(|s| s == EQUITIES_SHEET) {
        return Err(ImportError::MissingSheet {
            sheet: EQUITIES_SHEET.to_string(),
            available: sheets,
        });
    }
    let range = workbook.worksheet_range(EQUITIES_SHEET)?;
    let source = format!("{}[{}]", path.display(), EQUITIES_SHEET);

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(cell_text).collect::<StringRecord>(),
        None => return Err(ImportError::Empty(source)),
    };
    check_columns(headers.iter(), &source)?;

    let mut outcome = ImportOutcome::default();
    for (index, cells) in rows.enumerate() {
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        let record: StringRecord = cells.iter().map(cell_text).collect();
        outcome.push(&source, index + 2, to_event(&record, &headers));
    }
    Ok(outcome)
}

fn to_event(record: &StringRecord, headers: &StringRecord) -> Result<crate::core::TradeEvent, RowError> {
    let trade: TradeRecord = record
        .deserialize(Some(headers))
        .map_err(|e| RowError::Malformed(e.to_string()))?;
    trade.to_event()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::DateTime(_) => cell
            .as_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "Trade Date,Settlement Date,Symbol,Side,Trade Identifier,Units,Avg. Price,Value,Fees,GST,Total Value,Currency,AUD/USD rate";

    #[test]
    fn reads_stake_csv() {
        let csv = format!(
            "{HEADER}\n\
             2022-08-01,2022-08-03,NVDA,Buy,S-1,10,$180.00,\"$1,800.00\",$3.00,$0.00,\"$1,803.00\",USD,$1.4300\n\
             2022-09-01,2022-09-03,NVDA,Sell,S-2,-4,$140.00,-$560.00,$3.00,$0.00,$557.00,USD,$1.4600\n"
        );
        let outcome = read_csv(csv.as_bytes(), "stake.csv").unwrap();
        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.trades.len(), 2);
        let sell = &outcome.trades[1];
        assert_eq!(sell.units, dec!(4));
        assert_eq!(sell.value, dec!(560));
        assert_eq!(sell.aud_rate, dec!(1.46));
        assert_eq!(sell.id.as_deref(), Some("S-2"));
    }

    #[test]
    fn bad_rows_are_rejected_with_row_numbers() {
        let csv = format!(
            "{HEADER}\n\
             2022-08-01,2022-08-03,NVDA,Buy,S-1,10,180,1800,3,0,1803,USD,1.43\n\
             2022-08-02,2022-08-04,NVDA,Hold,S-2,10,180,1800,3,0,1803,USD,1.43\n\
             not a date,2022-08-04,NVDA,Buy,S-3,10,180,1800,3,0,1803,USD,1.43\n"
        );
        let outcome = read_csv(csv.as_bytes(), "stake.csv").unwrap();
        assert_eq!(outcome.trades.len(), 1);
        let rows: Vec<_> = outcome.rejected.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![3, 4]);
    }

    #[test]
    fn oversized_row_is_rejected_not_fatal() {
        let csv = format!(
            "{HEADER}\n\
             2022-08-01,2022-08-03,NVDA,Buy,S-1,10,180,1800,3,0,1803,USD,1.43\n\
             2022-08-02,2022-08-04,NVDA,Buy,S-2,100000000000000000000,10000000000,,0,0,,USD,1.43\n"
        );
        let outcome = read_csv(csv.as_bytes(), "stake.csv").unwrap();
        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].row, 3);
        assert!(outcome.rejected[0].reason.contains("too large"));
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let csv = "Trade Date,Settlement Date,Symbol,Side,Units,Avg. Price,Currency,AUD/USD rate\n\
                   2022-08-01,2022-08-03,AMD,BUY,5,100,USD,1.5\n";
        let outcome = read_csv(csv.as_bytes(), "min.csv").unwrap();
        let trade = &outcome.trades[0];
        assert_eq!(trade.value, dec!(500));
        assert_eq!(trade.fees, dec!(0));
        assert_eq!(trade.id, None);
    }

    #[test]
    fn missing_required_column_fails_file() {
        let csv = "Trade Date,Symbol,Side\n2022-08-01,AMD,Buy\n";
        assert!(matches!(
            read_csv(csv.as_bytes(), "bad.csv"),
            Err(ImportError::MissingColumns(_))
        ));
    }

    #[test]
    fn empty_input_fails_file() {
        assert!(matches!(read_csv("".as_bytes(), "empty.csv"), Err(ImportError::Empty(_))));
    }

    #[test]
    fn cell_text_formats_numbers_and_text() {
        assert_eq!(cell_text(&Data::Float(150.25)), "150.25");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::String(" Buy ".to_string())), "Buy");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
