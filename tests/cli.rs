//! E2E tests for the reporting commands

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::process::{Command, Output};

fn audcgt(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_audcgt"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Amounts are serialized as decimal strings
fn amount(value: &serde_json::Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

const STAKE: &str = "tests/data/stake_FY22_23.csv";
const PROBLEMS: &str = "tests/data/stake_problems.csv";
const WEBULL: &str = "tests/data/Webull_EOFY_Statement_2022_2023.csv";
const JSON: &str = "tests/data/trades.json";

#[test]
fn summary_of_stake_export() {
    let output = audcgt(&["summary", "-t", STAKE]);
    let stdout = stdout(&output);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("2022/23"));
    // 744 discountable gain less 300 loss, then halved
    assert!(stdout.contains("$744.00"));
    assert!(stdout.contains("$222.00"));
    assert!(stdout.contains("Net position: $444.00"));
}

#[test]
fn summary_json_applies_opening_loss() {
    let output = audcgt(&["summary", "-t", STAKE, "--opening-loss", "100", "--json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let year = &json["years"][0];
    assert_eq!(year["year"], "2022/23");
    assert_eq!(amount(&year["carried_loss_in"]), dec!(100));
    assert_eq!(amount(&year["net_capital_gain"]), dec!(172));
    assert_eq!(amount(&json["carried_loss"]), dec!(0));
}

#[test]
fn company_gets_no_discount() {
    let output = audcgt(&["summary", "-t", STAKE, "--entity", "company", "--json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["entity"], "company");
    assert_eq!(amount(&json["years"][0]["net_capital_gain"]), dec!(444));
}

#[test]
fn losses_carry_across_files_and_years() {
    let output = audcgt(&["summary", "-t", JSON, STAKE, "--json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let years = json["years"].as_array().unwrap();
    assert_eq!(years.len(), 2);
    assert_eq!(years[0]["year"], "2021/22");
    assert_eq!(amount(&years[0]["carried_loss_out"]), dec!(42));
    assert_eq!(amount(&years[1]["carried_losses_applied"]), dec!(42));
    assert_eq!(amount(&years[1]["net_capital_gain"]), dec!(201));
}

#[test]
fn realizations_table_shows_holding_period() {
    let output = audcgt(&["realizations", "-t", STAKE, "--symbol", "aapl"]);
    let stdout = stdout(&output);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("AAPL"));
    assert!(!stdout.contains("TSLA"));
    assert!(stdout.contains("$1,503.00"));
    assert!(stdout.contains("$2,247.00"));
    assert!(stdout.contains("1y 2m 1d"));
}

#[test]
fn realizations_csv_output() {
    let output = audcgt(&["realizations", "-t", STAKE, "--csv"]);
    let stdout = stdout(&output);

    assert!(output.status.success(), "Command failed: {:?}", output);
    let mut lines = stdout.lines();
    let header = lines.next().unwrap();
    assert!(header.contains("buy_date"));
    assert!(header.contains("discount_eligible"));
    let rows: Vec<_> = lines.collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("AAPL,2021-06-01,2022-08-01"));
    assert!(rows[1].contains("-300.00"));
}

#[test]
fn realizations_filtered_by_year() {
    let output = audcgt(&["realizations", "-t", STAKE, "--year", "2024", "--json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json.as_array().unwrap().is_empty());
}

#[test]
fn lots_lists_open_holdings() {
    let output = audcgt(&["lots", "-t", STAKE]);
    let stdout = stdout(&output);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("NVDA"));
    assert!(stdout.contains("$300.00"));
    assert!(!stdout.contains("AAPL"));
}

#[test]
fn webull_statement() {
    let output = audcgt(&["summary", "-t", WEBULL, "--broker", "webull", "--json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let year = &json["years"][0];
    assert_eq!(year["year"], "2022/23");
    assert_eq!(amount(&year["ordinary_gains"]), dec!(300));
    assert_eq!(amount(&year["net_capital_gain"]), dec!(300));
}

#[test]
fn validate_clean_file() {
    let output = audcgt(&["validate", "-t", STAKE]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout(&output).contains("No issues found"));
}

#[test]
fn validate_reports_problems_and_fails() {
    let output = audcgt(&["validate", "-t", PROBLEMS, "--json"]);
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["issue_count"], 2);
    let issues = json["issues"].as_array().unwrap();
    assert_eq!(issues[0]["type"], "RejectedRow");
    assert!(issues[0]["location"].as_str().unwrap().ends_with("row 6"));
    assert_eq!(issues[1]["type"], "InsufficientLots");
    assert_eq!(issues[1]["symbol"], "AMZN");
}

#[test]
fn summary_keeps_good_securities_but_exits_non_zero() {
    let output = audcgt(&["summary", "-t", PROBLEMS]);
    let stdout = stdout(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    // MSFT: 4 of 10 units, cost 1,400.00 against proceeds 1,456.00
    assert!(stdout.contains("$56.00"));
    assert!(stderr.contains("AMZN"));
    assert!(stderr.contains("row 6"));
}

#[test]
fn unsupported_year_is_reported() {
    let output = audcgt(&["validate", "-t", STAKE, "--latest-year", "2022"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("UnsupportedYearBoundary"));
}

#[test]
fn schema_csv_header() {
    let output = audcgt(&["schema", "csv-header"]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_eq!(
        stdout(&output).trim(),
        "Trade Date,Settlement Date,Symbol,Side,Trade Identifier,Units,Avg. Price,Value,Fees,GST,Total Value,Currency,AUD/USD rate"
    );
}

#[test]
fn schema_csv_fields_describes_signs() {
    let output = audcgt(&["schema", "csv-fields"]);
    let stdout = stdout(&output);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("Units and Value are taken as magnitudes"));
    assert!(stdout.contains("negative Avg. Price, Fees or GST rejects the row"));
    assert!(!stdout.contains("signs are ignored"));
}

#[test]
fn schema_json() {
    let output = audcgt(&["schema"]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["title"], "TradeInput");
}

#[test]
fn missing_file_fails() {
    let output = audcgt(&["summary", "-t", "tests/data/does_not_exist.csv"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does_not_exist.csv"));
}
