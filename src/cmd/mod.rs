pub mod lots;
pub mod realizations;
pub mod schema;
pub mod summary;
pub mod validate;

use crate::core::{calculate_cgt, CgtReport, CgtRules, EntityType, FinancialYear, RunOptions};
use crate::import::{self, Broker, ImportOutcome, RejectedRow};
use anyhow::Context;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

/// Inputs and tax rules shared by every reporting command
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Trade files (CSV, XLSX or JSON). "-" reads canonical CSV from stdin
    #[arg(short, long = "trades", required = true, num_args = 1..)]
    trades: Vec<PathBuf>,

    /// Broker export layout of the trade files
    #[arg(short, long, value_enum, default_value_t = BrokerArg::Stake)]
    broker: BrokerArg,

    /// Taxpayer type, which sets the CGT discount rate
    #[arg(long, value_enum, default_value_t = EntityArg::Individual)]
    entity: EntityArg,

    /// Net capital loss (AUD) brought forward into the earliest year
    #[arg(long, default_value = "0")]
    opening_loss: Decimal,

    /// Last financial year the rules are known for (e.g., 2025 for 2024/25)
    #[arg(long)]
    latest_year: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum BrokerArg {
    #[default]
    Stake,
    Webull,
}

impl From<BrokerArg> for Broker {
    fn from(arg: BrokerArg) -> Self {
        match arg {
            BrokerArg::Stake => Broker::Stake,
            BrokerArg::Webull => Broker::Webull,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum EntityArg {
    #[default]
    Individual,
    Trust,
    SuperFund,
    Company,
}

impl From<EntityArg> for EntityType {
    fn from(arg: EntityArg) -> Self {
        match arg {
            EntityArg::Individual => EntityType::Individual,
            EntityArg::Trust => EntityType::Trust,
            EntityArg::SuperFund => EntityType::SuperFund,
            EntityArg::Company => EntityType::Company,
        }
    }
}

/// Result of reading the inputs and running the engine
pub struct Run {
    pub rules: CgtRules,
    pub report: CgtReport,
    pub rejected: Vec<RejectedRow>,
}

impl Run {
    /// Rejected rows and failed securities, as printable lines
    pub fn problems(&self) -> Vec<String> {
        let rejected = self
            .rejected
            .iter()
            .map(|r| format!("{} row {}: {}", r.source, r.row, r.reason));
        let failed = self.report.errors.iter().map(|e| e.to_string());
        rejected.chain(failed).collect()
    }

    /// Report problems on stderr and exit non-zero if there were any
    pub fn exit_on_problems(&self) {
        let problems = self.problems();
        if problems.is_empty() {
            return;
        }
        eprintln!();
        eprintln!("{} problem(s) found; affected trades are excluded:", problems.len());
        for problem in &problems {
            eprintln!("  {}", problem);
        }
        std::process::exit(1);
    }
}

impl InputArgs {
    pub fn rules(&self) -> CgtRules {
        CgtRules {
            entity: self.entity.into(),
            latest_year: self.latest_year.map(FinancialYear),
            ..CgtRules::default()
        }
    }

    /// Read every trade file, continuing past rejected rows
    pub fn load(&self) -> anyhow::Result<ImportOutcome> {
        let broker: Broker = self.broker.into();
        let mut outcome = ImportOutcome::default();
        for path in &self.trades {
            let read = if path.as_os_str() == "-" {
                read_from_stdin()?
            } else {
                import::read_trades(path, broker)
                    .with_context(|| format!("Failed to read trades from {}", path.display()))?
            };
            outcome.extend(read);
        }
        Ok(outcome)
    }

    pub fn run(&self) -> anyhow::Result<Run> {
        if self.opening_loss < Decimal::ZERO {
            anyhow::bail!("--opening-loss must not be negative");
        }
        let outcome = self.load()?;
        let rules = self.rules();
        let report = calculate_cgt(
            outcome.trades,
            &rules,
            RunOptions {
                opening_loss: self.opening_loss,
            },
        );
        Ok(Run {
            rules,
            report,
            rejected: outcome.rejected,
        })
    }
}

fn read_from_stdin() -> anyhow::Result<ImportOutcome> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }

    Ok(import::stake::read_csv(io::Cursor::new(buffer), "stdin")?)
}

/// `$1,234.56`
pub fn format_aud(amount: Decimal) -> String {
    let cents = format!("{:.2}", amount.abs());
    let (whole, fraction) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("${}.{}", grouped, fraction)
}

/// `-$1,234.56` for negative amounts
pub fn format_aud_signed(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-{}", format_aud(amount))
    } else {
        format_aud(amount)
    }
}

pub fn format_units(units: Decimal) -> String {
    let s = format!("{:.8}", units);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

/// Holding period as `1y 2m 3d`, counting 365-day years and 30-day months
pub fn format_holding_period(days: i64) -> String {
    let years = days / 365;
    let months = (days % 365) / 30;
    let rest = (days % 365) % 30;
    let parts: Vec<String> = [(years, "y"), (months, "m"), (rest, "d")]
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{}{}", n, unit))
        .collect();
    if parts.is_empty() {
        "0d".to_string()
    } else {
        parts.join(" ")
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn formats_aud_with_separators() {
        assert_eq!(format_aud(dec!(0)), "$0.00");
        assert_eq!(format_aud(dec!(999.5)), "$999.50");
        assert_eq!(format_aud(dec!(1234.56)), "$1,234.56");
        assert_eq!(format_aud(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_aud_signed(dec!(-1234.5)), "-$1,234.50");
        assert_eq!(format_aud_signed(dec!(12)), "$12.00");
    }

    #[test]
    fn formats_units() {
        assert_eq!(format_units(dec!(10)), "10");
        assert_eq!(format_units(dec!(0.12500000)), "0.125");
    }

    #[test]
    fn formats_holding_period() {
        assert_eq!(format_holding_period(0), "0d");
        assert_eq!(format_holding_period(3), "3d");
        assert_eq!(format_holding_period(365), "1y");
        assert_eq!(format_holding_period(366), "1y 1d");
        assert_eq!(format_holding_period(365 + 63 + 3), "1y 2m 6d");
        assert_eq!(format_holding_period(60), "2m");
    }

    #[test]
    fn entity_arg_maps_to_discount() {
        assert_eq!(EntityType::from(EntityArg::SuperFund).discount_rate(), EntityType::SuperFund.discount_rate());
        assert_eq!(EntityType::from(EntityArg::Company).discount_rate(), Decimal::ZERO);
    }
}
