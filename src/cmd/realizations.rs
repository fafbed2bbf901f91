//! Realizations command - every matched lot draw, grouped by security

use crate::cmd::{format_aud, format_aud_signed, format_holding_period, format_units, print_json, InputArgs};
use crate::core::{evaluate, FinancialYear, Realization};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct RealizationsCommand {
    #[command(flatten)]
    input: InputArgs,

    /// Financial year of the sale (e.g., 2023 for 2022/23)
    #[arg(short, long)]
    year: Option<i32>,

    /// Only this security (e.g., AAPL)
    #[arg(short, long)]
    symbol: Option<String>,

    /// Output as CSV
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct RealizationRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Bought")]
    buy_date: String,
    #[tabled(rename = "Sold")]
    sell_date: String,
    #[tabled(rename = "Units")]
    units: String,
    #[tabled(rename = "Cost Base")]
    cost_base: String,
    #[tabled(rename = "Proceeds")]
    proceeds: String,
    #[tabled(rename = "Gain/Loss")]
    gain: String,
    #[tabled(rename = "Held")]
    holding_period: String,
    #[tabled(rename = "Discount")]
    discount: String,
    #[tabled(rename = "FY")]
    financial_year: String,
}

/// Machine readable row: plain decimals, no currency formatting.
/// Every field is always written so CSV rows keep the header's shape.
#[derive(Debug, Serialize)]
struct RealizationRecord<'a> {
    symbol: &'a str,
    buy_date: String,
    sell_date: String,
    buy_id: Option<&'a str>,
    sell_id: Option<&'a str>,
    units: Decimal,
    cost_base: Decimal,
    proceeds: Decimal,
    gain: Decimal,
    holding_days: i64,
    discount_eligible: bool,
    financial_year: String,
}

impl<'a> From<&'a Realization> for RealizationRecord<'a> {
    fn from(r: &'a Realization) -> Self {
        RealizationRecord {
            symbol: &r.symbol,
            buy_date: r.buy_date.format("%Y-%m-%d").to_string(),
            sell_date: r.sell_date.format("%Y-%m-%d").to_string(),
            buy_id: r.buy_id.as_deref(),
            sell_id: r.sell_id.as_deref(),
            units: r.units,
            cost_base: r.cost_base,
            proceeds: r.proceeds,
            gain: evaluate(r).gain,
            holding_days: r.holding_days,
            discount_eligible: r.discount_eligible,
            financial_year: r.financial_year().display(),
        }
    }
}

impl RealizationsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let run = self.input.run()?;
        let year = self.year.map(FinancialYear);
        let symbol = self.symbol.as_deref();
        let realizations: Vec<&Realization> = run
            .report
            .all_realizations()
            .filter(|r| year.is_none_or(|fy| r.financial_year() == fy))
            .filter(|r| symbol.is_none_or(|s| r.symbol.eq_ignore_ascii_case(s)))
            .collect();

        if self.csv {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            for r in &realizations {
                wtr.serialize(RealizationRecord::from(*r))?;
            }
            wtr.flush()?;
        } else if self.json {
            let records: Vec<RealizationRecord> = realizations.iter().map(|r| RealizationRecord::from(*r)).collect();
            print_json(&records)?;
        } else {
            self.print_table(&realizations, year);
        }
        run.exit_on_problems();
        Ok(())
    }

    fn print_table(&self, realizations: &[&Realization], year: Option<FinancialYear>) {
        let year_str = year.map_or("All Years".to_string(), |y| y.display());
        if realizations.is_empty() {
            println!("No realizations found matching filters ({})", year_str);
            return;
        }

        println!();
        println!("REALIZATIONS ({})", year_str);
        println!();

        let mut start = 0;
        while start < realizations.len() {
            let symbol = &realizations[start].symbol;
            let end = realizations[start..]
                .iter()
                .position(|r| &r.symbol != symbol)
                .map_or(realizations.len(), |n| start + n);
            let group = &realizations[start..end];

            println!("{}", symbol);
            let rows: Vec<RealizationRow> = group.iter().map(|r| row(r)).collect();
            let table = Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
                .to_string();
            println!("{}", table);

            let gain: Decimal = group.iter().map(|r| evaluate(r).gain).sum();
            println!("  {} realizations, net {}", group.len(), format_aud_signed(gain));
            println!();
            start = end;
        }
    }
}

fn row(r: &Realization) -> RealizationRow {
    RealizationRow {
        symbol: r.symbol.clone(),
        buy_date: r.buy_date.format("%Y-%m-%d").to_string(),
        sell_date: r.sell_date.format("%Y-%m-%d").to_string(),
        units: format_units(r.units),
        cost_base: format_aud(r.cost_base),
        proceeds: format_aud(r.proceeds),
        gain: format_aud_signed(evaluate(r).gain),
        holding_period: format_holding_period(r.holding_days),
        discount: if r.discount_eligible { "yes" } else { "no" }.to_string(),
        financial_year: r.financial_year().display(),
    }
}
