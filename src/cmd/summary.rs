//! Summary command - per financial year totals after losses and discount

use crate::cmd::{format_aud, format_aud_signed, print_json, InputArgs, Run};
use crate::core::{CgtError, FinancialYear, YearSummary};
use crate::import::RejectedRow;
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SummaryCommand {
    #[command(flatten)]
    input: InputArgs,

    /// Financial year to report (e.g., 2023 for 2022/23)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct YearRow {
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Sales")]
    count: usize,
    #[tabled(rename = "Discountable")]
    eligible: String,
    #[tabled(rename = "Other Gains")]
    ordinary: String,
    #[tabled(rename = "Losses")]
    losses: String,
    #[tabled(rename = "Carried In")]
    carried_in: String,
    #[tabled(rename = "Losses Applied")]
    applied: String,
    #[tabled(rename = "Discount")]
    discount: String,
    #[tabled(rename = "Net Gain")]
    net: String,
    #[tabled(rename = "Carried Out")]
    carried_out: String,
}

impl From<&YearSummary> for YearRow {
    fn from(y: &YearSummary) -> Self {
        YearRow {
            year: y.year.display(),
            count: y.realization_count,
            eligible: format_aud(y.eligible_gains),
            ordinary: format_aud(y.ordinary_gains),
            losses: format_aud_signed(y.total_losses),
            carried_in: format_aud(y.carried_loss_in),
            applied: format_aud(y.current_losses_applied + y.carried_losses_applied),
            discount: format_aud(y.discount),
            net: format_aud(y.net_capital_gain),
            carried_out: format_aud(y.carried_loss_out),
        }
    }
}

#[derive(Debug, Serialize)]
struct Totals {
    total_gains: Decimal,
    total_losses: Decimal,
    net_position: Decimal,
    net_capital_gain: Decimal,
}

impl Totals {
    fn of(years: &[&YearSummary]) -> Self {
        Totals {
            total_gains: years.iter().map(|y| y.gross_gain()).sum(),
            total_losses: years.iter().map(|y| y.total_losses).sum(),
            net_position: years.iter().map(|y| y.net_position()).sum(),
            net_capital_gain: years.iter().map(|y| y.net_capital_gain).sum(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryData<'a> {
    financial_year: String,
    entity: &'static str,
    discount_rate_pct: String,
    years: Vec<&'a YearSummary>,
    totals: Totals,
    carried_loss: Decimal,
    rejected: &'a [RejectedRow],
    errors: &'a [CgtError],
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let run = self.input.run()?;
        let year = self.year.map(FinancialYear);
        let years: Vec<&YearSummary> = run
            .report
            .years
            .iter()
            .filter(|y| year.is_none_or(|fy| y.year == fy))
            .collect();

        if self.json {
            self.print_json(&run, &years, year)?;
        } else {
            self.print_summary(&run, &years, year);
        }
        run.exit_on_problems();
        Ok(())
    }

    fn print_summary(&self, run: &Run, years: &[&YearSummary], year: Option<FinancialYear>) {
        let year_str = year.map_or("All Years".to_string(), |y| y.display());
        println!();
        println!(
            "CGT SUMMARY ({}) - {}, {:.2}% discount",
            year_str,
            run.rules.entity.display(),
            run.rules.discount_rate() * dec!(100)
        );
        println!();

        if years.is_empty() {
            println!("No realizations found ({})", year_str);
            return;
        }

        let rows: Vec<YearRow> = years.iter().map(|y| YearRow::from(*y)).collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!();

        let totals = Totals::of(years);
        println!(
            "  Gains: {} | Losses: {} | Net position: {}",
            format_aud(totals.total_gains),
            format_aud_signed(totals.total_losses),
            format_aud_signed(totals.net_position)
        );
        println!("  Net capital gain: {}", format_aud(totals.net_capital_gain));
        if year.is_none() {
            println!("  Loss to carry forward: {}", format_aud(run.report.carried_loss));
        }
        println!();
    }

    fn print_json(&self, run: &Run, years: &[&YearSummary], year: Option<FinancialYear>) -> anyhow::Result<()> {
        let data = SummaryData {
            financial_year: year.map_or("All Years".to_string(), |y| y.display()),
            entity: run.rules.entity.display(),
            discount_rate_pct: format!("{:.2}", run.rules.discount_rate() * dec!(100)),
            years: years.to_vec(),
            totals: Totals::of(years),
            carried_loss: years.last().map_or(run.report.carried_loss, |y| y.carried_loss_out),
            rejected: &run.rejected,
            errors: &run.report.errors,
        };
        print_json(&data)
    }
}
