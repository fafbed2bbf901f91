//! Lots command - holdings left open after matching

use crate::cmd::{format_aud, format_units, print_json, InputArgs};
use crate::core::Lot;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct LotsCommand {
    #[command(flatten)]
    input: InputArgs,

    /// Only this security (e.g., AAPL)
    #[arg(short, long)]
    symbol: Option<String>,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct LotRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Bought")]
    buy_date: String,
    #[tabled(rename = "Units")]
    units: String,
    #[tabled(rename = "Unit Cost")]
    unit_cost: String,
    #[tabled(rename = "Cost Base")]
    cost_base: String,
}

#[derive(Debug, Serialize)]
struct LotView<'a> {
    symbol: &'a str,
    buy_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    buy_id: Option<&'a str>,
    remaining_units: Decimal,
    unit_cost: Decimal,
    remaining_cost: Decimal,
}

impl LotsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let run = self.input.run()?;
        let symbol = self.symbol.as_deref();
        let lots: Vec<(&str, &Lot)> = run
            .report
            .open_lots
            .iter()
            .filter(|(s, _)| symbol.is_none_or(|f| s.eq_ignore_ascii_case(f)))
            .flat_map(|(s, lots)| lots.iter().map(move |lot| (s.as_str(), lot)))
            .collect();

        if self.json {
            let views: Vec<LotView> = lots
                .iter()
                .map(|(symbol, lot)| LotView {
                    symbol,
                    buy_date: lot.buy_date().format("%Y-%m-%d").to_string(),
                    buy_id: lot.buy.id.as_deref(),
                    remaining_units: lot.remaining_units,
                    unit_cost: lot.unit_cost,
                    remaining_cost: lot.remaining_cost,
                })
                .collect();
            print_json(&views)?;
        } else {
            self.print_table(&lots);
        }
        run.exit_on_problems();
        Ok(())
    }

    fn print_table(&self, lots: &[(&str, &Lot)]) {
        if lots.is_empty() {
            println!("No open lots");
            return;
        }

        println!();
        println!("OPEN LOTS");
        println!();

        let rows: Vec<LotRow> = lots
            .iter()
            .map(|(symbol, lot)| LotRow {
                symbol: symbol.to_string(),
                buy_date: lot.buy_date().format("%Y-%m-%d").to_string(),
                units: format_units(lot.remaining_units),
                unit_cost: format!("${:.4}", lot.unit_cost),
                cost_base: format_aud(lot.remaining_cost),
            })
            .collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);

        let total: Decimal = lots.iter().map(|(_, lot)| lot.remaining_cost).sum();
        println!("  Total cost base held: {}", format_aud(total));
        println!();
    }
}
