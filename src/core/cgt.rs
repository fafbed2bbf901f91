use super::aggregate::aggregate;
use super::au::{CgtRules, FinancialYear};
use super::carry_forward::{settle_years, CarryForward, YearSummary};
use super::error::CgtError;
use super::ledger::{Fifo, Lot, MatchingOrder};
use super::matcher::{match_security, Realization};
use super::trade::TradeEvent;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Everything a CGT run produces
#[derive(Debug)]
pub struct CgtReport {
    /// Realizations per security, in the order they were matched
    pub realizations: BTreeMap<String, Vec<Realization>>,
    /// Lots still open after the last trade, per security
    pub open_lots: BTreeMap<String, Vec<Lot>>,
    pub years: Vec<YearSummary>,
    /// Loss carried past the last year
    pub carried_loss: Decimal,
    /// Securities that could not be processed, one error each
    pub errors: Vec<CgtError>,
}

impl CgtReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn year(&self, year: FinancialYear) -> Option<&YearSummary> {
        self.years.iter().find(|y| y.year == year)
    }

    /// All realizations, securities in symbol order
    pub fn all_realizations(&self) -> impl Iterator<Item = &Realization> {
        self.realizations.values().flatten()
    }
}

/// Options for a run beyond the tax rules
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Loss brought forward into the earliest year
    pub opening_loss: Decimal,
}

/// Calculate CGT with FIFO lot matching
pub fn calculate_cgt(trades: Vec<TradeEvent>, rules: &CgtRules, options: RunOptions) -> CgtReport {
    calculate_cgt_with_order(trades, rules, options, &Fifo)
}

/// Calculate CGT with a given lot matching order.
///
/// Securities are matched independently; one that fails is reported in
/// `errors` and left out of every total. Years are then settled in order.
pub fn calculate_cgt_with_order(
    trades: Vec<TradeEvent>,
    rules: &CgtRules,
    options: RunOptions,
    order: &dyn MatchingOrder,
) -> CgtReport {
    let mut by_symbol: BTreeMap<String, Vec<TradeEvent>> = BTreeMap::new();
    for trade in trades {
        by_symbol.entry(trade.symbol.clone()).or_default().push(trade);
    }

    let mut realizations = BTreeMap::new();
    let mut open_lots = BTreeMap::new();
    let mut errors = Vec::new();

    for (symbol, mut stream) in by_symbol {
        // Stable, so same-day trades keep their order within each side
        stream.sort_by_key(|t| (t.trade_date, !t.is_buy()));
        match match_security(&symbol, &stream, rules, order) {
            Ok(outcome) => {
                realizations.insert(symbol.clone(), outcome.realizations);
                open_lots.insert(symbol, outcome.open_lots);
            }
            Err(err) => {
                log::warn!("Skipping {}: {}", symbol, err);
                errors.push(err);
            }
        }
    }

    let totals = aggregate(realizations.values().flatten());
    let settled = CarryForward::with_opening_loss(rules.discount_rate(), options.opening_loss)
        .and_then(|start| settle_years(totals.values(), start));
    let (years, carried_loss) = match settled {
        Ok(settled) => settled,
        Err(err) => {
            errors.push(err);
            (Vec::new(), Decimal::ZERO)
        }
    };

    log::info!(
        "Matched {} securities into {} realizations over {} financial years ({} failed)",
        realizations.len(),
        realizations.values().map(Vec::len).sum::<usize>(),
        years.len(),
        errors.len()
    );

    CgtReport {
        realizations,
        open_lots,
        years,
        carried_loss,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trade::Side;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn trade(symbol: &str, side: Side, day: &str, units: Decimal, price: Decimal) -> TradeEvent {
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap();
        TradeEvent::new(symbol, side, date, date, units, price, Decimal::ZERO, "USD", Decimal::ONE)
    }

    fn run(trades: Vec<TradeEvent>) -> CgtReport {
        calculate_cgt(trades, &CgtRules::default(), RunOptions::default())
    }

    #[test]
    fn end_to_end_discounted_gain() {
        let report = run(vec![
            trade("AAPL", Side::Buy, "2021-06-01", dec!(100), dec!(10)),
            trade("AAPL", Side::Sell, "2022-07-01", dec!(100), dec!(15)),
        ]);

        assert!(report.is_clean());
        let fy = report.year(FinancialYear(2023)).unwrap();
        assert_eq!(fy.eligible_gains, dec!(500));
        assert_eq!(fy.ordinary_gains, dec!(0));
        assert_eq!(fy.discount, dec!(250));
        assert_eq!(fy.net_capital_gain, dec!(250));
    }

    #[test]
    fn failed_security_does_not_block_others() {
        let report = run(vec![
            trade("AAPL", Side::Buy, "2022-01-01", dec!(10), dec!(10)),
            trade("AAPL", Side::Sell, "2022-03-01", dec!(10), dec!(20)),
            trade("TSLA", Side::Buy, "2022-01-01", dec!(5), dec!(10)),
            trade("TSLA", Side::Sell, "2022-02-01", dec!(2), dec!(30)),
            trade("TSLA", Side::Sell, "2022-03-01", dec!(10), dec!(30)),
        ]);

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].symbol(), Some("TSLA"));
        // TSLA's earlier successful sell is dropped with the rest of the security
        assert!(!report.realizations.contains_key("TSLA"));
        let fy = report.year(FinancialYear(2022)).unwrap();
        assert_eq!(fy.ordinary_gains, dec!(100));
        assert_eq!(fy.realization_count, 1);
    }

    #[test]
    fn same_day_buy_is_matched_before_sell() {
        let report = run(vec![
            trade("AMD", Side::Sell, "2022-01-01", dec!(5), dec!(12)),
            trade("AMD", Side::Buy, "2022-01-01", dec!(5), dec!(10)),
        ]);
        assert!(report.is_clean());
        assert_eq!(report.realizations["AMD"][0].holding_days, 0);
    }

    #[test]
    fn unsorted_input_is_ordered_per_security() {
        let report = run(vec![
            trade("AMD", Side::Sell, "2022-03-01", dec!(5), dec!(12)),
            trade("AMD", Side::Buy, "2022-02-01", dec!(5), dec!(11)),
            trade("AMD", Side::Buy, "2022-01-01", dec!(5), dec!(10)),
        ]);
        let r = &report.realizations["AMD"][0];
        assert_eq!(r.buy_date, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(report.open_lots["AMD"].len(), 1);
    }

    #[test]
    fn opening_loss_reduces_first_year() {
        let report = calculate_cgt(
            vec![
                trade("AAPL", Side::Buy, "2022-01-01", dec!(10), dec!(10)),
                trade("AAPL", Side::Sell, "2022-03-01", dec!(10), dec!(20)),
            ],
            &CgtRules::default(),
            RunOptions {
                opening_loss: dec!(30),
            },
        );
        let fy = report.year(FinancialYear(2022)).unwrap();
        assert_eq!(fy.carried_loss_in, dec!(30));
        assert_eq!(fy.net_capital_gain, dec!(70));
        assert_eq!(report.carried_loss, dec!(0));
    }

    #[test]
    fn results_are_grouped_by_symbol() {
        let report = run(vec![
            trade("ZM", Side::Buy, "2022-01-01", dec!(1), dec!(10)),
            trade("ZM", Side::Sell, "2022-02-01", dec!(1), dec!(11)),
            trade("AAPL", Side::Buy, "2022-01-01", dec!(1), dec!(10)),
            trade("AAPL", Side::Sell, "2022-02-01", dec!(1), dec!(12)),
        ]);
        let symbols: Vec<_> = report.all_realizations().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "ZM"]);
    }

    #[test]
    fn negative_opening_loss_is_reported() {
        let report = calculate_cgt(
            vec![
                trade("AAPL", Side::Buy, "2022-01-01", dec!(10), dec!(10)),
                trade("AAPL", Side::Sell, "2022-03-01", dec!(10), dec!(20)),
            ],
            &CgtRules::default(),
            RunOptions {
                opening_loss: dec!(-30),
            },
        );
        assert!(!report.is_clean());
        assert_eq!(report.errors, vec![CgtError::NegativeOpeningLoss(dec!(-30))]);
        assert!(report.years.is_empty());
    }
}
