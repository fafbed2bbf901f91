use super::au::FinancialYear;
use super::gains::evaluate;
use super::matcher::Realization;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Realized amounts of one financial year, before losses are applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearTotals {
    pub year: FinancialYear,
    pub realization_count: usize,
    pub proceeds: Decimal,
    pub cost_base: Decimal,
    /// Gains on assets held past the discount threshold
    pub eligible_gains: Decimal,
    /// Gains that do not qualify for the discount
    pub ordinary_gains: Decimal,
    /// Sum of losses, zero or negative
    pub total_losses: Decimal,
}

impl YearTotals {
    pub fn new(year: FinancialYear) -> Self {
        YearTotals {
            year,
            realization_count: 0,
            proceeds: Decimal::ZERO,
            cost_base: Decimal::ZERO,
            eligible_gains: Decimal::ZERO,
            ordinary_gains: Decimal::ZERO,
            total_losses: Decimal::ZERO,
        }
    }

    pub fn add(&mut self, realization: &Realization) {
        let evaluation = evaluate(realization);
        self.realization_count += 1;
        self.proceeds += realization.proceeds;
        self.cost_base += realization.cost_base;
        if evaluation.is_loss() {
            self.total_losses += evaluation.gain;
        } else if evaluation.discount_eligible {
            self.eligible_gains += evaluation.gain;
        } else {
            self.ordinary_gains += evaluation.gain;
        }
    }

    pub fn gross_gain(&self) -> Decimal {
        self.eligible_gains + self.ordinary_gains
    }

    /// Net capital gain of this year taken alone: its own losses applied,
    /// then the discount on what is left of the eligible gains
    pub fn net_capital_gain(&self, discount_rate: Decimal) -> Decimal {
        let offset = offset_losses(self.ordinary_gains, self.eligible_gains, -self.total_losses);
        offset.net_capital_gain(discount_rate)
    }
}

/// Bucket realizations by the financial year of their sell date
pub fn aggregate<'a, I>(realizations: I) -> BTreeMap<FinancialYear, YearTotals>
where
    I: IntoIterator<Item = &'a Realization>,
{
    let mut years: BTreeMap<FinancialYear, YearTotals> = BTreeMap::new();
    for realization in realizations {
        let year = realization.financial_year();
        years
            .entry(year)
            .or_insert_with(|| YearTotals::new(year))
            .add(realization);
    }
    years
}

/// How a pool of losses was spread over one year's gains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LossOffset {
    pub ordinary_remaining: Decimal,
    pub eligible_remaining: Decimal,
    /// Losses applied in total
    pub applied: Decimal,
    /// Losses left over
    pub unused: Decimal,
}

impl LossOffset {
    pub fn discount(&self, discount_rate: Decimal) -> Decimal {
        (self.eligible_remaining * discount_rate).round_dp(2)
    }

    pub fn net_capital_gain(&self, discount_rate: Decimal) -> Decimal {
        self.ordinary_remaining + self.eligible_remaining - self.discount(discount_rate)
    }
}

/// Apply `losses` (a positive magnitude) against ordinary gains first, then
/// eligible gains, since eligible gains are later discounted anyway.
pub fn offset_losses(ordinary: Decimal, eligible: Decimal, losses: Decimal) -> LossOffset {
    let against_ordinary = losses.min(ordinary);
    let against_eligible = (losses - against_ordinary).min(eligible);
    let applied = against_ordinary + against_eligible;
    LossOffset {
        ordinary_remaining: ordinary - against_ordinary,
        eligible_remaining: eligible - against_eligible,
        applied,
        unused: losses - applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn realization(sell: &str, cost: Decimal, proceeds: Decimal, eligible: bool) -> Realization {
        Realization {
            symbol: "META".to_string(),
            units: dec!(1),
            buy_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            sell_date: NaiveDate::parse_from_str(sell, "%Y-%m-%d").unwrap(),
            buy_id: None,
            sell_id: None,
            cost_base: cost,
            proceeds,
            holding_days: 0,
            discount_eligible: eligible,
        }
    }

    #[test]
    fn buckets_by_sell_date_financial_year() {
        let rs = vec![
            realization("2023-06-30", dec!(100), dec!(150), true),
            realization("2023-07-01", dec!(100), dec!(80), false),
        ];
        let years = aggregate(&rs);
        assert_eq!(years.len(), 2);
        assert_eq!(years[&FinancialYear(2023)].eligible_gains, dec!(50));
        assert_eq!(years[&FinancialYear(2024)].total_losses, dec!(-20));
    }

    #[test]
    fn splits_gains_and_losses() {
        let rs = vec![
            realization("2023-01-01", dec!(100), dec!(150), true),
            realization("2023-02-01", dec!(100), dec!(130), false),
            realization("2023-03-01", dec!(100), dec!(60), true),
            realization("2023-04-01", dec!(100), dec!(100), false),
        ];
        let totals = &aggregate(&rs)[&FinancialYear(2023)];
        assert_eq!(totals.realization_count, 4);
        assert_eq!(totals.eligible_gains, dec!(50));
        assert_eq!(totals.ordinary_gains, dec!(30));
        assert_eq!(totals.total_losses, dec!(-40));
        assert_eq!(totals.gross_gain(), dec!(80));
        assert_eq!(totals.proceeds, dec!(440));
        assert_eq!(totals.cost_base, dec!(400));
    }

    #[test]
    fn order_within_year_does_not_matter() {
        let mut rs = vec![
            realization("2023-01-01", dec!(100.10), dec!(150.33), true),
            realization("2023-02-01", dec!(99.99), dec!(130.01), false),
            realization("2023-03-01", dec!(100.07), dec!(60.5), true),
            realization("2023-05-01", dec!(12.34), dec!(56.78), true),
        ];
        let forward = aggregate(&rs);
        rs.reverse();
        let reversed = aggregate(&rs);
        rs.swap(0, 2);
        let shuffled = aggregate(&rs);
        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn losses_offset_ordinary_gains_first() {
        let offset = offset_losses(dec!(100), dec!(200), dec!(150));
        assert_eq!(offset.ordinary_remaining, dec!(0));
        assert_eq!(offset.eligible_remaining, dec!(150));
        assert_eq!(offset.applied, dec!(150));
        assert_eq!(offset.unused, dec!(0));
        // 150 eligible halved
        assert_eq!(offset.net_capital_gain(dec!(0.5)), dec!(75));
    }

    #[test]
    fn losses_exceeding_gains_are_unused() {
        let offset = offset_losses(dec!(100), dec!(50), dec!(400));
        assert_eq!(offset.applied, dec!(150));
        assert_eq!(offset.unused, dec!(250));
        assert_eq!(offset.net_capital_gain(dec!(0.5)), dec!(0));
    }

    #[test]
    fn year_nets_its_own_losses_before_discount() {
        let rs = vec![
            realization("2023-01-01", dec!(0), dec!(300), true),
            realization("2023-02-01", dec!(0), dec!(100), false),
            realization("2023-03-01", dec!(250), dec!(0), false),
        ];
        let totals = &aggregate(&rs)[&FinancialYear(2023)];
        // 250 loss: 100 against ordinary, 150 against eligible; 150 eligible left, halved
        assert_eq!(totals.net_capital_gain(dec!(0.5)), dec!(75));
    }
}
