use super::au::{CgtRules, FinancialYear};
use super::error::CgtError;
use super::ledger::{Lot, LotDraw, LotLedger, MatchingOrder};
use super::trade::{Side, TradeEvent};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Sell units matched against one buy lot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Realization {
    pub symbol: String,
    pub units: Decimal,
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sell_id: Option<String>,
    pub cost_base: Decimal,
    pub proceeds: Decimal,
    /// Calendar days from buy to sell
    pub holding_days: i64,
    pub discount_eligible: bool,
}

impl Realization {
    pub fn financial_year(&self) -> FinancialYear {
        FinancialYear::from_date(self.sell_date)
    }
}

/// Result of running one security's trades through its ledger
#[derive(Debug)]
pub struct SecurityOutcome {
    pub realizations: Vec<Realization>,
    pub open_lots: Vec<Lot>,
}

/// Check a trade against the rules before it touches the ledger
pub fn check_trade(trade: &TradeEvent, rules: &CgtRules) -> Result<(), CgtError> {
    if trade.aud_rate <= Decimal::ZERO {
        return Err(CgtError::InvalidCurrencyRate {
            symbol: trade.symbol.clone(),
            trade_date: trade.trade_date,
            rate: Some(trade.aud_rate),
        });
    }
    if !rules.recognises(trade.trade_date) {
        return Err(CgtError::UnsupportedYearBoundary {
            symbol: trade.symbol.clone(),
            date: trade.trade_date,
        });
    }
    if trade.aud_amount().is_none() {
        return Err(out_of_range(trade));
    }
    Ok(())
}

/// Match one security's trades, which must already be in trade-date order.
///
/// Buys open lots; each sell draws from the ledger and yields one realization
/// per lot touched. The first failure ends the security.
pub fn match_security(
    symbol: &str,
    trades: &[TradeEvent],
    rules: &CgtRules,
    order: &dyn MatchingOrder,
) -> Result<SecurityOutcome, CgtError> {
    debug_assert!(trades.windows(2).all(|w| w[0].trade_date <= w[1].trade_date));

    let mut ledger = LotLedger::new(symbol, order);
    let mut realizations = Vec::new();

    for trade in trades {
        check_trade(trade, rules)?;
        match trade.side {
            Side::Buy => ledger.add_lot(trade.clone())?,
            Side::Sell => {
                let draws = ledger.consume(trade.units, trade.trade_date)?;
                realizations.extend(realize(trade, draws, rules)?);
            }
        }
    }

    log::debug!(
        "{}: {} realizations, {} units still held",
        symbol,
        realizations.len(),
        ledger.total_units()
    );

    Ok(SecurityOutcome {
        realizations,
        open_lots: ledger.into_lots(),
    })
}

fn out_of_range(trade: &TradeEvent) -> CgtError {
    CgtError::AmountOutOfRange {
        symbol: trade.symbol.clone(),
        trade_date: trade.trade_date,
    }
}

/// Turn a sell's lot draws into realizations, sharing its proceeds by units.
/// Each share is held to what is still unallocated; the last draw takes the rest.
fn realize(sell: &TradeEvent, draws: Vec<LotDraw>, rules: &CgtRules) -> Result<Vec<Realization>, CgtError> {
    let proceeds = sell.proceeds_aud().ok_or_else(|| out_of_range(sell))?;
    let last = draws.len().saturating_sub(1);
    let mut allocated = Decimal::ZERO;
    let mut realizations = Vec::with_capacity(draws.len());

    for (i, draw) in draws.into_iter().enumerate() {
        let unallocated = proceeds - allocated;
        let share = if i == last {
            unallocated
        } else {
            // draw.units <= sell.units, so the share never exceeds the proceeds
            let share = draw
                .units
                .checked_div(sell.units)
                .and_then(|fraction| proceeds.checked_mul(fraction))
                .ok_or_else(|| out_of_range(sell))?
                .round_dp(2);
            if proceeds >= Decimal::ZERO {
                share.min(unallocated)
            } else {
                share.max(unallocated)
            }
        };
        allocated += share;

        let holding_days = (sell.trade_date - draw.buy_date).num_days();
        let realization = Realization {
            symbol: sell.symbol.clone(),
            units: draw.units,
            buy_date: draw.buy_date,
            sell_date: sell.trade_date,
            buy_id: draw.buy_id,
            sell_id: sell.id.clone(),
            cost_base: draw.cost_base,
            proceeds: share,
            holding_days,
            discount_eligible: rules.is_discount_eligible(holding_days),
        };
        log::debug!(
            "{} realized: {} units bought {} sold {} held {} days, cost {} proceeds {}",
            realization.symbol,
            realization.units,
            realization.buy_date,
            realization.sell_date,
            realization.holding_days,
            realization.cost_base,
            realization.proceeds
        );
        realizations.push(realization);
    }

    Ok(realizations)
}
