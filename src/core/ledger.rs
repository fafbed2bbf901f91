use super::error::CgtError;
use super::trade::TradeEvent;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// An open block of units from one buy
#[derive(Debug, Clone)]
pub struct Lot {
    pub buy: TradeEvent,
    pub remaining_units: Decimal,
    /// AUD cost base per unit, fixed when the lot is opened
    pub unit_cost: Decimal,
    /// AUD cost base still attached to the remaining units
    pub remaining_cost: Decimal,
}

impl Lot {
    fn open(buy: TradeEvent, cost: Decimal) -> Self {
        let unit_cost = cost.checked_div(buy.units).unwrap_or_default();
        Lot {
            remaining_units: buy.units,
            unit_cost,
            remaining_cost: cost,
            buy,
        }
    }

    pub fn buy_date(&self) -> NaiveDate {
        self.buy.trade_date
    }

    /// Take units off this lot, returning the cost base that goes with them.
    /// Emptying the lot hands over exactly what is left.
    fn take(&mut self, units: Decimal) -> Decimal {
        if units >= self.remaining_units {
            let cost = self.remaining_cost;
            self.remaining_units = Decimal::ZERO;
            self.remaining_cost = Decimal::ZERO;
            cost
        } else {
            let cost = self
                .unit_cost
                .checked_mul(units)
                .map_or(self.remaining_cost, |c| c.round_dp(2).min(self.remaining_cost));
            self.remaining_units -= units;
            self.remaining_cost -= cost;
            cost
        }
    }
}

/// Units drawn from a single lot to cover part of a sell
#[derive(Debug, Clone, PartialEq)]
pub struct LotDraw {
    pub buy_date: NaiveDate,
    pub buy_id: Option<String>,
    pub units: Decimal,
    pub cost_base: Decimal,
}

/// Order in which open lots are consumed.
///
/// The ledger keeps its lots sorted by `compare`; sells always draw from the front.
pub trait MatchingOrder: std::fmt::Debug {
    fn compare(&self, a: &Lot, b: &Lot) -> Ordering;
}

/// First in, first out: oldest buy date first, same-day buys in arrival order
#[derive(Debug, Clone, Copy, Default)]
pub struct Fifo;

impl MatchingOrder for Fifo {
    fn compare(&self, a: &Lot, b: &Lot) -> Ordering {
        a.buy_date().cmp(&b.buy_date())
    }
}

/// Open lots of one security
#[derive(Debug)]
pub struct LotLedger<'a> {
    symbol: String,
    lots: VecDeque<Lot>,
    order: &'a dyn MatchingOrder,
}

impl<'a> LotLedger<'a> {
    pub fn new(symbol: impl Into<String>, order: &'a dyn MatchingOrder) -> Self {
        LotLedger {
            symbol: symbol.into(),
            lots: VecDeque::new(),
            order,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn lots(&self) -> impl Iterator<Item = &Lot> {
        self.lots.iter()
    }

    pub fn into_lots(self) -> Vec<Lot> {
        self.lots.into()
    }

    pub fn total_units(&self) -> Decimal {
        self.lots.iter().map(|l| l.remaining_units).sum()
    }

    /// Open a lot for a buy
    pub fn add_lot(&mut self, buy: TradeEvent) -> Result<(), CgtError> {
        let cost = buy.cost_aud().ok_or_else(|| CgtError::AmountOutOfRange {
            symbol: self.symbol.clone(),
            trade_date: buy.trade_date,
        })?;
        let lot = Lot::open(buy, cost);
        // After every lot that sorts before or level with it, so ties keep arrival order
        let position = self
            .lots
            .partition_point(|existing| self.order.compare(existing, &lot) != Ordering::Greater);
        log::debug!(
            "Ledger {} ADD: {} units on {} at {} per unit (cost {})",
            self.symbol,
            lot.remaining_units,
            lot.buy_date(),
            lot.unit_cost.round_dp(4),
            lot.remaining_cost
        );
        self.lots.insert(position, lot);
        Ok(())
    }

    /// Draw `units` from the front of the ledger for a sell on `sell_date`.
    ///
    /// Fails without touching any lot when the ledger holds fewer units than needed.
    pub fn consume(&mut self, units: Decimal, sell_date: NaiveDate) -> Result<Vec<LotDraw>, CgtError> {
        let available = self.total_units();
        if available < units {
            return Err(CgtError::InsufficientLots {
                symbol: self.symbol.clone(),
                sell_date,
                requested: units,
                available,
                shortfall: units - available,
            });
        }

        let mut draws = Vec::new();
        let mut remaining = units;
        while remaining > Decimal::ZERO {
            let Some(lot) = self.lots.front_mut() else {
                break;
            };
            let take = remaining.min(lot.remaining_units);
            let cost_base = lot.take(take);
            log::debug!(
                "Ledger {} DRAW: {} units from lot of {} at cost {}",
                self.symbol,
                take,
                lot.buy_date(),
                cost_base
            );
            draws.push(LotDraw {
                buy_date: lot.buy_date(),
                buy_id: lot.buy.id.clone(),
                units: take,
                cost_base,
            });
            if lot.remaining_units.is_zero() {
                self.lots.pop_front();
            }
            remaining -= take;
        }

        Ok(draws)
    }
}
