use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Accepts any casing ("Buy", "BUY", "buy")
    pub fn parse(s: &str) -> Option<Side> {
        match s.trim().to_lowercase().as_str() {
            "buy" | "b" => Some(Side::Buy),
            "sell" | "s" => Some(Side::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

/// A validated buy or sell of one security
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeEvent {
    /// Broker trade identifier, if the source carries one
    pub id: Option<String>,
    pub symbol: String,
    pub side: Side,
    pub trade_date: NaiveDate,
    pub settlement_date: NaiveDate,
    pub units: Decimal,
    pub unit_price: Decimal,
    /// Gross value in trade currency (units x price, or the broker's figure)
    pub value: Decimal,
    pub fees: Decimal,
    pub gst: Decimal,
    pub currency: String,
    /// Multiplier converting the trade currency into AUD
    pub aud_rate: Decimal,
}

impl TradeEvent {
    /// Build an event whose gross value is units x unit price.
    ///
    /// # Panics
    ///
    /// If units x unit price overflows. Imported rows are range checked by
    /// `TradeRecord::to_event` instead.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        trade_date: NaiveDate,
        settlement_date: NaiveDate,
        units: Decimal,
        unit_price: Decimal,
        fees: Decimal,
        currency: impl Into<String>,
        aud_rate: Decimal,
    ) -> Self {
        TradeEvent {
            id: None,
            symbol: symbol.into(),
            side,
            trade_date,
            settlement_date,
            units,
            unit_price,
            value: units * unit_price,
            fees,
            gst: Decimal::ZERO,
            currency: currency.into(),
            aud_rate,
        }
    }

    pub fn with_gst(mut self, gst: Decimal) -> Self {
        self.gst = gst;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    /// Acquisition cost in AUD: (value + fees + GST) x rate, to the cent.
    /// `None` when the amount does not fit in a `Decimal`.
    pub fn cost_aud(&self) -> Option<Decimal> {
        self.value
            .checked_add(self.fees)?
            .checked_add(self.gst)?
            .checked_mul(self.aud_rate)
            .map(|aud| aud.round_dp(2))
    }

    /// Capital proceeds in AUD: (value - fees - GST) x rate, to the cent.
    /// `None` when the amount does not fit in a `Decimal`.
    pub fn proceeds_aud(&self) -> Option<Decimal> {
        self.value
            .checked_sub(self.fees)?
            .checked_sub(self.gst)?
            .checked_mul(self.aud_rate)
            .map(|aud| aud.round_dp(2))
    }

    /// Cost for a buy, proceeds for a sell
    pub fn aud_amount(&self) -> Option<Decimal> {
        match self.side {
            Side::Buy => self.cost_aud(),
            Side::Sell => self.proceeds_aud(),
        }
    }
}
