use super::matcher::Realization;
use rust_decimal::Decimal;

/// Gain or loss on one realization, before any discount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Proceeds less cost base; negative is a loss
    pub gain: Decimal,
    pub discount_eligible: bool,
}

impl Evaluation {
    pub fn is_loss(&self) -> bool {
        self.gain < Decimal::ZERO
    }
}

pub fn evaluate(realization: &Realization) -> Evaluation {
    Evaluation {
        gain: realization.proceeds - realization.cost_base,
        discount_eligible: realization.discount_eligible,
    }
}
