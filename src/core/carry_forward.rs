use super::aggregate::{offset_losses, YearTotals};
use super::au::FinancialYear;
use super::error::CgtError;
use rust_decimal::Decimal;
use serde::Serialize;

/// Outcome of one financial year once losses and the discount are applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearSummary {
    pub year: FinancialYear,
    pub realization_count: usize,
    pub proceeds: Decimal,
    pub cost_base: Decimal,
    pub eligible_gains: Decimal,
    pub ordinary_gains: Decimal,
    pub total_losses: Decimal,
    pub carried_loss_in: Decimal,
    /// Losses of this year applied against its gains
    pub current_losses_applied: Decimal,
    /// Losses brought forward applied against this year's gains
    pub carried_losses_applied: Decimal,
    pub discount: Decimal,
    pub net_capital_gain: Decimal,
    pub carried_loss_out: Decimal,
}

impl YearSummary {
    pub fn gross_gain(&self) -> Decimal {
        self.eligible_gains + self.ordinary_gains
    }

    /// Gains less this year's losses, as the original per-year "net position"
    pub fn net_position(&self) -> Decimal {
        self.gross_gain() + self.total_losses
    }
}

/// Net capital loss carried between years.
///
/// A plain value: each `apply` consumes the state for one year and returns
/// the state for the next, so a run can stop after any year and resume later
/// from `carried_loss()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarryForward {
    carried_loss: Decimal,
    discount_rate: Decimal,
    last_year: Option<FinancialYear>,
}

impl CarryForward {
    pub fn new(discount_rate: Decimal) -> Self {
        CarryForward {
            carried_loss: Decimal::ZERO,
            discount_rate,
            last_year: None,
        }
    }

    /// Start from a loss brought forward from an earlier run
    pub fn with_opening_loss(discount_rate: Decimal, carried_loss: Decimal) -> Result<Self, CgtError> {
        if carried_loss < Decimal::ZERO {
            return Err(CgtError::NegativeOpeningLoss(carried_loss));
        }
        Ok(CarryForward {
            carried_loss,
            ..Self::new(discount_rate)
        })
    }

    pub fn carried_loss(&self) -> Decimal {
        self.carried_loss
    }

    /// Settle one year. Years must arrive in increasing order.
    pub fn apply(self, totals: &YearTotals) -> Result<(YearSummary, CarryForward), CgtError> {
        if let Some(previous) = self.last_year {
            if totals.year <= previous {
                return Err(CgtError::YearOutOfOrder {
                    previous,
                    next: totals.year,
                });
            }
        }

        let own_losses = -totals.total_losses;
        let available = own_losses + self.carried_loss;
        let offset = offset_losses(totals.ordinary_gains, totals.eligible_gains, available);

        // Current-year losses are used before those brought forward
        let current_losses_applied = offset.applied.min(own_losses);
        let carried_losses_applied = offset.applied - current_losses_applied;
        let discount = offset.discount(self.discount_rate);

        let summary = YearSummary {
            year: totals.year,
            realization_count: totals.realization_count,
            proceeds: totals.proceeds,
            cost_base: totals.cost_base,
            eligible_gains: totals.eligible_gains,
            ordinary_gains: totals.ordinary_gains,
            total_losses: totals.total_losses,
            carried_loss_in: self.carried_loss,
            current_losses_applied,
            carried_losses_applied,
            discount,
            net_capital_gain: offset.net_capital_gain(self.discount_rate),
            carried_loss_out: offset.unused,
        };

        log::debug!(
            "{}: gains {} losses {} carried in {} -> net {} carried out {}",
            summary.year,
            summary.gross_gain(),
            summary.total_losses,
            summary.carried_loss_in,
            summary.net_capital_gain,
            summary.carried_loss_out
        );

        let next = CarryForward {
            carried_loss: offset.unused,
            discount_rate: self.discount_rate,
            last_year: Some(totals.year),
        };
        Ok((summary, next))
    }
}

/// Fold the tracker over years in order, returning each year's summary and
/// the loss left to carry past the last one.
pub fn settle_years<'a, I>(years: I, start: CarryForward) -> Result<(Vec<YearSummary>, Decimal), CgtError>
where
    I: IntoIterator<Item = &'a YearTotals>,
{
    let mut summaries = Vec::new();
    let mut state = start;
    for totals in years {
        let (summary, next) = state.apply(totals)?;
        summaries.push(summary);
        state = next;
    }
    Ok((summaries, state.carried_loss()))
}
