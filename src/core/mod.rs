pub mod aggregate;
pub mod au;
pub mod carry_forward;
pub mod cgt;
pub mod error;
pub mod gains;
pub mod ledger;
pub mod matcher;
pub mod trade;

// Flat public surface for domain types and functions.
pub use aggregate::{aggregate, offset_losses, LossOffset, YearTotals};
pub use au::{CgtRules, EntityType, FinancialYear};
pub use carry_forward::{settle_years, CarryForward, YearSummary};
pub use cgt::{calculate_cgt, calculate_cgt_with_order, CgtReport, RunOptions};
pub use error::CgtError;
pub use gains::{evaluate, Evaluation};
pub use ledger::{Fifo, Lot, LotDraw, LotLedger, MatchingOrder};
pub use matcher::{check_trade, match_security, Realization, SecurityOutcome};
pub use trade::{Side, TradeEvent};
