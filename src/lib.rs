//! Australian capital gains tax for share trades.
//!
//! Trades are matched to the lots they dispose of in FIFO order, gains and
//! losses are bucketed by financial year, and net capital losses are
//! carried forward from year to year.

pub mod cmd;
pub mod core;
pub mod import;
