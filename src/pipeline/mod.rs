//! Pipeline entry points for monitor operations.
//!
//! - `Monitor::run`: check the series once and announce new recommendations
//! - `Monitor::status`: read-only overview of components and stored state

mod monitor;

pub use monitor::{Components, Health, Monitor, RunOutcome, SelfTest, Status};
