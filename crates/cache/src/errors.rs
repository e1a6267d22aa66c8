//! Error handling for the record store
//!
//! Every variant carries a recovery hint. Read failures are usually not
//! returned to callers directly; stores park them in a sticky-failure slot
//! that the next `retrieve_data` reports.

mod conversions;
mod display;
mod types;

pub(crate) use conversions::write_recovery_hint;
pub use types::*;
