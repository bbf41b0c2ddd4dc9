//! Core shared types
//!
//! This module contains the building blocks every other module speaks:
//! - Addresses, assets and amounts
//! - The per-call execution context (caller + host time)
//! - Clocks used by the host to stamp calls

pub mod clock;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use types::{Address, Amount, Asset, CallContext, RequestId, Timestamp};
