//! Dutch VAT (BTW) arithmetic and monthly financial aggregation for
//! self-employed bookkeeping.

pub mod core;

pub use crate::core::*;
