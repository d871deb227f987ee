//! Data Models
//!
//! Shared between the tip server and any client.
//! All IDs are i64 (snowflake), amounts are `Decimal`, timestamps are Unix millis.

pub mod employee;
pub mod payment;
pub mod role;
pub mod statistics;

pub use employee::*;
pub use payment::*;
pub use role::*;
pub use statistics::*;
