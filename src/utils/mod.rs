//! Utility modules for the Checklist application.
//!
//! - [`datetime`] - Timestamp formatting and deadline parsing

pub mod datetime;
