//! Persistence of prediction records.

pub mod records;
pub mod store;
