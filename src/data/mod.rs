//! Data module for rental property records
//!
//! This module provides:
//! - Core property record and categorical vocabulary types
//! - CSV loading of the analytical dataset produced upstream

pub mod loader;
pub mod types;

pub use loader::{load_records, DataError};
pub use types::{Furnished, LabelError, PropertyRecord, PropertyType, Tier};
