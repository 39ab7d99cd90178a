//! # taxparams-rs
//!
//! `taxparams-rs` stores year-indexed tax policy parameters whose values vary
//! by year and by secondary labels such as filing status. Indexed parameters
//! are extrapolated past their last explicit value with price inflation (plus
//! a CPI offset) or wage growth.
//!
//! The library provides:
//! - A value store with label-predicate selection and Initial Defaults
//! - A rate provider with an explicit, invalidated cache
//! - An extension engine that fills every horizon year
//! - An `adjust` operation for partial updates that keeps all derived values
//!   consistent, with all-or-nothing error semantics
//! - Conversion of Tax-Calculator style policy files and `ndarray` views
//!
//! ## Basic Usage
//!
//! ```
//! use serde_json::json;
//! use taxparams_rs::{Labels, TaxParams};
//!
//! let mut params = TaxParams::bundled().unwrap();
//! params
//!     .adjust(&json!({"CPI_offset": [{"year": 2020, "value": -0.001}]}))
//!     .unwrap();
//!
//! let exemption = params.value_at("II_em", 2025, &Labels::new()).unwrap();
//! assert!(exemption.as_f64().unwrap() > 4050.0);
//! ```

pub mod adjust;
pub mod arrays;
pub mod config;
pub mod error;
pub mod extend;
pub mod parameter;
pub mod params;
pub mod rates;
pub mod schema;
pub mod store;
pub mod value;

// Re-exports for convenience
pub use adjust::Report;
pub use config::StoreConfig;
pub use error::{Result, TaxParamsError};
pub use extend::Phase;
pub use parameter::{IndexedStatus, Parameter};
pub use params::TaxParams;
pub use rates::{RateForecast, StaticForecast};
pub use schema::Definitions;
pub use store::Selector;
pub use value::{Labels, Value, ValueObject, ValueType};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
