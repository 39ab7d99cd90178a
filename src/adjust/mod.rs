//! # Adjustment Coordinator
//!
//! Partial updates of a [`TaxParams`](crate::TaxParams) store. See
//! [`TaxParams::adjust`](crate::TaxParams::adjust) for the payload format and
//! `coordinator` for the order in which changes are applied.

mod coordinator;
mod payload;

use crate::value::ValueObject;
use std::collections::BTreeMap;

/// Explicit values applied by an adjustment, keyed by payload name.
///
/// Indexed-status changes appear under their suffixed key as boolean value
/// objects, one per change year.
pub type Report = BTreeMap<String, Vec<ValueObject>>;
