//! Product domain module
//!
//! Catalog records, browse queries and stock reservation.

mod model;
mod service;

pub use model::*;
pub use service::{ProductError, ProductStore};
