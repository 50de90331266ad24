//! Order domain module
//!
//! Contains order models, the status state machine and the order store.

mod model;
mod service;

pub use model::*;
pub use service::{OrderError, OrderStore};
