//! `atelier-production` — internal production order lifecycle.
//!
//! Linear stage ladder with a single stock-increasing movement on completion
//! and a single compensating decrease on reopen. Pure: the engine applies
//! the movements this crate describes.

pub mod production_order;

pub use production_order::{ProductionOrder, ProductionStatus};
