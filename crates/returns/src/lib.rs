//! `atelier-returns` — goods returned against a dispatched order.
//!
//! Returns only put stock back; they never touch reservations.

pub mod sales_return;

pub use sales_return::{ReturnItem, SalesReturn};
