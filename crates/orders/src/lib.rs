//! `atelier-orders` — customer order lifecycle.
//!
//! Pure state machine: validates transitions and says which movements each
//! one requires. Applying those movements (and the rollback when one of them
//! fails) is the engine's job, not this crate's.

pub mod order;

pub use order::{Order, OrderItem, OrderStatus, PaymentStatus};
