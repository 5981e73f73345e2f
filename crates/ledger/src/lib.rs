//! `atelier-ledger` — movement kinds, their balance effects, and replay.
//!
//! The effect table in [`movement::MovementKind`] is the entire business
//! logic of the stock ledger: every balance change in the system is one of
//! these nine kinds applied with a positive magnitude. Everything else
//! (orders, production, returns, cut reconciliation) reduces to sequences of
//! these movements.

pub mod balance;
pub mod movement;
pub mod replay;

pub use balance::Balances;
pub use movement::{Compensation, Movement, MovementDraft, MovementKind};
pub use replay::{replay, replay_for};
