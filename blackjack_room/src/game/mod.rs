//! Blackjack rules and round progression.
//!
//! Everything in here is synchronous and operates on state that is handed
//! in. Ownership of that state lives in [`crate::room`].

pub mod entities;
pub mod errors;
pub mod round;
pub mod rules;
pub mod shoe;
