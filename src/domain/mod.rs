//! Domain layer types and invariants.

pub mod entities;
pub mod filter;
pub mod posts;
pub mod slug;
pub mod uploads;
