//! Flow-driven dialogue: the static flow table and the finite-state engine
//! that walks it.

pub mod engine;
pub mod table;
