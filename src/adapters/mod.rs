//! Adapters - Concrete implementations of ports.

pub mod ai;
pub mod local;
