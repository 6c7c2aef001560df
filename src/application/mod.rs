//! Application layer - Services that use ports.

pub mod auth;
pub mod launcher;
pub mod orchestrator;
pub mod uploads;
