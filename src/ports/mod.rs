//! Ports - Trait definitions implemented by adapters.

pub mod ai;
pub mod media;
pub mod repository;
pub mod storage;
