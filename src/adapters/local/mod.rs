//! Local adapters for monolith deployment.

pub mod fs;
pub mod http;
pub mod memory;
pub mod probe;

#[cfg(feature = "redis")]
pub mod redis;

pub use fs::FsAdapter;
pub use memory::MemoryStore;
pub use probe::FfprobeProbe;

#[cfg(feature = "redis")]
pub use redis::RedisPool;
