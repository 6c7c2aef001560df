//! Redis adapter for local deployment.
//!
//! This module provides Redis-backed implementations of:
//! - `VideoRepository`, one hash per video plus sorted-set listing indexes
//! - `UserRepository`, JSON user records with an email index and video lists

mod error;
mod pool;
mod repository;

pub use pool::RedisPool;

/// Redis key constants
const VIDEO_PREFIX: &str = "lectern:video:";
const OWNER_INDEX_PREFIX: &str = "lectern:videos:owner:";
const ANONYMOUS_INDEX: &str = "lectern:videos:anonymous";
const USER_PREFIX: &str = "lectern:user:";
const USER_VIDEOS_PREFIX: &str = "lectern:user_videos:";
const EMAIL_INDEX_PREFIX: &str = "lectern:user_email:";
