//! Lectern - Lecture video to quiz pipeline
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (jobs, segmenter, quiz, export, users)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations (filesystem, memory, Redis, HTTP, AI client)
//! - application/: Services that drive the ports
//! - config: Environment configuration
//!
//! # Features
//! - `redis`: Redis-backed job and user store (default)

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

pub use config::AppConfig;
