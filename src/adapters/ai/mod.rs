//! Outbound adapter for the AI collaborator (speech-to-text and question synthesis).

pub mod http;

pub use http::HttpAiClient;
