//! Search provider implementations.
//!
//! Each module provides a struct implementing [`crate::engine::SearchBackend`]
//! for one provider's JSON API.

pub mod serpapi;
pub mod serper;

pub use serpapi::SerpApiBackend;
pub use serper::SerperBackend;
