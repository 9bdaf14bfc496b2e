//! Touchline: a football search gateway.
//!
//! One HTTP endpoint takes a free-text football question and answers with a
//! `{summary, sources, query}` envelope, built from web search results, an
//! LLM, or a retrieval-augmented chatflow depending on configuration.
//!
//! # Architecture
//!
//! - **Providers**: web search lives in the `touchline-search` crate;
//!   generation (Gemini, OpenAI, Cohere) and retrieval (Flowise) clients live
//!   in [`providers`]
//! - **Gateway**: [`gateway::Gateway`] validates, runs the configured
//!   [`mode::ResolutionMode`] and applies the listing fallback
//! - **History**: [`history::HistoryRecorder`] queues completed exchanges for
//!   a background writer
//! - **Identity**: [`identity::IdentityResolver`] maps bearer tokens to users
//! - **HTTP**: [`server`] exposes the gateway with CORS and a health probe

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod identity;
pub mod mode;
pub mod prompt;
pub mod providers;
pub mod server;
pub mod types;

pub use app::{Running, launch};
pub use client::{GatewayClient, RecentQueries};
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, Pipeline};
pub use mode::ResolutionMode;
pub use server::GatewayServer;
pub use touchline_search::SourceCitation;
pub use types::{ClientMetadata, Requester, SearchRequest, SearchResponse};
