//! OpenAI provider: Chat Completions adapter, wire decoder and catalog.

pub mod client;
pub mod models;
pub mod streaming;

pub use client::OpenAiAdapter;
