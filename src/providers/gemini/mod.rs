//! Gemini provider: generateContent adapter, wire decoder and catalog.

pub mod client;
pub mod models;
pub mod streaming;

pub use client::GeminiAdapter;
