//! Internal utilities shared by the provider adapters.

pub(crate) mod lines;
pub(crate) mod streaming;
