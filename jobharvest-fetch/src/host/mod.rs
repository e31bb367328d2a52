//! Page driver implementations.
//!
//! - [`http`] - Fetches documents over HTTP with reqwest
//! - [`memory`] - Serves scripted documents from memory

pub mod http;
pub mod memory;

pub use http::HttpPageDriver;
pub use memory::StaticPageDriver;
