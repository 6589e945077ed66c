//! Search engine implementations.

pub mod duckduckgo;
