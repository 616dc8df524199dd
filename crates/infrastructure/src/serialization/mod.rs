//! JSON decoding for the configuration file.

mod json;

pub use json::*;
