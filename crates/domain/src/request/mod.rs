//! Outbound HTTP request types

mod header;
mod method;
mod pending;

pub use header::Header;
pub use method::HttpMethod;
pub use pending::PendingRequest;
