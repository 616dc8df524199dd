//! Adapters for external systems.

mod reqwest_client;

pub use reqwest_client::ReqwestTransport;
