//! JSON decoding helpers.

use serde::de::DeserializeOwned;

/// Error type for serialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON deserialization failed.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Deserializes JSON from bytes.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Deserialize)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use storekeeper_domain::ClientConfig;

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: ClientConfig = from_json_bytes(br#"{"base_url":"https://a.example"}"#)
            .expect("deserialization should work");

        assert_eq!(parsed.base_url, "https://a.example");
        assert_eq!(parsed.connect_timeout_ms, ClientConfig::default().connect_timeout_ms);
    }

    #[test]
    fn test_invalid_json_is_a_deserialize_error() {
        let result: Result<ClientConfig, _> = from_json_bytes(b"{ not json");
        assert!(matches!(result, Err(SerializationError::Deserialize(_))));
    }
}
