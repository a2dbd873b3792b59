use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success response. `message` is the most readable text found in the body.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl ProviderError {
    /// Message suitable for showing to the person who triggered the request.
    pub fn user_message(&self) -> String {
        match self {
            ProviderError::Api { message, .. } => message.clone(),
            ProviderError::Request(error) if error.is_timeout() => {
                String::from("The location service did not answer in time")
            }
            ProviderError::Request(error) if error.is_connect() => {
                String::from("The location service is unreachable")
            }
            other => other.to_string(),
        }
    }
}
