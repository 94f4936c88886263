//! Client error types

use core_kernel::PortError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} did not answer within {timeout_ms}ms")]
    Timeout { service: &'static str, timeout_ms: u64 },

    #[error("{service} returned status {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl From<ClientError> for PortError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Timeout { service, timeout_ms } => PortError::Timeout {
                operation: service.to_string(),
                duration_ms: timeout_ms,
            },
            ClientError::Http(e) if e.is_connect() => PortError::Connection {
                message: e.to_string(),
                source: Some(Box::new(e)),
            },
            ClientError::Http(e) => PortError::Internal {
                message: e.to_string(),
                source: Some(Box::new(e)),
            },
            ClientError::Api { status: 401 | 403, body, .. } => PortError::Unauthorized { message: body },
            ClientError::Api { service, status: 404, .. } => PortError::not_found(service, "endpoint"),
            ClientError::Api { service, status, .. } if status >= 500 => PortError::ServiceUnavailable {
                service: service.to_string(),
            },
            ClientError::Api { service, status, body } => {
                PortError::internal(format!("{service} returned status {status}: {body}"))
            }
            ClientError::InvalidResponse { message, .. } => PortError::Transformation { message },
            ClientError::Config(message) => PortError::internal(message),
        }
    }
}
