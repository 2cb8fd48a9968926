use thiserror::Error;

/// Fixed message for failures where the service never produced an answer.
pub const TRANSPORT_MESSAGE: &str = "Network error or server unavailable";

#[derive(Error, Debug)]
pub enum AdapterError {
    /// Non-success status. `message` is the service's `error` field verbatim,
    /// or `HTTP {status}` when the body carried none.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Connection refused, DNS failure, malformed URL, reset mid-body.
    /// The detail is kept for logs only.
    #[error("{}", TRANSPORT_MESSAGE)]
    Transport(String),

    /// Success status but the body was not a JSON object.
    #[error("invalid response from {route}: {detail}")]
    Decode { route: String, detail: String },

    /// The request record could not be flattened into form fields.
    #[error("encode: {0}")]
    Encode(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
}

impl AdapterError {
    /// Message the service itself reported, if this is a server failure.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            AdapterError::Server { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AdapterError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_display_hides_detail() {
        let err = AdapterError::Transport("tcp connect error: Connection refused (os error 111)".into());
        assert_eq!(err.to_string(), TRANSPORT_MESSAGE);
        assert!(err.server_message().is_none());
    }

    #[test]
    fn server_display_is_verbatim() {
        let err = AdapterError::Server { status: 400, message: "Crop 'kale' not found in database".into() };
        assert_eq!(err.to_string(), "Crop 'kale' not found in database");
        assert_eq!(err.status(), Some(400));
    }
}
