use thiserror::Error;

/// A form that cannot be submitted yet. The display text is what the page
/// shows; nothing has touched the network.
#[derive(Error, Debug)]
pub enum FormError {
    /// Required field left blank; carries the page's fixed message.
    #[error("{0}")]
    Missing(&'static str),

    #[error("Invalid input data: {field} must be a number")]
    NotNumber { field: &'static str },

    #[error("Invalid input data: {field} must be a whole number")]
    NotInteger { field: &'static str },

    #[error("Unknown crop: {0}")]
    UnknownCrop(String),

    #[error("unknown field: {0}")]
    UnknownField(String),
}

pub type Result<T> = std::result::Result<T, FormError>;
