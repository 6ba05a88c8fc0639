//! Error types for document and configuration persistence.

use thiserror::Error;

/// Errors that can occur while reading or writing documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The document is not well-formed XML.
    #[error("XML error: {0}")]
    XmlParseError(#[from] roxmltree::Error),

    /// Serializing the document failed.
    #[error("XML write error: {0}")]
    XmlWriteError(String),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The root element is not `DsLight`.
    #[error("unexpected root element: {0}")]
    UnexpectedRoot(String),

    /// A required attribute is absent.
    #[error("<{element}> is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// An attribute value cannot be interpreted.
    #[error("<{element}> has an invalid '{attribute}' value: {value}")]
    InvalidValue {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
}

/// Convenience alias for results with [`DocumentError`].
pub type Result<T> = std::result::Result<T, DocumentError>;
