use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LineCutError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Layout document does not exist: {}", .0.display())]
    MissingDocument(PathBuf),

    #[error("Text missing for line '{line_id}' on page '{page_id}'")]
    TextMissing { page_id: String, line_id: String },

    #[error("XML error: {0}")]
    XmlError(String),

    #[error("Layout error: {0}")]
    LayoutError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Write-back error: {0}")]
    WriteBackError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`LineCutError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl LineCutError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create an XML parse or serialization error.
    xml => XmlError,
    /// Create a layout structure error.
    layout => LayoutError,
    /// Create a write-back error.
    write_back => WriteBackError,
}

impl From<quick_xml::Error> for LineCutError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlError(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for LineCutError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlError(e.to_string())
    }
}

impl From<serde_yml::Error> for LineCutError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for LineCutError {
    fn from(e: serde_json::Error) -> Self {
        Self::IoError(std::io::Error::other(e))
    }
}

impl From<image::ImageError> for LineCutError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LineCutError>;
