use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug)]
pub enum Error {
    /// A source file is not valid Rust
    ParseError { file: PathBuf, message: String },
    ConfigError(String),
    /// A class could not be turned into a controller descriptor
    ExtractionError { class: String, message: String },
    /// The specification was requested before any scan completed
    SpecNotGenerated,
    SerializationError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::ParseError { file, message } => {
                write!(f, "parse error in {}: {}", file.display(), message)
            }
            Error::ConfigError(msg) => write!(f, "invalid configuration: {}", msg),
            Error::ExtractionError { class, message } => {
                write!(f, "cannot extract controller {}: {}", class, message)
            }
            Error::SpecNotGenerated => write!(f, "specification has not been generated yet"),
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML: {}", err))
    }
}
