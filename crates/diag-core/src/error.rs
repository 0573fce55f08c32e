use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagError {
    #[error("Malformed analytics document: {0}")]
    MalformedDocument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot connect to server at {url}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiagError {
    /// Shorthand for a validation failure at `path`.
    pub fn malformed(path: impl AsRef<str>, reason: impl AsRef<str>) -> Self {
        Self::MalformedDocument(format!("{}: {}", path.as_ref(), reason.as_ref()))
    }
}

pub type Result<T> = std::result::Result<T, DiagError>;
