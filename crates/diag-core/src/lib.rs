pub mod config;
pub mod error;

pub use config::{CameraConfig, DiagConfig, ServerConfig};
pub use error::{DiagError, Result};
