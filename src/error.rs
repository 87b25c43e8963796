//! Error types and handling for `AstroView`

use thiserror::Error;

/// Main error type for the `AstroView` library
#[derive(Error, Debug)]
pub enum AstroViewError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The ephemeris service answered with an error
    #[error("API error: {message}")]
    Api { message: String },

    /// Transport failures talking to the ephemeris service
    #[error("Network error: {message}")]
    Network { message: String },

    /// Unexpected response layout
    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Target not found: {target}")]
    TargetNotFound { target: String },

    #[error("Ambiguous target '{target}' ({} candidates)", candidates.len())]
    AmbiguousTarget {
        target: String,
        candidates: Vec<String>,
    },

    #[error("Observing site not found: {query}")]
    SiteNotFound { query: String },

    /// The service returned an empty table
    #[error("No ephemeris data: {message}")]
    NoData { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Figure rendering errors
    #[error("Render error: {message}")]
    Render { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AstroViewError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn no_data<S: Into<String>>(message: S) -> Self {
        Self::NoData {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AstroViewError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file.")
            }
            AstroViewError::Api { message } => {
                format!("JPL Horizons rejected the request: {message}")
            }
            AstroViewError::Network { .. } => {
                "Unable to reach JPL Horizons. Please check your internet connection.".to_string()
            }
            AstroViewError::Parse { .. } => {
                "JPL Horizons returned a response that could not be understood.".to_string()
            }
            AstroViewError::TargetNotFound { target } => {
                format!("No object matches '{target}'. Check the name or try another --id-type.")
            }
            AstroViewError::AmbiguousTarget { target, candidates } => {
                let mut message =
                    format!("'{target}' matches several objects; use a more specific id:");
                for candidate in candidates.iter().take(10) {
                    message.push_str("\n  ");
                    message.push_str(candidate);
                }
                message
            }
            AstroViewError::SiteNotFound { query } => {
                format!(
                    "Unknown observing site '{query}'. Use an MPC code, an observatory name or 'lat,lon[,elev_m]'."
                )
            }
            AstroViewError::NoData { message } => format!("No ephemeris data: {message}"),
            AstroViewError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            AstroViewError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            AstroViewError::Render { message } => format!("Could not render figure: {message}"),
            AstroViewError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
