//! `AstroView` - Solar-system positions and sky charts from JPL Horizons
//!
//! This library fetches ephemerides from the JPL Horizons service and turns
//! them into heliocentric orbit scenes and observatory sky views.

pub mod cache;
pub mod config;
pub mod coords;
pub mod error;
pub mod horizons;
pub mod logging;
pub mod models;
pub mod observatory;
pub mod render;
pub mod time;
pub mod visualizer;

// Re-export core types for public API
pub use cache::PersistentCache;
pub use config::AstroViewConfig;
pub use error::AstroViewError;
pub use horizons::{CachedSource, EphemerisSource, HorizonsClient};
pub use models::{GeoLocation, IdType, ObservingSite, OrbitScene, SkyView, StateVector, Target};
pub use render::{OutputFormat, Renderer};
pub use visualizer::AsteroidVisualizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AstroViewError>;
