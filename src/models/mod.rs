//! Data models for AstroView
//!
//! This module contains the core domain models organized by concern:
//! - Location: observing sites and geographic coordinates
//! - Target: how an object identifier is handed to Horizons
//! - Ephemeris: state vectors and observer-table rows
//! - Figure: orbit scenes and sky views ready for rendering

pub mod ephemeris;
pub mod figure;
pub mod location;
pub mod target;

// Re-export all public types for convenient access
pub use ephemeris::{EquatorialCoords, HorizontalCoords, ObserverRow, StateVector, split_xyz};
pub use figure::{OrbitScene, SkyMarker, SkyView, SunEvents, Trace3d, TraceMode};
pub use location::{GeoLocation, ObservingSite};
pub use target::{IdType, Target};
