//! Observing-site model for geographic coordinates and MPC codes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AstroViewError, Result};

/// MPC code of the geocenter
pub const GEOCENTER_CODE: &str = "500";

/// Geographic location of an observer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeoLocation {
    /// Geodetic latitude in decimal degrees (north positive)
    pub latitude: f64,
    /// Longitude in decimal degrees (east positive)
    pub longitude: f64,
    /// Elevation above the reference ellipsoid in metres
    pub elevation_m: f64,
    /// Human readable name
    pub name: String,
}

impl GeoLocation {
    /// Create a new location, checking the coordinate ranges
    pub fn new(latitude: f64, longitude: f64, elevation_m: f64, name: String) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AstroViewError::validation(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !(-180.0..360.0).contains(&longitude) {
            return Err(AstroViewError::validation(format!(
                "longitude {longitude} is outside [-180, 360)"
            )));
        }
        if !elevation_m.is_finite() {
            return Err(AstroViewError::validation("elevation must be finite"));
        }
        Ok(Self {
            latitude,
            longitude,
            elevation_m,
            name,
        })
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!(
            "{:.4}, {:.4}, {:.0} m",
            self.latitude, self.longitude, self.elevation_m
        )
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Horizons `SITE_COORD` value: east longitude, latitude, elevation in km
    #[must_use]
    pub fn site_coord(&self) -> String {
        format!(
            "{:.6},{:.6},{:.4}",
            self.longitude,
            self.latitude,
            self.elevation_m / 1000.0
        )
    }
}

/// Where ephemerides are computed from
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum ObservingSite {
    /// A Minor Planet Center observatory code, with coordinates when known
    Mpc {
        code: String,
        location: Option<GeoLocation>,
    },
    /// Arbitrary geodetic coordinates on Earth
    Geodetic(GeoLocation),
}

impl ObservingSite {
    #[must_use]
    pub fn geocenter() -> Self {
        Self::Mpc {
            code: GEOCENTER_CODE.to_string(),
            location: None,
        }
    }

    #[must_use]
    pub fn is_geocentric(&self) -> bool {
        matches!(self, Self::Mpc { code, .. } if code == GEOCENTER_CODE)
    }

    /// Coordinates of the site, if any are known
    #[must_use]
    pub fn location(&self) -> Option<&GeoLocation> {
        match self {
            Self::Mpc { location, .. } => location.as_ref(),
            Self::Geodetic(location) => Some(location),
        }
    }

    /// Short label used in figure titles
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Mpc { code, .. } => code.clone(),
            Self::Geodetic(location) if !location.name.is_empty() => location.name.clone(),
            Self::Geodetic(location) => {
                format!("{:.4}, {:.4}", location.latitude, location.longitude)
            }
        }
    }

    /// Horizons parameters selecting this site as the observer
    #[must_use]
    pub fn horizons_params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Mpc { code, .. } => vec![("CENTER", code.clone())],
            Self::Geodetic(location) => vec![
                ("CENTER", "coord@399".to_string()),
                ("COORD_TYPE", "GEODETIC".to_string()),
                ("SITE_COORD", location.site_coord()),
            ],
        }
    }

    /// Stable key fragment for caching
    #[must_use]
    pub fn cache_key(&self) -> String {
        match self {
            Self::Mpc { code, .. } => format!("mpc:{code}"),
            Self::Geodetic(location) => {
                let (lat, lon) = location.rounded_coordinates(5);
                format!("geo:{lat:.5}:{lon:.5}:{:.0}", location.elevation_m)
            }
        }
    }
}

impl fmt::Display for ObservingSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mpc {
                code,
                location: Some(location),
            } => write!(f, "{} [{code}]", location.name),
            Self::Mpc {
                code,
                location: None,
            } => write!(f, "[{code}]"),
            Self::Geodetic(location) => write!(f, "{}", location.format_coordinates()),
        }
    }
}
