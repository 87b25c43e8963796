//! Renderer-independent figure descriptions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EquatorialCoords;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
    Lines,
    Markers,
}

/// One named series of a 3D scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace3d {
    pub name: String,
    pub mode: TraceMode,
    /// Points in AU
    pub points: Vec<[f64; 3]>,
    pub color: String,
    pub marker_size: f64,
}

impl Trace3d {
    #[must_use]
    pub fn line(name: impl Into<String>, points: Vec<[f64; 3]>, color: &str) -> Self {
        Self {
            name: name.into(),
            mode: TraceMode::Lines,
            points,
            color: color.to_string(),
            marker_size: 0.0,
        }
    }

    #[must_use]
    pub fn marker(name: impl Into<String>, point: [f64; 3], color: &str, size: f64) -> Self {
        Self {
            name: name.into(),
            mode: TraceMode::Markers,
            points: vec![point],
            color: color.to_string(),
            marker_size: size,
        }
    }
}

/// Heliocentric orbit figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitScene {
    pub title: String,
    pub axis_titles: [String; 3],
    pub traces: Vec<Trace3d>,
}

impl OrbitScene {
    /// Largest absolute coordinate over all traces, for equal axis scaling
    #[must_use]
    pub fn extent(&self) -> f64 {
        self.traces
            .iter()
            .flat_map(|t| t.points.iter())
            .flat_map(|p| p.iter())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}

/// One object placed on a polar sky panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyMarker {
    pub label: String,
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
    /// Polar angle: azimuth in radians, measured clockwise from North
    pub theta_rad: f64,
    /// Polar radius: 90 - |altitude|, so the zenith (or nadir) is the centre
    pub radius_deg: f64,
    pub color: String,
    pub equatorial: Option<EquatorialCoords>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunEvents {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// Two-panel sky chart for one site and instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyView {
    pub title: String,
    pub site: String,
    pub time: DateTime<Utc>,
    pub above: Vec<SkyMarker>,
    pub below: Vec<SkyMarker>,
    pub sun_events: Option<SunEvents>,
}
