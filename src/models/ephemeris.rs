//! Ephemeris rows as returned by the ephemeris service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cartesian state of a body at one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    /// Julian date (TDB) of the sample
    pub epoch_jd: f64,
    /// Calendar date as printed by Horizons
    pub calendar: Option<String>,
    /// Position in AU
    pub position: [f64; 3],
    /// Velocity in AU/day
    pub velocity: Option<[f64; 3]>,
}

impl StateVector {
    #[must_use]
    pub fn new(epoch_jd: f64, position: [f64; 3]) -> Self {
        Self {
            epoch_jd,
            calendar: None,
            position,
            velocity: None,
        }
    }

    /// Distance from the reference center in AU
    #[must_use]
    pub fn distance(&self) -> f64 {
        let [x, y, z] = self.position;
        (x * x + y * y + z * z).sqrt()
    }
}

/// Split a series of vectors into separate x, y and z columns
#[must_use]
pub fn split_xyz(vectors: &[StateVector]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(vectors.len());
    let mut ys = Vec::with_capacity(vectors.len());
    let mut zs = Vec::with_capacity(vectors.len());
    for vector in vectors {
        let [x, y, z] = vector.position;
        xs.push(x);
        ys.push(y);
        zs.push(z);
    }
    (xs, ys, zs)
}

/// Right ascension / declination in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquatorialCoords {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

/// Altitude above the horizon and azimuth (North through East), in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizontalCoords {
    pub altitude_deg: f64,
    pub azimuth_deg: f64,
}

impl HorizontalCoords {
    #[must_use]
    pub fn is_above_horizon(&self) -> bool {
        self.altitude_deg >= 0.0
    }
}

/// One line of an observer table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverRow {
    pub time: DateTime<Utc>,
    pub equatorial: Option<EquatorialCoords>,
    pub horizontal: Option<HorizontalCoords>,
}
