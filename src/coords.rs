//! Coordinate conversions
//!
//! Horizons already reports apparent azimuth and elevation for topocentric
//! sites. These helpers cover the cases where only equatorial coordinates are
//! available, plus the small amount of vector geometry the renderers need.

use chrono::{DateTime, Utc};

use crate::models::{EquatorialCoords, GeoLocation, HorizontalCoords};
use crate::time::{J2000_JD, centuries_since_j2000, julian_date};

/// Mean obliquity of the ecliptic at J2000.0, degrees
pub const J2000_OBLIQUITY_DEG: f64 = 23.439_291_1;

/// Wrap an angle into [0, 360)
#[must_use]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Greenwich mean sidereal time in degrees (IAU 1982 expression)
#[must_use]
pub fn gmst_deg(jd_ut: f64) -> f64 {
    let t = centuries_since_j2000(jd_ut);
    let theta = 280.460_618_37 + 360.985_647_366_29 * (jd_ut - J2000_JD) + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    normalize_degrees(theta)
}

/// Local mean sidereal time for an east-positive longitude
#[must_use]
pub fn local_sidereal_deg(jd_ut: f64, east_longitude_deg: f64) -> f64 {
    normalize_degrees(gmst_deg(jd_ut) + east_longitude_deg)
}

/// Convert RA/Dec to altitude/azimuth for an observer at `time`.
///
/// Azimuth is measured from North through East. No refraction or
/// aberration is applied.
#[must_use]
pub fn equatorial_to_horizontal(
    equatorial: EquatorialCoords,
    location: &GeoLocation,
    time: DateTime<Utc>,
) -> HorizontalCoords {
    let lst = local_sidereal_deg(julian_date(time), location.longitude);
    let hour_angle = (lst - equatorial.ra_deg).to_radians();
    let dec = equatorial.dec_deg.to_radians();
    let lat = location.latitude.to_radians();

    let sin_alt = dec.sin() * lat.sin() + dec.cos() * lat.cos() * hour_angle.cos();
    let altitude = sin_alt.clamp(-1.0, 1.0).asin();

    // Azimuth from South, westward; rotate to North-through-East afterwards
    let az_south = hour_angle
        .sin()
        .atan2(hour_angle.cos() * lat.sin() - dec.tan() * lat.cos());

    HorizontalCoords {
        altitude_deg: altitude.to_degrees(),
        azimuth_deg: normalize_degrees(az_south.to_degrees() + 180.0),
    }
}

/// Spherical form of a Cartesian vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub distance: f64,
    /// Longitude (or right ascension) in [0, 360)
    pub longitude_deg: f64,
    /// Latitude (or declination) in [-90, 90]
    pub latitude_deg: f64,
}

#[must_use]
pub fn cartesian_to_spherical([x, y, z]: [f64; 3]) -> Spherical {
    let distance = (x * x + y * y + z * z).sqrt();
    if distance == 0.0 {
        return Spherical {
            distance,
            longitude_deg: 0.0,
            latitude_deg: 0.0,
        };
    }
    Spherical {
        distance,
        longitude_deg: normalize_degrees(y.atan2(x).to_degrees()),
        latitude_deg: (z / distance).clamp(-1.0, 1.0).asin().to_degrees(),
    }
}

#[must_use]
pub fn spherical_to_cartesian(spherical: Spherical) -> [f64; 3] {
    let lon = spherical.longitude_deg.to_radians();
    let lat = spherical.latitude_deg.to_radians();
    [
        spherical.distance * lat.cos() * lon.cos(),
        spherical.distance * lat.cos() * lon.sin(),
        spherical.distance * lat.sin(),
    ]
}

/// Rotate an ecliptic J2000 vector into the equatorial frame
#[must_use]
pub fn ecliptic_to_equatorial([x, y, z]: [f64; 3]) -> [f64; 3] {
    let (sin_e, cos_e) = J2000_OBLIQUITY_DEG.to_radians().sin_cos();
    [x, y * cos_e - z * sin_e, y * sin_e + z * cos_e]
}

/// RA/Dec of an ecliptic Cartesian position vector
#[must_use]
pub fn ecliptic_vector_to_equatorial(position: [f64; 3]) -> EquatorialCoords {
    let spherical = cartesian_to_spherical(ecliptic_to_equatorial(position));
    EquatorialCoords {
        ra_deg: spherical.longitude_deg,
        dec_deg: spherical.latitude_deg,
    }
}
